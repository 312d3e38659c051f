//! References to a (possibly nested) field of a declaration.
//!
//! A field reference is a dot-separated path of field names, optionally
//! qualified: a leading `context` token means "resolve against the enclosing
//! envelope type", and a leading type name (simple or fully qualified) pins
//! the path to a specific declaration. Paths resolve strictly left to right;
//! a missing segment is a normal not-found outcome, not an error.

use std::sync::OnceLock;

use regex::Regex;

use crate::descriptor::{Declaration, FieldDescriptor, SchemaGraph, ValueKind};
use crate::error::SpliceError;
use crate::type_ref::{TypeRef, WILDCARD};

const CONTEXT_KEYWORD: &str = "context";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ordered, non-empty sequence of field-name segments.
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment: the name of the referenced field itself.
    pub fn field_name(&self) -> &str {
        self.segments.last().expect("path is non-empty")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A parsed field reference: qualifier plus field path.
pub struct FieldRef {
    qualifier: TypeRef,
    path: FieldPath,
    raw: String,
}

impl FieldRef {
    /// Parses raw field reference text.
    ///
    /// Fails for blank input, a wildcard token anywhere, an empty path
    /// segment, or a `context` qualifier with no path after it.
    pub fn parse(raw: &str) -> Result<FieldRef, SpliceError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(SpliceError::MalformedReference(
                "field reference must not be blank".to_string(),
            ));
        }
        if value.contains(WILDCARD) {
            return Err(SpliceError::MalformedReference(format!(
                "field reference '{value}' must not contain a wildcard"
            )));
        }

        let tokens: Vec<&str> = value.split('.').collect();
        let (qualifier, path_tokens) = match tokens.split_first() {
            Some((&first, rest)) if first == CONTEXT_KEYWORD => (TypeRef::Context, rest),
            _ => (TypeRef::Any, tokens.as_slice()),
        };

        if path_tokens.is_empty() {
            return Err(SpliceError::MalformedReference(format!(
                "field reference '{value}' names no field"
            )));
        }

        let mut segments = Vec::with_capacity(path_tokens.len());
        for token in path_tokens {
            if token.trim().is_empty() {
                return Err(SpliceError::MalformedReference(format!(
                    "field reference '{value}' contains an empty segment"
                )));
            }
            if !segment_regex().is_match(token) {
                return Err(SpliceError::MalformedReference(format!(
                    "invalid segment '{token}' in field reference '{value}'"
                )));
            }
            segments.push((*token).to_string());
        }

        Ok(FieldRef {
            qualifier,
            path: FieldPath { segments },
            raw: value.to_string(),
        })
    }

    /// The qualifier: `Any` for plain references, `Context` for envelope
    /// references.
    pub fn qualifier(&self) -> &TypeRef {
        &self.qualifier
    }

    /// The field path.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Name of the referenced field (the path's last segment).
    pub fn field_name(&self) -> &str {
        self.path.field_name()
    }

    /// Raw reference text, as written.
    pub fn value(&self) -> &str {
        &self.raw
    }

    /// Whether the reference is unqualified ("the same message").
    pub fn is_inner(&self) -> bool {
        self.qualifier == TypeRef::Any
    }

    /// Whether the reference is qualified to the enclosing envelope.
    pub fn is_context(&self) -> bool {
        self.qualifier == TypeRef::Context
    }

    /// Resolves the path against `decl`, walking nested message-typed fields
    /// through `graph`. Returns `None` at the first unresolvable segment.
    ///
    /// A path longer than one segment may lead with a qualifier naming
    /// `decl` itself (simple or fully qualified); those segments pin the
    /// path, they are not navigated.
    pub fn find<'a>(
        &self,
        decl: &'a Declaration,
        graph: &'a SchemaGraph,
    ) -> Option<&'a FieldDescriptor> {
        let segments = self.path.segments();
        let skip = type_qualifier_len(segments, decl);
        let mut remaining = &segments[skip..];
        let mut current = decl;

        loop {
            let (segment, rest) = remaining.split_first()?;
            let field = current.field(segment)?;
            if rest.is_empty() {
                return Some(field);
            }
            if field.kind != ValueKind::Message {
                return None;
            }
            let type_name = field.type_name.as_deref()?;
            current = graph.find(type_name)?;
            remaining = rest;
        }
    }

    /// Whether the qualifier matches `decl` and the path resolves in it.
    pub fn matches_type(&self, decl: &Declaration, graph: &SchemaGraph) -> bool {
        self.qualifier.matches(decl) && self.find(decl, graph).is_some()
    }
}

/// Number of leading segments that qualify the target declaration rather
/// than naming fields. A segment naming an actual field always wins over
/// the qualifier reading.
fn type_qualifier_len(segments: &[String], decl: &Declaration) -> usize {
    if segments.len() < 2 || decl.field(&segments[0]).is_some() {
        return 0;
    }

    let full: Vec<&str> = decl.full_name.split('.').collect();
    if segments.len() > full.len()
        && segments[..full.len()]
            .iter()
            .map(String::as_str)
            .eq(full.iter().copied())
    {
        return full.len();
    }

    if segments[0] == decl.name {
        return 1;
    }

    0
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}
