//! Textual references matching one or more declarations.
//!
//! A reference is one of: an exact name (`acme.orders.Order` or `Order`), a
//! package wildcard (`acme.orders.*` or `*`), a comma-separated union of
//! such, or a builtin (`context`, or the implicit any-reference used when a
//! field reference carries no qualifier).

use crate::descriptor::{Declaration, PACKAGE_SEPARATOR};
use crate::error::SpliceError;

/// Wildcard token allowed only as `*` or a trailing `.*`.
pub const WILDCARD: char = '*';

const CONTEXT_KEYWORD: &str = "context";
const CONTEXT_SUFFIX: &str = "Context";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A parsed type reference; each variant is a pure predicate over declarations.
pub enum TypeRef {
    /// Exact fully-qualified name, or exact simple name when the value
    /// carries no package separator.
    Direct(String),
    /// Every declaration under a package. An empty package (parsed from a
    /// bare `*`) matches every declaration.
    InPackage(String),
    /// Union of two or more direct/package references; matches if any
    /// member matches.
    Composite(Vec<TypeRef>),
    /// Matches every declaration; the default no-op reference.
    Any,
    /// Matches the enclosing envelope type rather than a sibling payload
    /// type: a declaration whose simple name ends with `Context`.
    Context,
}

impl TypeRef {
    /// Parses raw reference text.
    ///
    /// Resolution order: builtin keyword, package wildcard, composite
    /// (presence of a comma), direct as the fallback. Malformed input fails
    /// with a message naming the offending fragment.
    pub fn parse(raw: &str) -> Result<TypeRef, SpliceError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(SpliceError::MalformedReference(
                "type reference must not be blank".to_string(),
            ));
        }
        if value == CONTEXT_KEYWORD {
            return Ok(TypeRef::Context);
        }
        if let Some(in_package) = parse_in_package(value)? {
            return Ok(in_package);
        }
        if value.contains(',') {
            return parse_composite(value);
        }
        parse_direct(value)
    }

    /// Whether this reference matches the given declaration.
    pub fn matches(&self, decl: &Declaration) -> bool {
        match self {
            TypeRef::Direct(name) => {
                if name.contains(PACKAGE_SEPARATOR) {
                    decl.full_name == *name
                } else {
                    decl.name == *name
                }
            }
            TypeRef::InPackage(package) => {
                package.is_empty()
                    || decl
                        .full_name
                        .starts_with(&format!("{package}{PACKAGE_SEPARATOR}"))
            }
            TypeRef::Composite(members) => members.iter().any(|m| m.matches(decl)),
            TypeRef::Any => true,
            TypeRef::Context => decl.name.ends_with(CONTEXT_SUFFIX),
        }
    }

    /// Textual form of the reference.
    pub fn value(&self) -> String {
        match self {
            TypeRef::Direct(name) => name.clone(),
            TypeRef::InPackage(package) if package.is_empty() => WILDCARD.to_string(),
            TypeRef::InPackage(package) => {
                format!("{package}{PACKAGE_SEPARATOR}{WILDCARD}")
            }
            TypeRef::Composite(members) => {
                let values: Vec<String> = members.iter().map(TypeRef::value).collect();
                values.join(",")
            }
            TypeRef::Any => WILDCARD.to_string(),
            TypeRef::Context => CONTEXT_KEYWORD.to_string(),
        }
    }

    /// Rewrites every unqualified direct member to live under `package`.
    ///
    /// Qualified, wildcard, and builtin members are untouched. Supports
    /// references written inside a file whose declarations inherit the file
    /// package.
    pub fn with_package(&self, package: &str) -> TypeRef {
        if package.is_empty() {
            return self.clone();
        }
        match self {
            TypeRef::Direct(name) if !name.contains(PACKAGE_SEPARATOR) => {
                TypeRef::Direct(format!("{package}{PACKAGE_SEPARATOR}{name}"))
            }
            TypeRef::Composite(members) => {
                TypeRef::Composite(members.iter().map(|m| m.with_package(package)).collect())
            }
            other => other.clone(),
        }
    }
}

fn parse_in_package(value: &str) -> Result<Option<TypeRef>, SpliceError> {
    if value == "*" {
        return Ok(Some(TypeRef::InPackage(String::new())));
    }
    let Some(package) = value.strip_suffix(".*") else {
        return Ok(None);
    };
    // A comma means the trailing wildcard belongs to a composite member.
    if package.contains(',') {
        return Ok(None);
    }
    if package.trim().is_empty() {
        return Err(SpliceError::MalformedReference(format!(
            "package wildcard '{value}' names no package"
        )));
    }
    if package.contains(WILDCARD) {
        return Err(SpliceError::MalformedReference(format!(
            "type reference '{value}' may use a wildcard only as a trailing `.*`"
        )));
    }
    validate_segments(package, value)?;
    Ok(Some(TypeRef::InPackage(package.to_string())))
}

fn parse_composite(value: &str) -> Result<TypeRef, SpliceError> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() < 2 {
        return Err(SpliceError::MalformedReference(format!(
            "composite reference '{value}' must list at least two references"
        )));
    }

    let mut members = Vec::with_capacity(parts.len());
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            return Err(SpliceError::MalformedReference(format!(
                "composite reference '{value}' contains an empty element"
            )));
        }
        if part == "*" {
            return Err(SpliceError::MalformedReference(format!(
                "composite reference '{value}' contains a bare wildcard element"
            )));
        }
        let member = match parse_in_package(part)? {
            Some(in_package) => in_package,
            None => parse_direct(part)?,
        };
        members.push(member);
    }

    Ok(TypeRef::Composite(members))
}

fn parse_direct(value: &str) -> Result<TypeRef, SpliceError> {
    if value.contains(WILDCARD) {
        return Err(SpliceError::MalformedReference(format!(
            "type reference '{value}' may use a wildcard only as a trailing `.*`"
        )));
    }
    validate_segments(value, value)?;
    Ok(TypeRef::Direct(value.to_string()))
}

fn validate_segments(name: &str, whole: &str) -> Result<(), SpliceError> {
    for segment in name.split(PACKAGE_SEPARATOR) {
        if segment.trim().is_empty() {
            return Err(SpliceError::MalformedReference(format!(
                "type reference '{whole}' contains a blank segment"
            )));
        }
    }
    Ok(())
}
