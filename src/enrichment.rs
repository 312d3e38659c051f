//! Enrichment matching: binding an enrichment declaration's fields to the
//! fields of the declaration(s) it augments.
//!
//! An enrichment names its sources with the `enrichment_for` option and each
//! of its fields names originating fields with the `by` option (an ordered,
//! comma-separated list of alternatives). Matching is all-or-nothing per
//! `(source, enrichment)` pair: either every field resolves, or the pair is
//! rejected with a structural error.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::{Declaration, FieldDescriptor, SchemaGraph};
use crate::error::SpliceError;
use crate::field_ref::FieldRef;
use crate::type_ref::TypeRef;

/// Marker option: a declaration carrying it is an enrichment.
pub const ENRICHMENT_OPTION: &str = "enrichment";
/// Option naming the source type reference(s) of an enrichment.
pub const ENRICHMENT_FOR_OPTION: &str = "enrichment_for";
/// Field option listing originating-field reference alternatives.
pub const BY_OPTION: &str = "by";

/// Whether the declaration is annotated as an enrichment.
///
/// Either the explicit marker or the source-type option qualifies; a marker
/// without sources is reported by [`EnrichmentType::new`].
pub fn is_enrichment(decl: &Declaration) -> bool {
    decl.option(ENRICHMENT_OPTION).is_some() || decl.option(ENRICHMENT_FOR_OPTION).is_some()
}

#[derive(Debug, Clone)]
/// A validated enrichment declaration: source references plus field
/// definitions, parsed once per declaration.
pub struct EnrichmentType {
    type_name: String,
    sources: TypeRef,
    fields: Vec<FieldDef>,
}

impl EnrichmentType {
    /// Validates `decl` as an enrichment.
    ///
    /// Fails when the `enrichment_for` option is absent or blank, when the
    /// declaration has no fields, or when any field definition is malformed.
    /// Unqualified direct source references inherit the declaring file's
    /// package.
    pub fn new(decl: &Declaration) -> Result<Self, SpliceError> {
        let raw = decl
            .option(ENRICHMENT_FOR_OPTION)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                SpliceError::MissingOption(format!(
                    "enrichment '{}' lacks the `{ENRICHMENT_FOR_OPTION}` option",
                    decl.full_name
                ))
            })?;
        let sources = TypeRef::parse(raw)?.with_package(&decl.package);

        if decl.fields.is_empty() {
            return Err(SpliceError::MissingOption(format!(
                "enrichment '{}' declares no fields",
                decl.full_name
            )));
        }
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            fields.push(FieldDef::new(decl, field)?);
        }

        Ok(Self {
            type_name: decl.full_name.clone(),
            sources,
            fields,
        })
    }

    /// Fully-qualified name of the enrichment declaration.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The parsed source type reference(s).
    pub fn sources(&self) -> &TypeRef {
        &self.sources
    }

    /// Field definitions in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Whether `decl` is one of the declarations this enrichment augments.
    pub fn is_source(&self, decl: &Declaration) -> bool {
        self.sources.matches(decl)
    }
}

#[derive(Debug, Clone)]
/// One enrichment field plus its ordered reference alternatives.
pub struct FieldDef {
    field_name: String,
    alternatives: Vec<FieldRef>,
}

impl FieldDef {
    /// Parses the field's `by` option into ordered alternatives.
    ///
    /// Fails when the option is absent or blank, when an alternative is
    /// malformed, or when more than one alternative is context-qualified.
    pub fn new(enrichment: &Declaration, field: &FieldDescriptor) -> Result<Self, SpliceError> {
        let raw = field
            .options
            .get(BY_OPTION)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                SpliceError::MissingOption(format!(
                    "enrichment field '{}.{}' lacks the `{BY_OPTION}` option",
                    enrichment.full_name, field.name
                ))
            })?;

        let mut alternatives = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(SpliceError::MalformedReference(format!(
                    "empty `{BY_OPTION}` alternative on field '{}.{}'",
                    enrichment.full_name, field.name
                )));
            }
            alternatives.push(FieldRef::parse(part)?);
        }

        let context_count = alternatives.iter().filter(|a| a.is_context()).count();
        if context_count > 1 {
            return Err(SpliceError::AmbiguousReference(format!(
                "field '{}.{}' declares {context_count} context-qualified alternatives; \
                 at most one is allowed",
                enrichment.full_name, field.name
            )));
        }

        Ok(Self {
            field_name: field.name.clone(),
            alternatives,
        })
    }

    /// Name of the enrichment field.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Reference alternatives in declaration order.
    pub fn alternatives(&self) -> &[FieldRef] {
        &self.alternatives
    }

    /// Searches the alternatives against one source declaration.
    ///
    /// Alternatives are tried in declaration order and the first that
    /// resolves a concrete field wins. Context-qualified alternatives never
    /// bind concretely; they are the fallback when nothing else resolves.
    pub fn resolve<'a>(
        &'a self,
        source: &'a Declaration,
        graph: &'a SchemaGraph,
    ) -> FieldResolution<'a> {
        for alternative in &self.alternatives {
            if alternative.is_context() {
                continue;
            }
            if let Some(field) = alternative.find(source, graph) {
                return FieldResolution::Resolved(field, alternative);
            }
        }
        match self.alternatives.iter().find(|a| a.is_context()) {
            Some(alternative) => FieldResolution::ViaContext(alternative),
            None => FieldResolution::Unresolved,
        }
    }
}

#[derive(Debug)]
/// Outcome of the ordered alternative search for one field.
pub enum FieldResolution<'a> {
    /// A concrete originating field, bound through the winning alternative.
    Resolved(&'a FieldDescriptor, &'a FieldRef),
    /// No concrete field, but a context-qualified alternative applies; the
    /// emitter resolves it against ambient envelope data.
    ViaContext(&'a FieldRef),
    /// Nothing applies; the pair is rejected.
    Unresolved,
}

#[derive(Debug, Clone, Serialize)]
/// Resolved origin of one enrichment field.
pub struct FieldSource {
    /// The originating field descriptor; absent for context-derived fields.
    pub field: Option<FieldDescriptor>,
    /// The alternative that produced the binding, as written.
    pub via: String,
}

#[derive(Debug, Clone, Serialize)]
/// Total field mapping for one `(source, enrichment)` pair.
pub struct FieldMatch {
    /// Fully-qualified enrichment name.
    pub enrichment: String,
    /// Fully-qualified source name.
    pub source: String,
    /// Enrichment field name to resolved origin.
    pub fields: BTreeMap<String, FieldSource>,
}

impl FieldMatch {
    /// Builds the total mapping for `enrichment` against one `source`.
    ///
    /// Fails with an unresolvable-reference error naming the field and every
    /// attempted alternative as soon as one field fails; no partial maps are
    /// produced.
    pub fn new(
        enrichment: &EnrichmentType,
        source: &Declaration,
        graph: &SchemaGraph,
    ) -> Result<Self, SpliceError> {
        let mut fields = BTreeMap::new();
        for def in enrichment.fields() {
            let source_binding = match def.resolve(source, graph) {
                FieldResolution::Resolved(field, alternative) => FieldSource {
                    field: Some(field.clone()),
                    via: alternative.value().to_string(),
                },
                FieldResolution::ViaContext(alternative) => FieldSource {
                    field: None,
                    via: alternative.value().to_string(),
                },
                FieldResolution::Unresolved => {
                    let attempted: Vec<&str> =
                        def.alternatives().iter().map(FieldRef::value).collect();
                    return Err(SpliceError::UnresolvableReference(format!(
                        "field '{}.{}' does not resolve in source '{}'; tried: {}",
                        enrichment.type_name(),
                        def.field_name(),
                        source.full_name,
                        attempted.join(", ")
                    )));
                }
            };
            fields.insert(def.field_name().to_string(), source_binding);
        }

        Ok(Self {
            enrichment: enrichment.type_name().to_string(),
            source: source.full_name.clone(),
            fields,
        })
    }
}

/// Matches one enrichment declaration against every candidate source in the
/// graph.
///
/// Declaration-level defects (missing options, malformed or ambiguous
/// references) surface as a single error. Per-pair failures reject only that
/// pair; matches against other sources are still produced.
pub fn match_enrichment(
    decl: &Declaration,
    graph: &SchemaGraph,
) -> (Vec<FieldMatch>, Vec<SpliceError>) {
    let enrichment = match EnrichmentType::new(decl) {
        Ok(enrichment) => enrichment,
        Err(e) => return (Vec::new(), vec![e]),
    };

    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for candidate in graph.declarations() {
        if candidate.full_name == decl.full_name || !enrichment.is_source(candidate) {
            continue;
        }
        match FieldMatch::new(&enrichment, candidate, graph) {
            Ok(found) => matches.push(found),
            Err(e) => errors.push(e),
        }
    }
    (matches, errors)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::descriptor::{
        DescriptorSet, FieldDescriptor, FileDescriptor, MessageDescriptor, ValueKind,
    };

    fn field_with_by(name: &str, by: &str) -> FieldDescriptor {
        let mut options = BTreeMap::new();
        options.insert(BY_OPTION.to_string(), by.to_string());
        FieldDescriptor {
            name: name.to_string(),
            kind: ValueKind::Scalar,
            type_name: None,
            options,
        }
    }

    fn plain_field(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            kind: ValueKind::Scalar,
            type_name: None,
            options: BTreeMap::new(),
        }
    }

    fn enrichment_message(
        name: &str,
        enrichment_for: &str,
        fields: Vec<FieldDescriptor>,
    ) -> MessageDescriptor {
        let mut options = BTreeMap::new();
        options.insert(
            ENRICHMENT_FOR_OPTION.to_string(),
            enrichment_for.to_string(),
        );
        MessageDescriptor {
            name: name.to_string(),
            fields,
            nested: Vec::new(),
            options,
        }
    }

    fn graph_with(messages: Vec<MessageDescriptor>) -> SchemaGraph {
        SchemaGraph::new(DescriptorSet {
            files: vec![FileDescriptor {
                path: "pkg/test.proto".to_string(),
                package: "pkg".to_string(),
                messages,
                options: BTreeMap::new(),
            }],
        })
        .unwrap()
    }

    #[test]
    fn maps_field_to_concrete_source_field() {
        let graph = graph_with(vec![
            MessageDescriptor {
                name: "Bar".to_string(),
                fields: vec![plain_field("comment")],
                nested: Vec::new(),
                options: BTreeMap::new(),
            },
            enrichment_message("Foo", "pkg.Bar", vec![field_with_by("note", "pkg.Bar.comment")]),
        ]);

        let foo = graph.find("pkg.Foo").unwrap();
        let (matches, errors) = match_enrichment(foo, &graph);
        assert!(errors.is_empty());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, "pkg.Bar");
        let note = &matches[0].fields["note"];
        assert_eq!(note.field.as_ref().unwrap().name, "comment");
        assert_eq!(note.via, "pkg.Bar.comment");
    }

    #[test]
    fn context_alternative_is_the_fallback() {
        let graph = graph_with(vec![
            MessageDescriptor {
                name: "Source".to_string(),
                fields: vec![plain_field("other")],
                nested: Vec::new(),
                options: BTreeMap::new(),
            },
            enrichment_message(
                "WhenWhere",
                "pkg.Source",
                vec![field_with_by("at", "Source.x,context.y")],
            ),
        ]);

        let decl = graph.find("pkg.WhenWhere").unwrap();
        let (matches, errors) = match_enrichment(decl, &graph);
        assert!(errors.is_empty());
        assert_eq!(matches.len(), 1);
        let at = &matches[0].fields["at"];
        assert!(at.field.is_none());
        assert_eq!(at.via, "context.y");
    }

    #[test]
    fn first_resolvable_alternative_wins() {
        let graph = graph_with(vec![
            MessageDescriptor {
                name: "Source".to_string(),
                fields: vec![plain_field("first"), plain_field("second")],
                nested: Vec::new(),
                options: BTreeMap::new(),
            },
            enrichment_message(
                "Ordered",
                "pkg.Source",
                vec![field_with_by("value", "missing,first,second")],
            ),
        ]);

        let decl = graph.find("pkg.Ordered").unwrap();
        let (matches, errors) = match_enrichment(decl, &graph);
        assert!(errors.is_empty());
        assert_eq!(matches[0].fields["value"].via, "first");
    }

    #[test]
    fn unresolvable_field_rejects_the_pair() {
        let graph = graph_with(vec![
            MessageDescriptor {
                name: "Source".to_string(),
                fields: vec![plain_field("present")],
                nested: Vec::new(),
                options: BTreeMap::new(),
            },
            enrichment_message(
                "Broken",
                "pkg.Source",
                vec![
                    field_with_by("good", "present"),
                    field_with_by("bad", "absent,also_absent"),
                ],
            ),
        ]);

        let decl = graph.find("pkg.Broken").unwrap();
        let (matches, errors) = match_enrichment(decl, &graph);
        assert!(matches.is_empty());
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("pkg.Broken.bad"));
        assert!(message.contains("absent, also_absent"));
    }

    #[test]
    fn missing_enrichment_for_option_fails() {
        let graph = graph_with(vec![MessageDescriptor {
            name: "Marked".to_string(),
            fields: vec![plain_field("value")],
            nested: Vec::new(),
            options: {
                let mut options = BTreeMap::new();
                options.insert(ENRICHMENT_OPTION.to_string(), "true".to_string());
                options
            },
        }]);

        let decl = graph.find("pkg.Marked").unwrap();
        assert!(is_enrichment(decl));
        let err = EnrichmentType::new(decl).unwrap_err();
        assert!(err.to_string().contains("lacks the `enrichment_for` option"));
    }

    #[test]
    fn enrichment_without_fields_fails() {
        let graph = graph_with(vec![enrichment_message("Empty", "pkg.Source", Vec::new())]);
        let decl = graph.find("pkg.Empty").unwrap();
        let err = EnrichmentType::new(decl).unwrap_err();
        assert!(err.to_string().contains("declares no fields"));
    }

    #[test]
    fn two_context_alternatives_are_ambiguous() {
        let graph = graph_with(vec![enrichment_message(
            "Twice",
            "pkg.Source",
            vec![field_with_by("at", "context.a,context.b")],
        )]);

        let decl = graph.find("pkg.Twice").unwrap();
        let err = EnrichmentType::new(decl).unwrap_err();
        assert!(err.to_string().contains("ambiguous reference"));
    }

    #[test]
    fn unqualified_sources_inherit_the_file_package() {
        let graph = graph_with(vec![
            MessageDescriptor {
                name: "Local".to_string(),
                fields: vec![plain_field("value")],
                nested: Vec::new(),
                options: BTreeMap::new(),
            },
            enrichment_message("ByName", "Local", vec![field_with_by("copy", "value")]),
        ]);

        let decl = graph.find("pkg.ByName").unwrap();
        let enrichment = EnrichmentType::new(decl).unwrap();
        assert_eq!(enrichment.sources().value(), "pkg.Local");
        let (matches, errors) = match_enrichment(decl, &graph);
        assert!(errors.is_empty());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, "pkg.Local");
    }
}
