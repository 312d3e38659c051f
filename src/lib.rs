pub mod descriptor;
pub mod directive;
pub mod enrichment;
pub mod error;
pub mod field_ref;
pub mod interface;
pub mod type_ref;

use directive::{implement_interface, InsertionDirective};
use enrichment::{is_enrichment, match_enrichment, FieldMatch};

pub use descriptor::SchemaGraph;
pub use error::SpliceError;
pub use interface::{PatternRule, ResolveConfig};

#[derive(Debug, Default)]
/// Everything one resolution run produced: insertion directives, enrichment
/// field mappings, and the structural errors collected along the way.
pub struct Resolution {
    /// Insertion directives for the external code emitter.
    pub directives: Vec<InsertionDirective>,
    /// Field mappings, one per matched `(source, enrichment)` pair.
    pub enrichments: Vec<FieldMatch>,
    /// Structural errors; each names the offending declaration and never
    /// aborts processing of the others.
    pub errors: Vec<SpliceError>,
}

impl Resolution {
    /// Serializes the run's output to JSON text for the emitter handoff.
    ///
    /// When `pretty` is `true`, output is formatted with indentation.
    pub fn to_json_string(&self, pretty: bool) -> Result<String, SpliceError> {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        let value = serde_json::json!({
            "directives": &self.directives,
            "enrichments": &self.enrichments,
            "errors": errors,
        });
        let rendered = if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.map_err(|e| SpliceError::SerializationError(e.to_string()))
    }
}

/// Runs every declaration of `graph` through interface classification and,
/// for declarations annotated as enrichments, through enrichment matching.
///
/// Resolution is a pure function of the graph and configuration: each
/// declaration is processed independently, output order follows declaration
/// order, and repeated runs produce identical results.
pub fn resolve_schema(graph: &SchemaGraph, config: &ResolveConfig) -> Resolution {
    let mut out = Resolution::default();

    for decl in graph.declarations() {
        for interface in interface::classify(decl, graph, config) {
            out.directives.push(implement_interface(decl, &interface));
        }

        if is_enrichment(decl) {
            let (matches, errors) = match_enrichment(decl, graph);
            out.enrichments.extend(matches);
            out.errors.extend(errors);
        }
    }

    out
}

/// Loads a JSON-serialized descriptor set and resolves it.
pub fn resolve_schema_json(input: &str, config: &ResolveConfig) -> Result<Resolution, SpliceError> {
    let graph = SchemaGraph::from_json(input)?;
    Ok(resolve_schema(&graph, config))
}
