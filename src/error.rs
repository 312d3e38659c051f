//! Error definitions for all `proto_splice` resolution stages.

use thiserror::Error;

#[derive(Debug, Error)]
/// Top-level error type returned by public APIs.
pub enum SpliceError {
    /// Raw reference text violating the type/field reference grammar
    /// (blank input, wildcard in a forbidden position, empty segment,
    /// single-element composite).
    #[error("malformed reference: {0}")]
    MalformedReference(String),
    /// More than one context-qualified alternative declared on one field.
    #[error("ambiguous reference: {0}")]
    AmbiguousReference(String),
    /// No alternative resolves a concrete field and none is context-qualified.
    #[error("unresolvable reference: {0}")]
    UnresolvableReference(String),
    /// A required option is absent or blank on a declaration or field.
    #[error("missing option: {0}")]
    MissingOption(String),
    /// Malformed descriptor input or an inconsistent schema graph.
    #[error("schema error: {0}")]
    SchemaError(String),
    /// Output serialization failure.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// Filesystem I/O error from callers that propagate I/O.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
