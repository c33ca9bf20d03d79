use thiserror::Error;

/// A parse tree did not have the shape the AST builder expects.
///
/// The grammar and the builder are written against the same capture names,
/// so any of these indicates a defect rather than bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("`{node}` node has unconsumed fields: {}", .fields.join(", "))]
    UnconsumedFields {
        node: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("`{node}` node is missing required field `{field}`")]
    MissingField {
        node: &'static str,
        field: &'static str,
    },

    #[error("expected {expected} for `{node}`, found {found}")]
    UnexpectedKind {
        node: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("`{node}` leaf has unexpected text {text:?}")]
    InvalidLeaf { node: &'static str, text: String },

    #[error("unknown `{node}` shape with fields: {}", .fields.join(", "))]
    UnknownShape {
        node: &'static str,
        fields: Vec<&'static str>,
    },
}
