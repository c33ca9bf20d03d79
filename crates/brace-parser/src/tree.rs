//! Generic parse tree.
//!
//! The grammar does not know about AST types. Every rule captures into one of
//! three shapes: a leaf string, an ordered sequence, or a node of named
//! fields. Field order follows capture order, which keeps the serialized form
//! stable for tests and tooling.
//!
//! ```text
//! {name.split(" ")}
//!
//! [{"code": [{"call": {
//!     "name": "name",
//!     "operator": ".",
//!     "call": {"name": "split", "arguments": [{"string": [{"text": " "}]}]}
//! }}]}]
//! ```

use indexmap::IndexMap;
use serde::Serialize;

/// Named captures of a keyed parse tree node.
pub type Fields = IndexMap<&'static str, Tree>;

/// A node of the parse tree produced by the [`Grammar`](crate::Grammar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Tree {
    /// A captured run of source text, after escape processing.
    Leaf(String),
    /// An ordered repetition of captures.
    Seq(Vec<Tree>),
    /// Named captures.
    Node(Fields),
}

impl Tree {
    pub fn leaf(value: impl Into<String>) -> Self {
        Self::Leaf(value.into())
    }

    pub fn seq(items: Vec<Tree>) -> Self {
        Self::Seq(items)
    }

    /// Build a keyed node from a fixed list of captures.
    pub fn node<const N: usize>(fields: [(&'static str, Tree); N]) -> Self {
        Self::Node(fields.into_iter().collect())
    }

    /// Build a node with a single capture, the shape every alternative of a
    /// choice uses to announce which branch matched.
    pub fn tagged(tag: &'static str, tree: Tree) -> Self {
        Self::node([(tag, tree)])
    }

    /// Short name of the shape, used in builder errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Seq(_) => "sequence",
            Self::Node(_) => "node",
        }
    }
}
