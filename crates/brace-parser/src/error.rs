//! Error types for parsing and building templates.
//!
//! Grammar failures ([`ParseError`]) are user-facing and come with a failure
//! tree for diagnostics. Builder failures ([`BuildError`]) mean the parse tree
//! and the AST disagree, which is a bug in this crate.

mod build_error;
mod cause;
mod diagnostic;
mod parse_error;

pub use build_error::BuildError;
pub use cause::{Cause, Reason};
pub use diagnostic::{ErrorNode, ErrorTree, Report, print_diagnostic};
pub use parse_error::ParseError;

use thiserror::Error;

/// Any failure of [`parse_template`](crate::parse_template).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("internal error while building the AST: {0}")]
    Build(#[from] BuildError),
}
