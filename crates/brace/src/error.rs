//! Error types for Brace operations.
//!
//! This module provides the main error type [`BraceError`] which wraps the
//! failures of every stage: loading input, parsing, building and rendering.

use std::io;

use thiserror::Error;

use brace_parser::{BuildError, ParseError};

use crate::render::RenderError;

/// The main error type for Brace operations.
///
/// The `Parse` variant carries the complete failure tree and source, so
/// callers can render a diagnostic with
/// [`print_diagnostic`](brace_parser::print_diagnostic).
#[derive(Debug, Error)]
pub enum BraceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Internal error while building the AST: {0}")]
    Build(#[from] BuildError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<brace_parser::Error> for BraceError {
    fn from(error: brace_parser::Error) -> Self {
        match error {
            brace_parser::Error::Parse(err) => Self::Parse(err),
            brace_parser::Error::Build(err) => Self::Build(err),
        }
    }
}
