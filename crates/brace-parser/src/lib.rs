//! # Brace Parser
//!
//! Front end for the Brace template language. This crate turns template
//! source into a typed syntax tree, or into a diagnostic pointing at the most
//! likely mistake.
//!
//! ## Pipeline
//!
//! 1. **Parse** - [`Grammar`] matches the source and captures a generic
//!    [`Tree`]; a failure yields a [`ParseError`] holding every alternative
//!    that was tried.
//! 2. **Build** - [`build`] turns the parse tree into an [`ast::Template`].
//! 3. **Report** - [`print_diagnostic`] renders a failed parse as a message,
//!    the offending source line and a caret.
//!
//! ## Usage
//!
//! ```
//! # use brace_parser::{parse_template, Error};
//!
//! fn main() -> Result<(), Error> {
//!     let template = parse_template("Hello {user.name}!")?;
//!     assert_eq!(template.node_names(), ["Text", "Code", "Text"]);
//!     Ok(())
//! }
//! ```
//!
//! A failed parse reports the furthest point the grammar reached:
//!
//! ```
//! # use brace_parser::parse;
//!
//! let error = parse("Hello {name").unwrap_err();
//! assert_eq!(
//!     error.to_string(),
//!     "Expected \"}\", but got end of input at line 1 char 12."
//! );
//! ```

pub mod ast;
mod build;
mod config;
pub mod error;
mod grammar;
mod input;
mod number;
mod structure;
mod tree;

pub use build::build;
pub use config::ParserConfig;
pub use error::{BuildError, Error, ParseError, print_diagnostic};
pub use grammar::{Grammar, parse};
pub use number::parse_number;
pub use structure::{Structure, ToStructure};
pub use tree::{Fields, Tree};

use log::debug;

/// Parse and build a template with the default configuration.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the source is not a valid template.
pub fn parse_template(source: &str) -> Result<ast::Template, Error> {
    parse_template_with(source, ParserConfig::default())
}

/// Parse and build a template with an explicit configuration.
///
/// # Errors
///
/// See [`parse_template`].
pub fn parse_template_with(source: &str, config: ParserConfig) -> Result<ast::Template, Error> {
    let tree = Grammar::new(config).parse(source)?;
    let template = build(tree)?;
    debug!(nodes = template.children.len(); "Template parsed");
    Ok(template)
}
