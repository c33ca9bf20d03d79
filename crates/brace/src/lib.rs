//! Brace - a small template language with brace-delimited code
//!
//! This library bundles configuration, parsing and rendering for Brace
//! templates. The language front end lives in [`brace_parser`]; this crate
//! adds the [`Engine`] entry point and the rendering seam.

pub mod config;
pub mod render;

mod error;

pub use brace_parser::{
    BuildError, ParseError, Structure, ToStructure, Tree, ast, print_diagnostic,
};

pub use error::BraceError;

use log::{debug, info, trace};

use config::AppConfig;
use render::{Context, ContextRenderer, Renderer};

/// Entry point for parsing and rendering Brace templates.
///
/// # Examples
///
/// ```rust
/// use brace::{Engine, config::AppConfig, render::Context};
///
/// let engine = Engine::new(AppConfig::default());
///
/// let template = engine.parse("Hello {name}!").expect("Failed to parse");
/// assert_eq!(template.node_names(), ["Text", "Code", "Text"]);
///
/// let mut context = Context::new();
/// context.insert("name".to_owned(), "Dorian".to_owned());
/// let output = engine.render("Hello {name}!", &context).expect("Failed to render");
/// assert_eq!(output, "Hello Dorian!");
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    config: AppConfig,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source text into its generic parse tree.
    ///
    /// # Errors
    ///
    /// Returns [`BraceError::Parse`] when the source is not a valid template.
    pub fn parse_tree(&self, source: &str) -> Result<Tree, BraceError> {
        let grammar = brace_parser::Grammar::new(self.config.parser);
        Ok(grammar.parse(source)?)
    }

    /// Parse source text into a template AST.
    ///
    /// # Errors
    ///
    /// Returns [`BraceError::Parse`] for syntax errors. [`BraceError::Build`]
    /// indicates a defect in the parser.
    pub fn parse(&self, source: &str) -> Result<ast::Template, BraceError> {
        info!(source_len = source.len(); "Parsing template");
        let template = brace_parser::parse_template_with(source, self.config.parser)?;
        debug!(nodes = template.children.len(); "Template built");
        trace!(template:?; "Template AST");
        Ok(template)
    }

    /// Parse and render source text with the built-in [`ContextRenderer`].
    ///
    /// # Errors
    ///
    /// Fails on syntax errors and on code the built-in renderer cannot
    /// evaluate.
    pub fn render(&self, source: &str, context: &Context) -> Result<String, BraceError> {
        self.render_with(source, context, &ContextRenderer)
    }

    /// Parse and render source text, delegating code to `renderer`.
    ///
    /// # Errors
    ///
    /// See [`Engine::render`].
    pub fn render_with(
        &self,
        source: &str,
        context: &Context,
        renderer: &impl Renderer,
    ) -> Result<String, BraceError> {
        let template = self.parse(source)?;
        let output = render::render(&template, context, renderer)?;
        info!(output_len = output.len(); "Template rendered");
        Ok(output)
    }
}
