//! Rendering seam.
//!
//! Text nodes render verbatim. Code is handed to a [`Renderer`], which owns
//! every decision about what code means: how names are looked up, how calls
//! are dispatched and what counts as true. [`ContextRenderer`] is the minimal
//! built-in implementation; anything it cannot evaluate is reported as
//! [`RenderError::NotImplemented`] rather than guessed at.

use indexmap::IndexMap;
use log::trace;
use thiserror::Error;

use brace_parser::ast::{Code, Node, Statement, Template, Value};

/// Values visible to a template, by name.
pub type Context = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("rendering `{variant}` is not implemented")]
    NotImplemented { variant: &'static str },
}

/// Evaluates code blocks.
pub trait Renderer {
    fn render_code(&self, code: &Code, context: &Context) -> Result<String, RenderError>;
}

/// Render `template` against `context`, delegating code to `renderer`.
///
/// # Errors
///
/// Returns the first error reported by the renderer.
pub fn render(
    template: &Template,
    context: &Context,
    renderer: &impl Renderer,
) -> Result<String, RenderError> {
    let mut output = String::new();
    for node in &template.children {
        match node {
            Node::Text(text) => output.push_str(&text.value),
            Node::Code(code) => output.push_str(&renderer.render_code(code, context)?),
        }
    }
    Ok(output)
}

/// Renders plain names from the context and literal values.
///
/// - a bare name renders its context value, or nothing when undefined;
/// - strings render their parts, interpolations included;
/// - numbers render in canonical form, booleans as `true`/`false`;
/// - `nothing` renders as the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRenderer;

impl ContextRenderer {
    fn statement(&self, statement: &Statement, context: &Context) -> Result<String, RenderError> {
        match statement {
            Statement::Value(value) => self.value(value, context),
            other => Err(RenderError::NotImplemented {
                variant: other.kind(),
            }),
        }
    }

    fn value(&self, value: &Value, context: &Context) -> Result<String, RenderError> {
        match value {
            Value::Call(call) if call.is_bare() => {
                let rendered = context.get(call.name.as_str()).cloned();
                trace!(name = call.name.as_str(), defined = rendered.is_some(); "Name lookup");
                Ok(rendered.unwrap_or_default())
            }
            Value::String(string) => string
                .parts
                .iter()
                .map(|part| match part {
                    Node::Text(text) => Ok(text.value.clone()),
                    Node::Code(code) => self.render_code(code, context),
                })
                .collect(),
            Value::Number(number) => Ok(number.to_string()),
            Value::Boolean(value) => Ok(value.to_string()),
            Value::Nothing => Ok(String::new()),
            other => Err(RenderError::NotImplemented {
                variant: other.kind(),
            }),
        }
    }
}

impl Renderer for ContextRenderer {
    fn render_code(&self, code: &Code, context: &Context) -> Result<String, RenderError> {
        code.statements
            .iter()
            .map(|statement| self.statement(statement, context))
            .collect()
    }
}
