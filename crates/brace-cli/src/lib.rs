//! Brace CLI library
//!
//! This module contains the core CLI logic for the Brace template tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Emit};
pub use error_adapter::{ErrorAdapter, render_error};

use std::{
    fs,
    io::{self, Write},
};

use log::{debug, info};
use serde::Serialize;

use brace::{BraceError, Engine, ToStructure, config::AppConfig, render::Context};

/// Load the configuration selected by `args`.
///
/// `--trace` overrides `diagnostics.trace` from the file.
///
/// # Errors
///
/// Returns [`BraceError::Config`] or [`BraceError::Io`] when a configuration
/// file is found but unusable.
pub fn load_config(args: &Args) -> Result<AppConfig, BraceError> {
    let mut app_config = config::load_config(args.config.as_ref())?;
    if args.trace {
        app_config.diagnostics.trace = true;
    }
    debug!(config:? = app_config; "Configuration loaded");
    Ok(app_config)
}

/// Run the Brace CLI application
///
/// # Errors
///
/// Returns `BraceError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax errors in the template
/// - Code the built-in renderer cannot evaluate
pub fn run(args: &Args) -> Result<(), BraceError> {
    let app_config = load_config(args)?;
    run_with_config(args, app_config)
}

/// Run the Brace CLI application with an already loaded configuration.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_config(args: &Args, app_config: AppConfig) -> Result<(), BraceError> {
    info!(
        input_path = args.input,
        emit:? = args.emit;
        "Processing template"
    );

    let source = fs::read_to_string(&args.input)?;
    let engine = Engine::new(app_config);

    let output = match args.emit {
        Emit::Tree => to_json(&engine.parse_tree(&source)?)?,
        Emit::Ast => to_json(&engine.parse(&source)?.to_structure())?,
        Emit::Text => {
            let context: Context = args.set.iter().cloned().collect();
            engine.render(&source, &context)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            info!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn to_json(value: &impl Serialize) -> Result<String, BraceError> {
    let mut json = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    json.push('\n');
    Ok(json)
}
