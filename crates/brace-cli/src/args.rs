//! Command-line argument definitions for the Brace CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments choose what to emit, supply context values for
//! rendering, and control configuration and logging.

use clap::{Parser, ValueEnum};

/// What the CLI writes for a successfully parsed template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The typed AST as JSON
    Ast,
    /// The generic parse tree as JSON
    Tree,
    /// The rendered text
    #[default]
    Text,
}

/// Command-line arguments for the Brace template tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input template
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Emit::Text)]
    pub emit: Emit,

    /// Context value for rendering, as `name=value` (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Print the full chain of failed rules on syntax errors
    #[arg(long)]
    pub trace: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, _)) if name.is_empty() => Err(format!("missing name in `{arg}`")),
        Some((name, value)) => Ok((name.to_owned(), value.to_owned())),
        None => Err(format!("expected `name=value`, got `{arg}`")),
    }
}
