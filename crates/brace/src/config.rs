use serde::Deserialize;

pub use brace_parser::ParserConfig;

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AppConfig {
    /// Grammar settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Diagnostic output settings
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Diagnostic configuration section
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DiagnosticsConfig {
    /// Print the full chain of failed rules instead of only the best guess
    #[serde(default)]
    pub trace: bool,
}
