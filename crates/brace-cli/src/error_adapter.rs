//! Error adapter for reporting [`BraceError`] on the terminal.
//!
//! Syntax errors use the parser's own text diagnostic: the best-guess
//! message, the offending source line and a caret, optionally preceded by the
//! chain of rules that led there. Every other error is rendered by miette.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan};

use brace::BraceError;

/// Adapter for [`BraceError`] variants without source locations.
pub struct ErrorAdapter<'a>(pub &'a BraceError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            BraceError::Io(_) => "brace::io",
            BraceError::Parse(_) => "brace::parse",
            BraceError::Build(_) => "brace::build",
            BraceError::Render(_) => "brace::render",
            BraceError::Config(_) => "brace::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            BraceError::Build(_) => "this is a bug in the Brace parser, please report it",
            BraceError::Render(_) => "the built-in renderer only substitutes plain names",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Format `err` for the terminal.
///
/// `trace` selects the full rule chain for syntax errors and is ignored for
/// everything else.
pub fn render_error(err: &BraceError, trace: bool) -> String {
    if let BraceError::Parse(parse_err) = err {
        return parse_err.report(trace);
    }

    let mut writer = String::new();
    if GraphicalReportHandler::new()
        .render_report(&mut writer, &ErrorAdapter(err))
        .is_err()
    {
        return err.to_string();
    }
    writer
}

#[cfg(test)]
mod tests {
    use brace::{Engine, render::RenderError};

    use super::*;

    #[test]
    fn test_codes() {
        let err = BraceError::Config("bad".to_owned());
        let code = ErrorAdapter(&err).code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("brace::config"));

        let err = BraceError::Render(RenderError::NotImplemented { variant: "If" });
        let adapter = ErrorAdapter(&err);
        assert_eq!(
            adapter.code().map(|c| c.to_string()).as_deref(),
            Some("brace::render")
        );
        assert!(adapter.help().is_some());
    }

    #[test]
    fn test_syntax_error_uses_text_diagnostic() {
        let err = Engine::default().parse("Hello\n{name.(}").unwrap_err();
        let report = render_error(&err, false);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("at line 2 char 7."), "{report}");
        assert_eq!(lines[1..], ["{name.(}", "      ^"]);
    }

    #[test]
    fn test_trace_starts_at_root() {
        let err = Engine::default().parse("{if a}").unwrap_err();
        let report = render_error(&err, true);
        assert!(report.starts_with("Failed to match template at line 1 char 1."));
        assert!(report.len() > render_error(&err, false).len());
    }

    #[test]
    fn test_other_errors_use_miette() {
        let err = BraceError::Config("Missing configuration file: x.toml".to_owned());
        let report = render_error(&err, false);
        assert!(report.contains("brace::config"));
        assert!(report.contains("x.toml"));
    }
}
