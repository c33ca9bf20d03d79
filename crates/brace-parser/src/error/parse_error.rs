use std::fmt;

use super::{Cause, ErrorTree};

/// The grammar could not match the source.
///
/// Carries the complete failure tree together with a copy of the source so
/// diagnostics can be rendered after the input has gone away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    cause: Cause,
    source: String,
}

impl ParseError {
    pub(crate) fn new(cause: Cause, source: &str) -> Self {
        Self {
            cause,
            source: source.to_owned(),
        }
    }

    /// Root of the failure tree.
    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    /// The text that failed to parse.
    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn error_tree(&self) -> ErrorTree<'_> {
        ErrorTree::new(&self.cause, &self.source)
    }

    /// Byte offset of the most likely failure location.
    pub fn offset(&self) -> usize {
        self.error_tree().best().offset()
    }

    /// Render the diagnostic: the best failure with its source line and a
    /// caret, or the full ancestor trace when `trace` is set.
    pub fn report(&self, trace: bool) -> String {
        self.error_tree().report(trace).to_string()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_tree().best().message())
    }
}

impl std::error::Error for ParseError {}
