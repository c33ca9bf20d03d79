//! Grammar failure records.

use std::{fmt, sync::Arc};

/// Why a grammar rule failed at a given offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// A literal string was expected.
    Literal {
        literal: &'static str,
        found: Option<char>,
    },
    /// A class of input was expected, such as a name or text.
    Expected {
        expected: &'static str,
        found: Option<char>,
    },
    /// A keyword was present but continued into a longer name.
    Keyword(&'static str),
    /// A reserved word was used as a name.
    Reserved(&'static str),
    /// A construct matched but was followed by input it may not touch.
    Unexpected(&'static str),
    /// Every alternative of an ordered choice failed.
    OneOf {
        label: &'static str,
        alternatives: Vec<&'static str>,
    },
    /// A repetition did not match even once.
    AtLeastOne(&'static str),
    /// A named rule failed; the reason is among the children.
    Failed(&'static str),
    /// The template stopped matching before the end of the input.
    Leftover { found: Option<char> },
    /// The number grammar rejected the input.
    InvalidNumber(Option<&'static str>),
    /// The configured nesting limit was reached.
    TooDeep(usize),
}

struct Found(Option<char>);

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(c) => write!(f, "\"{}\"", c.escape_debug()),
            None => f.write_str("end of input"),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { literal, found } => {
                write!(f, "Expected \"{literal}\", but got {}", Found(*found))
            }
            Self::Expected { expected, found } => {
                write!(f, "Expected {expected}, but got {}", Found(*found))
            }
            Self::Keyword(word) => write!(f, "Expected keyword \"{word}\""),
            Self::Reserved(word) => {
                write!(f, "\"{word}\" is a reserved word and cannot be used as a name")
            }
            Self::Unexpected(what) => write!(f, "Input should not be followed by {what}"),
            Self::OneOf {
                label,
                alternatives,
            } => write!(f, "Expected one of [{}] for {label}", alternatives.join(", ")),
            Self::AtLeastOne(label) => write!(f, "Expected at least 1 of {label}"),
            Self::Failed(rule) => write!(f, "Failed to match {rule}"),
            Self::Leftover { found } => write!(f, "Don't know what to do with {}", Found(*found)),
            Self::InvalidNumber(Some(label)) => write!(f, "Invalid number, expected {label}"),
            Self::InvalidNumber(None) => f.write_str("Expected number"),
            Self::TooDeep(limit) => write!(f, "Maximum nesting depth of {limit} exceeded"),
        }
    }
}

/// A node of the grammar's failure tree.
///
/// Offsets are byte offsets into the parsed source. Each cause also records
/// the furthest offset reached anywhere beneath it, which is what the
/// diagnostic heuristic looks at.
///
/// Children are shared: a memoised failure replayed under several
/// alternatives appears in each of them without being copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    offset: usize,
    reason: Reason,
    children: Vec<Arc<Cause>>,
    furthest: usize,
}

/// Label of the placeholder that collects failed `alt` branches.
const UNNAMED: &str = "";

impl Cause {
    pub(crate) fn new(offset: usize, reason: Reason) -> Self {
        Self {
            offset,
            reason,
            children: Vec::new(),
            furthest: offset,
        }
    }

    pub(crate) fn with_child(mut self, child: Cause) -> Self {
        self.furthest = self.furthest.max(child.furthest);
        self.children.push(Arc::new(child));
        self
    }

    pub(crate) fn with_children(self, children: impl IntoIterator<Item = Cause>) -> Self {
        children.into_iter().fold(self, Self::with_child)
    }

    /// Collect the failure of another alternative of the same choice.
    pub(crate) fn either(self, other: Cause) -> Self {
        if self.is_unnamed_choice() {
            self.with_child(other)
        } else {
            let choice = Self::new(
                self.offset,
                Reason::OneOf {
                    label: UNNAMED,
                    alternatives: Vec::new(),
                },
            );
            choice.with_child(self).with_child(other)
        }
    }

    /// Name the alternatives collected by [`Cause::either`].
    pub(crate) fn into_choice(
        self,
        offset: usize,
        label: &'static str,
        alternatives: &[&'static str],
    ) -> Self {
        let reason = Reason::OneOf {
            label,
            alternatives: alternatives.to_vec(),
        };
        if self.is_unnamed_choice() {
            Self {
                offset,
                reason,
                furthest: self.furthest.max(offset),
                children: self.children,
            }
        } else {
            Self::new(offset, reason).with_child(self)
        }
    }

    fn is_unnamed_choice(&self) -> bool {
        matches!(self.reason, Reason::OneOf { label: UNNAMED, .. })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reason(&self) -> &Reason {
        &self.reason
    }

    pub fn children(&self) -> &[Arc<Cause>] {
        &self.children
    }

    /// The largest offset of this cause or any descendant.
    pub fn furthest(&self) -> usize {
        self.furthest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_furthest_tracks_descendants() {
        let cause = Cause::new(0, Reason::Failed("code")).with_child(
            Cause::new(1, Reason::Failed("call"))
                .with_child(Cause::new(7, Reason::AtLeastOne("argument"))),
        );

        assert_eq!(cause.offset(), 0);
        assert_eq!(cause.furthest(), 7);
        assert_eq!(cause.children()[0].furthest(), 7);
    }

    #[test]
    fn test_with_children_keeps_order() {
        let cause = Cause::new(2, Reason::Failed("value")).with_children([
            Cause::new(2, Reason::Keyword("nothing")),
            Cause::new(3, Reason::AtLeastOne("digit")),
        ]);

        let offsets: Vec<_> = cause.children().iter().map(|child| child.offset()).collect();
        assert_eq!(offsets, [2, 3]);
        assert_eq!(cause.furthest(), 3);
    }

    #[test]
    fn test_either_collects_alternatives_in_order() {
        let first = Cause::new(4, Reason::Keyword("nothing"));
        let second = Cause::new(5, Reason::AtLeastOne("digit"));
        let third = Cause::new(4, Reason::Failed("call"));

        let cause = first
            .either(second)
            .either(third)
            .into_choice(4, "value", &["nothing", "number", "call"]);

        assert_eq!(
            cause.reason(),
            &Reason::OneOf {
                label: "value",
                alternatives: vec!["nothing", "number", "call"],
            }
        );
        assert_eq!(cause.children().len(), 3);
        assert_eq!(cause.children()[1].offset(), 5);
        assert_eq!(cause.furthest(), 5);
    }

    #[test]
    fn test_into_choice_wraps_a_single_failure() {
        let cause = Cause::new(3, Reason::Failed("list")).into_choice(2, "element", &["list"]);

        assert_eq!(cause.offset(), 2);
        assert_eq!(cause.children().len(), 1);
        assert_eq!(cause.children()[0].reason(), &Reason::Failed("list"));
    }

    #[test]
    fn test_reason_messages() {
        let literal = Reason::Literal {
            literal: "}",
            found: Some('x'),
        };
        assert_eq!(literal.to_string(), "Expected \"}\", but got \"x\"");

        let at_end = Reason::Expected {
            expected: "name",
            found: None,
        };
        assert_eq!(at_end.to_string(), "Expected name, but got end of input");

        let one_of = Reason::OneOf {
            label: "statement",
            alternatives: vec!["define", "if", "value statement"],
        };
        assert_eq!(
            one_of.to_string(),
            "Expected one of [define, if, value statement] for statement"
        );

        let newline = Reason::Leftover { found: Some('\n') };
        assert_eq!(newline.to_string(), "Don't know what to do with \"\\n\"");
    }
}
