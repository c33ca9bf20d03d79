//! Parser input and the combinators the template grammar adds to winnow.
//!
//! The grammar runs over a [`Stateful`] `&str`. The state carries the
//! configuration, the current nesting depth, the packrat table and the
//! furthest failure recorded so far. Failures are [`Cause`] trees, and
//! [`Cause`] implements winnow's [`ParserError`] so `alt`, `opt`, `repeat`
//! and `separated` collect and discard them the usual way.
//!
//! Reaching [`ParserConfig::max_depth`] is an [`ErrMode::Cut`]. No
//! alternative is tried after it and the parse unwinds straight to the top.
//!
//! A failure thrown away by a successful match, such as a losing alternative
//! or an optional part that did not match, leaves no trace in the failure
//! tree. Every named rule that fails is offered to the furthest-failure
//! record instead. When the whole template fails, the record is attached to
//! the root so the deepest partial match still reaches the diagnostic.

use std::{collections::HashMap, mem};

use log::trace;
use winnow::{
    Parser,
    combinator::{Alt, repeat},
    error::{ErrMode, ModalResult, ParserError},
    stream::{Stateful, Stream},
    token::{literal, take_while},
};

use crate::{
    config::ParserConfig,
    error::{Cause, Reason},
    tree::Tree,
};

/// Template source plus parse state.
pub(crate) type Input<'i> = Stateful<&'i str, &'i mut State>;

pub(crate) type PResult<T> = ModalResult<T, Cause>;

#[derive(Debug, Clone)]
struct Memo {
    result: Result<(Tree, usize), Cause>,
    /// Rule levels the evaluation nested below its starting depth.
    height: usize,
    /// The failure the evaluation left in the furthest-failure record.
    furthest: Option<Cause>,
}

#[derive(Debug)]
pub(crate) struct State {
    config: ParserConfig,
    source_len: usize,
    depth: usize,
    peak: usize,
    memo: HashMap<(&'static str, usize), Memo>,
    furthest: Option<Cause>,
}

impl State {
    pub(crate) fn new(source: &str, config: ParserConfig) -> Self {
        Self {
            config,
            source_len: source.len(),
            depth: 0,
            peak: 0,
            memo: HashMap::new(),
            furthest: None,
        }
    }

    /// The failure that reached furthest into the input, if any rule failed.
    pub(crate) fn take_furthest(&mut self) -> Option<Cause> {
        self.furthest.take()
    }

    /// Keep `cause` if it reaches at least as far as the current record.
    ///
    /// Later failures win ties, so the record ends on the failure the parse
    /// actually gave up on at that offset.
    fn record(&mut self, cause: Option<Cause>) {
        let Some(cause) = cause else {
            return;
        };
        let further = self
            .furthest
            .as_ref()
            .is_none_or(|current| cause.furthest() >= current.furthest());
        if further {
            self.furthest = Some(cause);
        }
    }
}

impl<'i> ParserError<Input<'i>> for Cause {
    type Inner = Self;

    fn from_input(input: &Input<'i>) -> Self {
        Cause::new(
            offset(input),
            Reason::Expected {
                expected: "input",
                found: peek(input),
            },
        )
    }

    fn or(self, other: Self) -> Self {
        self.either(other)
    }

    fn into_inner(self) -> Result<Self::Inner, Self> {
        Ok(self)
    }
}

/// Byte offset of the input's current position in the whole source.
pub(crate) fn offset(input: &Input<'_>) -> usize {
    input.state.source_len - input.input.len()
}

pub(crate) fn peek(input: &Input<'_>) -> Option<char> {
    input.input.chars().next()
}

pub(crate) fn fail<T>(input: &Input<'_>, reason: Reason) -> PResult<T> {
    Err(ErrMode::Backtrack(Cause::new(offset(input), reason)))
}

/// Fail expecting a class of input at the current position.
pub(crate) fn expected<T>(input: &Input<'_>, expected: &'static str) -> PResult<T> {
    fail(
        input,
        Reason::Expected {
            expected,
            found: peek(input),
        },
    )
}

/// The cause carried by a failed parse.
///
/// The input is always complete, so `Incomplete` only arises from a bug in a
/// combinator; it is reported as a failure at `offset`.
pub(crate) fn into_cause(err: ErrMode<Cause>, offset: usize) -> Cause {
    match err {
        ErrMode::Backtrack(cause) | ErrMode::Cut(cause) => cause,
        ErrMode::Incomplete(_) => Cause::new(
            offset,
            Reason::Expected {
                expected: "input",
                found: None,
            },
        ),
    }
}

/// Succeed only at the end of the source.
pub(crate) fn end_of_input(input: &mut Input<'_>) -> PResult<()> {
    if input.input.is_empty() {
        Ok(())
    } else {
        fail(input, Reason::Leftover { found: peek(input) })
    }
}

/// Apply `f` to a recoverable failure. A cut passes through unchanged.
pub(crate) fn map_backtrack(
    err: ErrMode<Cause>,
    f: impl FnOnce(Cause) -> Cause,
) -> ErrMode<Cause> {
    match err {
        ErrMode::Backtrack(cause) => ErrMode::Backtrack(f(cause)),
        err => err,
    }
}

/// Match `expected` exactly.
pub(crate) fn tag<'i>(expected: &'static str) -> impl Parser<Input<'i>, (), ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        literal(expected)
            .void()
            .parse_next(input)
            .map_err(|_: ErrMode<Cause>| {
                ErrMode::Backtrack(Cause::new(
                    offset(input),
                    Reason::Literal {
                        literal: expected,
                        found: peek(input),
                    },
                ))
            })
    }
}

/// The longest prefix whose characters satisfy `pred`. Never fails.
pub(crate) fn take_chars<'i>(input: &mut Input<'i>, pred: impl Fn(char) -> bool) -> &'i str {
    let taken: PResult<&'i str> = take_while(0.., pred).parse_next(input);
    taken.unwrap_or_default()
}

/// Zero or more whitespace characters.
pub(crate) fn spaces0(input: &mut Input<'_>) -> PResult<()> {
    take_chars(input, char::is_whitespace);
    Ok(())
}

/// One or more whitespace characters.
pub(crate) fn spaces1(input: &mut Input<'_>) -> PResult<()> {
    if take_chars(input, char::is_whitespace).is_empty() {
        expected(input, "whitespace")
    } else {
        Ok(())
    }
}

/// One or more matches of `parser`.
pub(crate) fn at_least_one<'i, O>(
    label: &'static str,
    mut parser: impl Parser<Input<'i>, O, ErrMode<Cause>>,
) -> impl Parser<Input<'i>, Vec<O>, ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        let start = offset(input);
        let first = parser.parse_next(input).map_err(|err| {
            map_backtrack(err, |cause| {
                Cause::new(start, Reason::AtLeastOne(label)).with_child(cause)
            })
        })?;
        let rest: Vec<O> = repeat(0.., parser.by_ref()).parse_next(input)?;

        let mut items = Vec::with_capacity(rest.len() + 1);
        items.push(first);
        items.extend(rest);
        Ok(items)
    }
}

/// Ordered choice: the first alternative that matches wins.
///
/// `names` labels the alternatives in the failure tree, in the order they
/// appear in `alternatives`.
pub(crate) fn choice<'i, O>(
    label: &'static str,
    names: &'static [&'static str],
    mut alternatives: impl Alt<Input<'i>, O, ErrMode<Cause>>,
) -> impl Parser<Input<'i>, O, ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        let start = input.checkpoint();
        let start_offset = offset(input);
        match alternatives.choice(input) {
            Err(ErrMode::Backtrack(cause)) => {
                input.reset(&start);
                Err(ErrMode::Backtrack(cause.into_choice(
                    start_offset,
                    label,
                    names,
                )))
            }
            result => result,
        }
    }
}

/// A named rule.
///
/// On failure the input is rewound, the failure is wrapped in a cause naming
/// the rule and offered to the furthest-failure record. Rules also count
/// nesting depth: entering one at [`ParserConfig::max_depth`] cuts the parse.
pub(crate) fn rule<'i, O>(
    name: &'static str,
    mut parser: impl Parser<Input<'i>, O, ErrMode<Cause>>,
) -> impl Parser<Input<'i>, O, ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        let limit = input.state.config.max_depth();
        let depth = input.state.depth;
        let start_offset = offset(input);
        if depth >= limit {
            trace!(rule = name, offset = start_offset; "Nesting limit reached");
            return Err(ErrMode::Cut(Cause::new(
                start_offset,
                Reason::TooDeep(limit),
            )));
        }

        let start = input.checkpoint();
        input.state.depth = depth + 1;
        input.state.peak = input.state.peak.max(depth + 1);
        let result = parser.parse_next(input);
        input.state.depth = depth;

        match result {
            Err(ErrMode::Backtrack(cause)) => {
                input.reset(&start);
                let cause = Cause::new(start_offset, Reason::Failed(name)).with_child(cause);
                input.state.record(Some(cause.clone()));
                Err(ErrMode::Backtrack(cause))
            }
            result => result,
        }
    }
}

/// Run `parser` through the packrat table when memoisation is enabled.
///
/// An entry is reused only when replaying it cannot cross the depth limit:
/// the depth at the call plus the height the first evaluation nested must
/// stay within [`ParserConfig::max_depth`]. Otherwise the parser runs again.
/// A replay restores the end offset and re-offers the furthest failure the
/// evaluation recorded, so memoised and plain parses agree exactly. Cut
/// results are never stored.
pub(crate) fn memoized<'i>(
    key: &'static str,
    mut parser: impl Parser<Input<'i>, Tree, ErrMode<Cause>>,
) -> impl Parser<Input<'i>, Tree, ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        if !input.state.config.memoize() {
            return parser.parse_next(input);
        }

        let start = offset(input);
        let depth = input.state.depth;
        let limit = input.state.config.max_depth();
        let hit = input
            .state
            .memo
            .get(&(key, start))
            .filter(|memo| depth + memo.height <= limit)
            .cloned();
        if let Some(Memo {
            result,
            height,
            furthest,
        }) = hit
        {
            trace!(rule = key, offset = start; "Memo hit");
            input.state.peak = input.state.peak.max(depth + height);
            input.state.record(furthest);
            return match result {
                Ok((tree, end)) => {
                    input.input = &input.input[end - start..];
                    Ok(tree)
                }
                Err(cause) => Err(ErrMode::Backtrack(cause)),
            };
        }

        let outer_peak = mem::replace(&mut input.state.peak, depth);
        let outer_furthest = input.state.furthest.take();
        let result = parser.parse_next(input);
        let end = offset(input);

        let state = &mut *input.state;
        let height = state.peak - depth;
        state.peak = state.peak.max(outer_peak);
        let furthest = mem::replace(&mut state.furthest, outer_furthest);
        state.record(furthest.clone());

        let stored = match &result {
            Ok(tree) => Some(Ok((tree.clone(), end))),
            Err(ErrMode::Backtrack(cause)) => Some(Err(cause.clone())),
            Err(_) => None,
        };
        if let Some(stored) = stored {
            state.memo.insert(
                (key, start),
                Memo {
                    result: stored,
                    height,
                    furthest,
                },
            );
        }
        result
    }
}
