//! Numeric literal grammar.
//!
//! Numbers are parsed with winnow combinators over `&str`. After an optional
//! sign the alternatives are tried in order: infinity, `0x` hexadecimal, `0o`
//! octal, `0b` binary, and finally base 10 with an optional fraction and
//! exponent.
//!
//! Digit grouping is dropped from the captured digits:
//!
//! - `_` may sit between any two digits (`1_000_0`)
//! - `,` or a single space may introduce a group of exactly three digits
//!   (`12,345,678`, `12 345 678`)
//!
//! The three-digit rule keeps `1, 2` a two-element list inside templates.
//!
//! ```
//! use brace_parser::parse_number;
//!
//! let tree = parse_number("-12,345.5e3").unwrap();
//! let json = serde_json::to_value(&tree).unwrap();
//! assert_eq!(json["sign"], "-");
//! assert_eq!(json["base_10"]["whole"], "12345");
//! ```

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, not, opt, peek, preceded, terminated},
    error::{ContextError, ErrMode, ModalResult, StrContext},
    token::{literal, one_of, take_while},
};

use crate::{
    config::ParserConfig,
    error::{Cause, ParseError, Reason},
    input::{Input, PResult, State, end_of_input, into_cause, offset},
    tree::{Fields, Tree},
};

type IResult<O> = ModalResult<O, ContextError>;

/// Parse a complete numeric literal.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input is not a number or has trailing
/// characters.
pub fn parse_number(source: &str) -> Result<Tree, ParseError> {
    let mut state = State::new(source, ParserConfig::default());
    let mut input = Input {
        input: source,
        state: &mut state,
    };
    terminated(literal_tree, end_of_input)
        .parse_next(&mut input)
        .map_err(|err| ParseError::new(into_cause(err, 0), source))
}

/// Run the number grammar at the current position.
///
/// A prefix such as `0x` without digits is a hard failure whose cause points
/// at the missing digits; any other mismatch fails at the starting offset.
/// Either way the template grammar may still try other alternatives here.
pub(crate) fn literal_tree(input: &mut Input<'_>) -> PResult<Tree> {
    let start = offset(input);
    let mut rest = input.input;
    match number(&mut rest) {
        Ok(tree) => {
            input.input = rest;
            Ok(tree)
        }
        Err(err) => {
            let (at, error) = match err {
                ErrMode::Cut(error) => (start + input.input.len() - rest.len(), error),
                ErrMode::Backtrack(error) => (start, error),
                ErrMode::Incomplete(_) => (start, ContextError::new()),
            };
            let label = error.context().find_map(|context| match context {
                StrContext::Label(label) => Some(*label),
                _ => None,
            });
            Err(ErrMode::Backtrack(Cause::new(
                at,
                Reason::InvalidNumber(label),
            )))
        }
    }
}

fn number(input: &mut &str) -> IResult<Tree> {
    let sign = opt(sign).parse_next(input)?;
    let (base, literal) = alt((infinity, hexadecimal, octal, binary, decimal)).parse_next(input)?;

    let mut fields = Fields::new();
    if let Some(sign) = sign {
        fields.insert("sign", Tree::leaf(sign));
    }
    fields.insert(base, literal);
    Ok(Tree::Node(fields))
}

fn sign(input: &mut &str) -> IResult<char> {
    one_of(['-', '+']).parse_next(input)
}

fn infinity(input: &mut &str) -> IResult<(&'static str, Tree)> {
    alt((
        take_while(8..=8, |c: char| c.is_ascii_alphabetic())
            .verify(|word: &str| word.eq_ignore_ascii_case("infinity")),
        literal("∞"),
        literal("♾"),
    ))
    .map(|text: &str| ("infinity", Tree::leaf(text)))
    .parse_next(input)
}

fn hexadecimal(input: &mut &str) -> IResult<(&'static str, Tree)> {
    prefixed("0x", "hexadecimal digits", |c| c.is_ascii_hexdigit())
        .map(|digits| ("base_16", Tree::leaf(digits)))
        .parse_next(input)
}

fn octal(input: &mut &str) -> IResult<(&'static str, Tree)> {
    prefixed("0o", "octal digits", |c| matches!(c, '0'..='7'))
        .map(|digits| ("base_8", Tree::leaf(digits)))
        .parse_next(input)
}

fn binary(input: &mut &str) -> IResult<(&'static str, Tree)> {
    prefixed("0b", "binary digits", |c| matches!(c, '0' | '1'))
        .map(|digits| ("base_2", Tree::leaf(digits)))
        .parse_next(input)
}

/// A base prefix followed by at least one digit. Once the prefix matched the
/// digits are mandatory.
fn prefixed<'s>(
    prefix: &'static str,
    label: &'static str,
    digit: fn(char) -> bool,
) -> impl FnMut(&mut &'s str) -> IResult<&'s str> {
    move |input: &mut &'s str| {
        preceded(
            prefix,
            cut_err(take_while(1.., digit).context(StrContext::Label(label))),
        )
        .parse_next(input)
    }
}

fn decimal(input: &mut &str) -> IResult<(&'static str, Tree)> {
    base_10.map(|tree| ("base_10", tree)).parse_next(input)
}

fn base_10(input: &mut &str) -> IResult<Tree> {
    let whole = grouped_digits(input, &[',', ' '])?;
    let decimal = opt(preceded('.', fraction)).parse_next(input)?;
    let exponent = opt(preceded(one_of(['e', 'E']), exponent)).parse_next(input)?;

    let mut fields = Fields::new();
    fields.insert("whole", Tree::leaf(whole));
    if let Some(decimal) = decimal {
        fields.insert("decimal", Tree::leaf(decimal));
    }
    if let Some(exponent) = exponent {
        fields.insert("exponent", exponent);
    }
    Ok(Tree::Node(fields))
}

fn fraction(input: &mut &str) -> IResult<String> {
    grouped_digits(input, &[' '])
}

fn exponent(input: &mut &str) -> IResult<Tree> {
    let sign = opt(sign).parse_next(input)?;
    let value = base_10(input)?;

    let mut fields = Fields::new();
    if let Some(sign) = sign {
        fields.insert("sign", Tree::leaf(sign));
    }
    fields.insert("base_10", value);
    Ok(Tree::Node(fields))
}

/// Digits with grouping separators removed.
fn grouped_digits(input: &mut &str, thousands: &[char]) -> IResult<String> {
    let mut collected = digits(input)?.to_owned();
    while let Some(group) = opt(alt((
        preceded('_', digits),
        preceded(one_of(|c: char| thousands.contains(&c)), digit_group),
    )))
    .parse_next(input)?
    {
        collected.push_str(group);
    }
    Ok(collected)
}

fn digits<'s>(input: &mut &'s str) -> IResult<&'s str> {
    digit1.context(StrContext::Label("digits")).parse_next(input)
}

/// Exactly three digits not followed by a fourth.
fn digit_group<'s>(input: &mut &'s str) -> IResult<&'s str> {
    terminated(
        take_while(3..=3, |c: char| c.is_ascii_digit()),
        peek(not(one_of(|c: char| c.is_ascii_digit()))),
    )
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn parse_json(source: &str) -> Value {
        let tree = parse_number(source)
            .unwrap_or_else(|err| panic!("failed to parse {source:?}: {}", err.report(true)));
        serde_json::to_value(&tree).unwrap()
    }

    #[test]
    fn test_zero() {
        assert_eq!(parse_json("0"), json!({"base_10": {"whole": "0"}}));
    }

    #[test]
    fn test_grouping_separators_are_dropped() {
        let expected = json!({"base_10": {"whole": "12345678"}});
        assert_eq!(parse_json("12345678"), expected);
        assert_eq!(parse_json("12 345 678"), expected);
        assert_eq!(parse_json("12,345,678"), expected);
        assert_eq!(parse_json("12_345_678"), expected);
        assert_eq!(parse_json("1_2345_678"), expected);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(
            parse_json("12.34"),
            json!({"base_10": {"whole": "12", "decimal": "34"}})
        );
        assert_eq!(
            parse_json("0.000 001"),
            json!({"base_10": {"whole": "0", "decimal": "000001"}})
        );
    }

    #[test]
    fn test_exponent() {
        assert_eq!(
            parse_json("1e10"),
            json!({"base_10": {"whole": "1", "exponent": {"base_10": {"whole": "10"}}}})
        );
        assert_eq!(
            parse_json("2.5E-3"),
            json!({"base_10": {
                "whole": "2",
                "decimal": "5",
                "exponent": {"sign": "-", "base_10": {"whole": "3"}},
            }})
        );
    }

    #[test]
    fn test_sign() {
        assert_eq!(
            parse_json("-20"),
            json!({"sign": "-", "base_10": {"whole": "20"}})
        );
        assert_eq!(
            parse_json("+7"),
            json!({"sign": "+", "base_10": {"whole": "7"}})
        );
    }

    #[test]
    fn test_other_bases() {
        assert_eq!(parse_json("0xFF"), json!({"base_16": "FF"}));
        assert_eq!(parse_json("0xdeadBEEF"), json!({"base_16": "deadBEEF"}));
        assert_eq!(parse_json("0o17"), json!({"base_8": "17"}));
        assert_eq!(parse_json("0b10"), json!({"base_2": "10"}));
    }

    #[test]
    fn test_infinity() {
        assert_eq!(parse_json("Infinity"), json!({"infinity": "Infinity"}));
        assert_eq!(parse_json("infinity"), json!({"infinity": "infinity"}));
        assert_eq!(
            parse_json("-∞"),
            json!({"sign": "-", "infinity": "∞"})
        );
        assert_eq!(parse_json("♾"), json!({"infinity": "♾"}));
    }

    #[test]
    fn test_prefix_without_digits_is_rejected() {
        let err = parse_number("0xZZ").unwrap_err();
        assert_eq!(err.offset(), 2);
        assert_eq!(
            err.cause().reason(),
            &Reason::InvalidNumber(Some("hexadecimal digits"))
        );
    }

    #[test]
    fn test_digit_outside_base_leaves_input() {
        let err = parse_number("0o19").unwrap_err();
        assert_eq!(err.cause().reason(), &Reason::Leftover { found: Some('9') });
    }

    #[test]
    fn test_loose_separators_are_not_grouping() {
        // Neither a two-digit group nor a four-digit group is a thousands group.
        assert!(parse_number("1,23").is_err());
        assert!(parse_number("1 2345").is_err());
        assert!(parse_number("1__0").is_err());
    }

    #[test]
    fn test_not_a_number() {
        let err = parse_number("abc").unwrap_err();
        assert_eq!(err.cause().offset(), 0);
        assert!(matches!(err.cause().reason(), Reason::InvalidNumber(_)));
    }

    #[test]
    fn test_embedded_literal_stops_before_list_separator() {
        let source = "1, 2";
        let mut state = State::new(source, ParserConfig::default());
        let mut input = Input {
            input: source,
            state: &mut state,
        };
        let tree = literal_tree(&mut input).unwrap();
        assert_eq!(offset(&input), 1);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"base_10": {"whole": "1"}})
        );
    }

    #[test]
    fn test_missing_digits_stay_recoverable() {
        let source = "0b2";
        let mut state = State::new(source, ParserConfig::default());
        let mut input = Input {
            input: source,
            state: &mut state,
        };
        let Err(ErrMode::Backtrack(cause)) = literal_tree(&mut input) else {
            panic!("expected a recoverable failure");
        };
        assert_eq!(cause.offset(), 2);
        assert_eq!(offset(&input), 0);
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        /// Insert `separator` every three digits from the right.
        fn group(digits: &str, separator: char) -> String {
            let mut grouped = String::new();
            for (index, c) in digits.chars().enumerate() {
                if index > 0 && (digits.len() - index) % 3 == 0 {
                    grouped.push(separator);
                }
                grouped.push(c);
            }
            grouped
        }

        fn digit_string() -> impl Strategy<Value = String> {
            "[1-9][0-9]{0,11}"
        }

        fn check_grouping_is_transparent(digits: &str) -> Result<(), TestCaseError> {
            let plain = parse_json(digits);
            for separator in [',', ' ', '_'] {
                let grouped = group(digits, separator);
                prop_assert_eq!(&parse_json(&grouped), &plain, "grouped as {:?}", grouped);
            }
            prop_assert_eq!(&plain["base_10"]["whole"], &json!(digits));
            Ok(())
        }

        proptest! {
            #[test]
            fn grouping_is_transparent(digits in digit_string()) {
                check_grouping_is_transparent(&digits)?;
            }
        }
    }
}
