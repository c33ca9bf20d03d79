//! Template grammar.
//!
//! A template is literal text with embedded code blocks:
//!
//! ```text
//! Hello {user.name}, you have {count(messages)} new messages.
//! {if admin}{link_to("Admin", url: "/admin")}{end}
//! ```
//!
//! The grammar is a backtracking PEG written with winnow combinators: every
//! choice tries its alternatives in order and the first one that matches
//! wins. Ambiguous forms are settled by
//! that order alone; `{a: 1, b: 2}` is an implicit dictionary because
//! dictionaries are tried before lists, and `{1, 2}` is an implicit list
//! because a number does not swallow `, 2` as a digit group.
//!
//! Rules capture into a generic [`Tree`]; the AST is built from it by
//! [`build`](crate::build).

use std::{iter, mem};

use log::{debug, trace};
use winnow::{
    Parser,
    combinator::{alt, delimited, opt, preceded, repeat, separated, separated_pair, terminated},
    error::ErrMode,
    stream::Stream,
    token::{any, none_of},
};

use crate::{
    config::ParserConfig,
    error::{Cause, ParseError, Reason},
    input::{
        Input, PResult, State, at_least_one, choice, end_of_input, expected, fail, into_cause,
        memoized, peek, rule, spaces0, spaces1, tag, take_chars,
    },
    number,
    tree::{Fields, Tree},
};

/// Words that can never be names.
const RESERVED: [&str; 4] = ["define", "end", "if", "else"];

/// Whether `c` may appear in a name.
fn is_name_char(c: char) -> bool {
    !c.is_whitespace()
        && !matches!(
            c,
            '{' | '}' | '[' | ']' | '(' | ')' | ':' | ',' | '.' | '=' | '>'
        )
}

/// Quotes may appear inside a name but never start one, so `"a:b"` is a
/// string and not the key of a dictionary entry.
fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'')
}

/// The template grammar.
///
/// A `Grammar` is an immutable value; all parse state lives in the call to
/// [`Grammar::parse`], so one instance can be shared across threads.
///
/// # Example
///
/// ```
/// use brace_parser::{Grammar, ParserConfig};
///
/// let grammar = Grammar::new(ParserConfig::default());
/// let tree = grammar.parse("Hello {name}").unwrap();
/// let json = serde_json::to_value(&tree).unwrap();
/// assert_eq!(json[0]["text"], "Hello ");
/// assert_eq!(json[1]["code"][0]["call"]["name"], "name");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grammar {
    config: ParserConfig,
}

impl Grammar {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a whole template into a parse tree.
    ///
    /// The empty template parses to a single empty text node.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] carrying the failure tree when the source is
    /// not a valid template. When the nesting limit is exceeded the error's
    /// root cause is [`Reason::TooDeep`].
    pub fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        debug!(source_len = source.len(); "Parsing template");
        let mut state = State::new(source, self.config);
        let mut input = Input {
            input: source,
            state: &mut state,
        };
        let result = template(&mut input);

        let cause = match result {
            Ok(tree) => {
                trace!(tree:?; "Parse tree");
                return Ok(tree);
            }
            Err(ErrMode::Cut(cause)) => {
                debug!(offset = cause.offset(); "Nesting limit exceeded");
                cause
            }
            Err(err) => {
                let cause = into_cause(err, 0);
                match state.take_furthest() {
                    Some(furthest) if furthest.furthest() > cause.furthest() => {
                        cause.with_child(furthest)
                    }
                    _ => cause,
                }
            }
        };
        debug!(offset = cause.furthest(); "Template failed to parse");
        Err(ParseError::new(cause, source))
    }
}

fn text_node(text: impl Into<String>) -> Tree {
    Tree::tagged("text", Tree::leaf(text))
}

fn empty_text() -> Tree {
    text_node("")
}

fn prepend(first: Tree, rest: Vec<Tree>) -> Vec<Tree> {
    iter::once(first).chain(rest).collect()
}

fn template(input: &mut Input<'_>) -> PResult<Tree> {
    if input.input.is_empty() {
        return Ok(Tree::seq(vec![empty_text()]));
    }

    rule(
        "template",
        terminated(at_least_one("template node", template_node), end_of_input),
    )
    .map(Tree::seq)
    .parse_next(input)
}

fn template_node(input: &mut Input<'_>) -> PResult<Tree> {
    choice("template node", &["code", "text"], (code, text)).parse_next(input)
}

/// Literal text up to the next unescaped `{`.
fn text(input: &mut Input<'_>) -> PResult<Tree> {
    let value: String = repeat(0.., alt((none_of(['{', '\\']), escaped))).parse_next(input)?;
    if value.is_empty() {
        return expected(input, "text");
    }
    Ok(text_node(value))
}

/// A backslash and the character it escapes. A trailing backslash stands for
/// itself.
fn escaped(input: &mut Input<'_>) -> PResult<char> {
    preceded('\\', opt(any))
        .map(|escaped| escaped.unwrap_or('\\'))
        .parse_next(input)
}

fn code(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "code",
        delimited((tag("{"), spaces0), statements, (spaces0, tag("}"))),
    )
    .map(|statements| Tree::tagged("code", Tree::seq(statements)))
    .parse_next(input)
}

fn statements(input: &mut Input<'_>) -> PResult<Vec<Tree>> {
    let first = statement(input)?;
    let rest: Vec<Tree> = repeat(0.., preceded(spaces0, statement)).parse_next(input)?;
    Ok(prepend(first, rest))
}

fn statement(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "statement",
        &["define", "if", "value statement"],
        (define, if_statement, value_statement),
    )
    .parse_next(input)
}

fn value_statement(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "value statement",
        &["implicit dictionary", "implicit list", "value"],
        (implicit_dictionary, implicit_list, value),
    )
    .parse_next(input)
}

/// A keyword that is not the start of a longer name.
fn keyword<'i>(word: &'static str) -> impl Parser<Input<'i>, (), ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        let start = input.checkpoint();
        tag(word).parse_next(input)?;
        if peek(input).is_some_and(is_name_char) {
            input.reset(&start);
            return fail(input, Reason::Keyword(word));
        }
        Ok(())
    }
}

/// Name characters, not starting with a quote.
fn name_text<'i>(input: &mut Input<'i>) -> PResult<&'i str> {
    if peek(input).is_some_and(is_quote) {
        return expected(input, "name");
    }
    let name = take_chars(input, is_name_char);
    if name.is_empty() {
        return expected(input, "name");
    }
    Ok(name)
}

fn name(input: &mut Input<'_>) -> PResult<Tree> {
    let start = input.checkpoint();
    let name = name_text(input)?;
    if let Some(&word) = RESERVED.iter().find(|word| **word == name) {
        input.reset(&start);
        return fail(input, Reason::Reserved(word));
    }
    Ok(Tree::leaf(name))
}

fn comma(input: &mut Input<'_>) -> PResult<()> {
    (spaces0, tag(","), spaces0).void().parse_next(input)
}

/// Comma separated items between `open` and `close`, with optional
/// surrounding whitespace and an optional trailing comma after the last item.
fn bracketed<'i>(
    open: &'static str,
    item: impl Parser<Input<'i>, Tree, ErrMode<Cause>>,
    close: &'static str,
) -> impl Parser<Input<'i>, Vec<Tree>, ErrMode<Cause>> {
    delimited(
        (tag(open), spaces0),
        opt(terminated(separated(1.., item, comma), opt(comma))).map(Option::unwrap_or_default),
        (spaces0, tag(close)),
    )
}

fn define(input: &mut Input<'_>) -> PResult<Tree> {
    rule("define", |input: &mut Input<'_>| {
        (keyword("define"), spaces1).parse_next(input)?;

        let mut fields = Fields::new();
        fields.insert("name", name(input)?);
        if let Some(parameters) = opt(parameters).parse_next(input)? {
            fields.insert("parameters", parameters);
        }
        if let Some(body) = opt(body).parse_next(input)? {
            fields.insert("body", body);
        }
        (spaces0, keyword("end")).parse_next(input)?;
        Ok(Tree::tagged("define", Tree::Node(fields)))
    })
    .parse_next(input)
}

fn parameters(input: &mut Input<'_>) -> PResult<Tree> {
    rule("parameters", bracketed("(", parameter, ")"))
        .map(Tree::seq)
        .parse_next(input)
}

fn parameter(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "parameter",
        &["keyword parameter", "positional parameter"],
        (keyword_parameter, positional_parameter),
    )
    .parse_next(input)
}

fn keyword_parameter(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "keyword parameter",
        separated_pair(name, (tag(":"), spaces0), value),
    )
    .map(|(name, default)| {
        Tree::tagged(
            "keyword",
            Tree::node([("name", name), ("default", default)]),
        )
    })
    .parse_next(input)
}

fn positional_parameter(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "positional parameter",
        (name, opt(preceded((spaces0, tag("="), spaces0), value))),
    )
    .map(|(name, default)| {
        let mut fields = Fields::new();
        fields.insert("name", name);
        if let Some(default) = default {
            fields.insert("default", default);
        }
        Tree::tagged("positional", Tree::Node(fields))
    })
    .parse_next(input)
}

fn body(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "body",
        &["brace body", "inline body"],
        (brace_body, inline_body),
    )
    .parse_next(input)
}

/// `}` template `{`: the body is ordinary template text between the closing
/// brace of the opening block and the opening brace of the next one.
fn brace_body(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "brace body",
        delimited(
            (spaces0, tag("}")),
            repeat(0.., template_node),
            (tag("{"), spaces0),
        ),
    )
    .map(|nodes: Vec<Tree>| {
        let nodes = if nodes.is_empty() {
            vec![empty_text()]
        } else {
            nodes
        };
        Tree::tagged("template", Tree::seq(nodes))
    })
    .parse_next(input)
}

fn inline_body(input: &mut Input<'_>) -> PResult<Tree> {
    rule("inline body", preceded(spaces1, statements))
        .map(|statements| Tree::tagged("statements", Tree::seq(statements)))
        .parse_next(input)
}

fn if_statement(input: &mut Input<'_>) -> PResult<Tree> {
    rule("if", |input: &mut Input<'_>| {
        (keyword("if"), spaces1).parse_next(input)?;

        let mut fields = Fields::new();
        fields.insert("condition", statement(input)?);
        fields.insert("body", body(input)?);
        let else_ifs: Vec<Tree> = repeat(0.., else_if).parse_next(input)?;
        if !else_ifs.is_empty() {
            fields.insert("else_if", Tree::seq(else_ifs));
        }
        if let Some(otherwise) = opt(else_clause).parse_next(input)? {
            fields.insert("else", otherwise);
        }
        (spaces0, keyword("end")).parse_next(input)?;
        Ok(Tree::tagged("if", Tree::Node(fields)))
    })
    .parse_next(input)
}

fn else_if(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "else if",
        preceded(
            (spaces0, keyword("else"), spaces1, keyword("if"), spaces1),
            (statement, body),
        ),
    )
    .map(|(condition, body)| Tree::node([("condition", condition), ("body", body)]))
    .parse_next(input)
}

fn else_clause(input: &mut Input<'_>) -> PResult<Tree> {
    rule("else", preceded((spaces0, keyword("else")), body)).parse_next(input)
}

fn value(input: &mut Input<'_>) -> PResult<Tree> {
    memoized("value", value_choice).parse_next(input)
}

fn value_choice(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "value",
        &[
            "dictionary",
            "list",
            "nothing",
            "boolean",
            "number",
            "string",
            "call",
        ],
        (dictionary, list, nothing, boolean, number, string, call),
    )
    .parse_next(input)
}

fn dictionary(input: &mut Input<'_>) -> PResult<Tree> {
    rule("dictionary", bracketed("{", entry, "}"))
        .map(|entries| Tree::tagged("dictionary", Tree::seq(entries)))
        .parse_next(input)
}

fn implicit_dictionary(input: &mut Input<'_>) -> PResult<Tree> {
    rule("implicit dictionary", separated(1.., entry, comma))
        .map(|entries: Vec<Tree>| Tree::tagged("dictionary", Tree::seq(entries)))
        .parse_next(input)
}

fn entry(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "entry",
        &["short entry", "long entry"],
        (short_entry, long_entry),
    )
    .parse_next(input)
}

/// `name: value`
fn short_entry(input: &mut Input<'_>) -> PResult<Tree> {
    rule("short entry", separated_pair(name, (tag(":"), spaces0), value))
        .map(|(key, value)| Tree::node([("short_key", key), ("value", value)]))
        .parse_next(input)
}

/// `value: value` or `value => value`
fn long_entry(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "long entry",
        separated_pair(value, (spaces0, key_separator, spaces0), value),
    )
    .map(|(key, value)| Tree::node([("long_key", key), ("value", value)]))
    .parse_next(input)
}

fn key_separator(input: &mut Input<'_>) -> PResult<()> {
    choice("key separator", &[":", "=>"], (tag(":"), tag("=>"))).parse_next(input)
}

fn list(input: &mut Input<'_>) -> PResult<Tree> {
    rule("list", bracketed("[", element, "]"))
        .map(|elements| Tree::tagged("list", Tree::seq(elements)))
        .parse_next(input)
}

fn implicit_list(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "implicit list",
        separated_pair(element, comma, separated(1.., element, comma)),
    )
    .map(|(first, rest): (Tree, Vec<Tree>)| {
        Tree::tagged("list", Tree::seq(prepend(first, rest)))
    })
    .parse_next(input)
}

fn element(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "element",
        &["implicit dictionary", "value"],
        (implicit_dictionary, value),
    )
    .parse_next(input)
}

fn nothing(input: &mut Input<'_>) -> PResult<Tree> {
    keyword("nothing")
        .map(|()| Tree::tagged("nothing", Tree::leaf("nothing")))
        .parse_next(input)
}

fn boolean(input: &mut Input<'_>) -> PResult<Tree> {
    for word in ["true", "false"] {
        if opt(keyword(word)).parse_next(input)?.is_some() {
            return Ok(Tree::tagged("boolean", Tree::leaf(word)));
        }
    }
    expected(input, "boolean")
}

fn number(input: &mut Input<'_>) -> PResult<Tree> {
    rule("number", terminated(number::literal_tree, no_name_char))
        .map(|literal| Tree::tagged("number", literal))
        .parse_next(input)
}

/// Negative lookahead: a number may not run into a name.
fn no_name_char(input: &mut Input<'_>) -> PResult<()> {
    match peek(input) {
        Some(c) if is_name_char(c) => fail(input, Reason::Unexpected("a name character")),
        _ => Ok(()),
    }
}

fn string(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "string",
        &["double quoted string", "single quoted string", "symbol"],
        (double_quoted, single_quoted, symbol),
    )
    .parse_next(input)
}

fn double_quoted(input: &mut Input<'_>) -> PResult<Tree> {
    rule("double quoted string", quoted("\"")).parse_next(input)
}

fn single_quoted(input: &mut Input<'_>) -> PResult<Tree> {
    rule("single quoted string", quoted("'")).parse_next(input)
}

/// String contents between two `quote`s.
///
/// `\n` and `\t` are kept as written; any other escaped character stands for
/// itself. An unescaped `{` starts an interpolated code block.
fn quoted<'i>(quote: &'static str) -> impl Parser<Input<'i>, Tree, ErrMode<Cause>> {
    move |input: &mut Input<'i>| {
        tag(quote).parse_next(input)?;

        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            text.push_str(take_chars(input, |c| {
                c != '\\' && c != '{' && !quote.starts_with(c)
            }));
            match peek(input) {
                Some('\\') => {
                    let c = escaped(input)?;
                    if matches!(c, 'n' | 't') {
                        text.push('\\');
                    }
                    text.push(c);
                }
                Some('{') => {
                    if !text.is_empty() {
                        parts.push(text_node(mem::take(&mut text)));
                    }
                    parts.push(code(input)?);
                }
                _ => break,
            }
        }
        if !text.is_empty() {
            parts.push(text_node(text));
        }

        tag(quote).parse_next(input)?;
        Ok(Tree::tagged("string", Tree::seq(parts)))
    }
}

/// `:name`, shorthand for a string without interpolation.
fn symbol(input: &mut Input<'_>) -> PResult<Tree> {
    rule("symbol", preceded(tag(":"), name_text))
        .map(|name| Tree::tagged("string", Tree::seq(vec![text_node(name)])))
        .parse_next(input)
}

fn call(input: &mut Input<'_>) -> PResult<Tree> {
    call_fields
        .map(|fields| Tree::tagged("call", fields))
        .parse_next(input)
}

/// `name(arguments).name(arguments)...`, captured right-recursively.
fn call_fields(input: &mut Input<'_>) -> PResult<Tree> {
    rule(
        "call",
        (name, opt(arguments), opt(preceded(tag("."), call_fields))),
    )
    .map(|(name, arguments, chained)| {
        let mut fields = Fields::new();
        fields.insert("name", name);
        if let Some(arguments) = arguments {
            fields.insert("arguments", arguments);
        }
        if let Some(chained) = chained {
            fields.insert("operator", Tree::leaf("."));
            fields.insert("call", chained);
        }
        Tree::Node(fields)
    })
    .parse_next(input)
}

fn arguments(input: &mut Input<'_>) -> PResult<Tree> {
    rule("arguments", bracketed("(", argument, ")"))
        .map(Tree::seq)
        .parse_next(input)
}

fn argument(input: &mut Input<'_>) -> PResult<Tree> {
    choice(
        "argument",
        &["implicit dictionary", "value"],
        (implicit_dictionary, value),
    )
    .parse_next(input)
}

/// Parse a template with the default configuration.
///
/// # Errors
///
/// See [`Grammar::parse`].
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    Grammar::default().parse(source)
}
