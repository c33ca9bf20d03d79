//! Serialisable dump of the AST.
//!
//! [`ToStructure`] maps every AST node onto a small [`Structure`] value that
//! serialises to JSON, TOML or any other `serde` format. Conventions:
//!
//! - structs become maps keyed by field name, in declaration order;
//! - absent optional fields are omitted;
//! - an enum in any position becomes a single-key map naming its variant,
//!   e.g. `{"call": {...}}`;
//! - wrappers around a single sequence (templates, code blocks, strings,
//!   lists and dictionaries) dump as that sequence;
//! - names, operators and digits dump as strings.
//!
//! Every implementation destructures its node, so adding a field to an AST
//! type fails to compile until the dump handles it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{
    Alternative, Base, Body, Call, Chain, Code, Define, Dictionary, Entry, If, Key, List,
    Literal, Name, Node, Number, Operator, Parameter, Sign, Statement, StringLiteral, Template,
    Text, Value,
};

/// A dumped AST node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Structure {
    String(String),
    List(Vec<Structure>),
    Map(IndexMap<&'static str, Structure>),
}

impl Structure {
    fn leaf(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    fn tagged(tag: &'static str, value: Structure) -> Self {
        Self::Map(IndexMap::from([(tag, value)]))
    }

    fn list<T: ToStructure>(items: &[T]) -> Self {
        Self::List(items.iter().map(ToStructure::to_structure).collect())
    }
}

/// Builder for a struct dump with optional fields.
#[derive(Default)]
struct MapBuilder(IndexMap<&'static str, Structure>);

impl MapBuilder {
    fn field(mut self, key: &'static str, value: &impl ToStructure) -> Self {
        self.0.insert(key, value.to_structure());
        self
    }

    fn optional<T: ToStructure>(mut self, key: &'static str, value: Option<&T>) -> Self {
        if let Some(value) = value {
            self.0.insert(key, value.to_structure());
        }
        self
    }

    fn build(self) -> Structure {
        Structure::Map(self.0)
    }
}

/// Conversion of an AST node into its [`Structure`] dump.
pub trait ToStructure {
    fn to_structure(&self) -> Structure;
}

impl<T: ToStructure> ToStructure for Vec<T> {
    fn to_structure(&self) -> Structure {
        Structure::list(self)
    }
}

impl<T: ToStructure> ToStructure for Box<T> {
    fn to_structure(&self) -> Structure {
        T::to_structure(self)
    }
}

impl ToStructure for String {
    fn to_structure(&self) -> Structure {
        Structure::leaf(self.as_str())
    }
}

impl ToStructure for Template {
    fn to_structure(&self) -> Structure {
        let Self { children } = self;
        Structure::list(children)
    }
}

impl ToStructure for Node {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Text(text) => Structure::tagged("text", text.to_structure()),
            Self::Code(code) => Structure::tagged("code", code.to_structure()),
        }
    }
}

impl ToStructure for Text {
    fn to_structure(&self) -> Structure {
        let Self { value } = self;
        value.to_structure()
    }
}

impl ToStructure for Code {
    fn to_structure(&self) -> Structure {
        let Self { statements } = self;
        Structure::list(statements)
    }
}

impl ToStructure for Statement {
    fn to_structure(&self) -> Structure {
        match self {
            Self::If(statement) => Structure::tagged("if", statement.to_structure()),
            Self::Define(define) => Structure::tagged("define", define.to_structure()),
            Self::Value(value) => value.to_structure(),
        }
    }
}

impl ToStructure for If {
    fn to_structure(&self) -> Structure {
        let Self {
            condition,
            body,
            alternative,
        } = self;
        MapBuilder::default()
            .field("condition", condition)
            .field("body", body)
            .optional("alternative", alternative.as_ref())
            .build()
    }
}

impl ToStructure for Alternative {
    fn to_structure(&self) -> Structure {
        match self {
            Self::ElseIf(statement) => Structure::tagged("else_if", statement.to_structure()),
            Self::Else(body) => Structure::tagged("else", body.to_structure()),
        }
    }
}

impl ToStructure for Define {
    fn to_structure(&self) -> Structure {
        let Self {
            name,
            parameters,
            body,
        } = self;
        MapBuilder::default()
            .field("name", name)
            .optional("parameters", parameters.as_ref())
            .optional("body", body.as_ref())
            .build()
    }
}

impl ToStructure for Parameter {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Positional { name, default } => Structure::tagged(
                "positional",
                MapBuilder::default()
                    .field("name", name)
                    .optional("default", default.as_ref())
                    .build(),
            ),
            Self::Keyword { name, default } => Structure::tagged(
                "keyword",
                MapBuilder::default()
                    .field("name", name)
                    .field("default", default)
                    .build(),
            ),
        }
    }
}

impl ToStructure for Body {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Inline(statements) => Structure::tagged("inline", Structure::list(statements)),
            Self::Template(template) => Structure::tagged("template", template.to_structure()),
        }
    }
}

impl ToStructure for Value {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Call(call) => Structure::tagged("call", call.to_structure()),
            Self::String(string) => Structure::tagged("string", string.to_structure()),
            Self::Number(number) => Structure::tagged("number", number.to_structure()),
            Self::Boolean(value) => {
                Structure::tagged("boolean", Structure::leaf(value.to_string()))
            }
            Self::Nothing => Structure::tagged("nothing", Structure::leaf("nothing")),
            Self::List(list) => Structure::tagged("list", list.to_structure()),
            Self::Dictionary(dictionary) => {
                Structure::tagged("dictionary", dictionary.to_structure())
            }
        }
    }
}

impl ToStructure for Name {
    fn to_structure(&self) -> Structure {
        Structure::leaf(self.as_str())
    }
}

impl ToStructure for Operator {
    fn to_structure(&self) -> Structure {
        Structure::leaf(self.as_str())
    }
}

impl ToStructure for Call {
    fn to_structure(&self) -> Structure {
        let Self {
            name,
            arguments,
            chain,
        } = self;
        MapBuilder::default()
            .field("name", name)
            .optional("arguments", arguments.as_ref())
            .optional("chain", chain.as_ref())
            .build()
    }
}

impl ToStructure for Chain {
    fn to_structure(&self) -> Structure {
        let Self { operator, call } = self;
        MapBuilder::default()
            .field("operator", operator)
            .field("call", call)
            .build()
    }
}

impl ToStructure for StringLiteral {
    fn to_structure(&self) -> Structure {
        let Self { parts } = self;
        Structure::list(parts)
    }
}

impl ToStructure for Sign {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Plus => Structure::leaf("+"),
            Self::Minus => Structure::leaf("-"),
        }
    }
}

impl ToStructure for Base {
    fn to_structure(&self) -> Structure {
        let name = match self {
            Self::Decimal => "decimal",
            Self::Hexadecimal => "hexadecimal",
            Self::Octal => "octal",
            Self::Binary => "binary",
        };
        Structure::leaf(name)
    }
}

impl ToStructure for Number {
    fn to_structure(&self) -> Structure {
        let Self { sign, literal } = self;
        MapBuilder::default()
            .optional("sign", sign.as_ref())
            .field("literal", literal)
            .build()
    }
}

impl ToStructure for Literal {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Infinity => Structure::tagged("infinity", Structure::leaf("infinity")),
            Self::Decimal {
                whole,
                fraction,
                exponent,
            } => Structure::tagged(
                "decimal",
                MapBuilder::default()
                    .field("whole", whole)
                    .optional("fraction", fraction.as_ref())
                    .optional("exponent", exponent.as_ref())
                    .build(),
            ),
            Self::Radix { base, digits } => Structure::tagged(
                "radix",
                MapBuilder::default()
                    .field("base", base)
                    .field("digits", digits)
                    .build(),
            ),
        }
    }
}

impl ToStructure for List {
    fn to_structure(&self) -> Structure {
        let Self { elements } = self;
        Structure::list(elements)
    }
}

impl ToStructure for Dictionary {
    fn to_structure(&self) -> Structure {
        let Self { entries } = self;
        Structure::list(entries)
    }
}

impl ToStructure for Entry {
    fn to_structure(&self) -> Structure {
        let Self { key, value } = self;
        MapBuilder::default()
            .field("key", key)
            .field("value", value)
            .build()
    }
}

impl ToStructure for Key {
    fn to_structure(&self) -> Structure {
        match self {
            Self::Short(name) => Structure::tagged("short", name.to_structure()),
            Self::Long(value) => Structure::tagged("long", value.to_structure()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value as Json, json};

    use super::*;
    use crate::{build, grammar};

    fn dump(source: &str) -> Json {
        let template = build(grammar::parse(source).unwrap()).unwrap();
        serde_json::to_value(template.to_structure()).unwrap()
    }

    #[test]
    fn test_text_and_call() {
        assert_eq!(
            dump("Hi {name}"),
            json!([
                {"text": "Hi "},
                {"code": [{"call": {"name": "name"}}]},
            ])
        );
    }

    #[test]
    fn test_chain() {
        assert_eq!(
            dump("{name.split(\" \", 2)}"),
            json!([{"code": [{"call": {
                "name": "name",
                "chain": {
                    "operator": ".",
                    "call": {
                        "name": "split",
                        "arguments": [
                            {"string": [{"text": " "}]},
                            {"number": {"literal": {"decimal": {"whole": "2"}}}},
                        ],
                    },
                },
            }}]}])
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            dump("{-0xFF}")[0]["code"][0],
            json!({"number": {
                "sign": "-",
                "literal": {"radix": {"base": "hexadecimal", "digits": "FF"}},
            }})
        );
        assert_eq!(
            dump("{1.5e-3}")[0]["code"][0],
            json!({"number": {"literal": {"decimal": {
                "whole": "1",
                "fraction": "5",
                "exponent": {"sign": "-", "literal": {"decimal": {"whole": "3"}}},
            }}}})
        );
        assert_eq!(
            dump("{infinity}")[0]["code"][0],
            json!({"number": {"literal": {"infinity": "infinity"}}})
        );
    }

    #[test]
    fn test_if_alternatives() {
        assert_eq!(
            dump("{if a}A{else}B{end}")[0]["code"][0],
            json!({"if": {
                "condition": {"call": {"name": "a"}},
                "body": {"template": [{"text": "A"}]},
                "alternative": {"else": {"template": [{"text": "B"}]}},
            }})
        );
    }

    #[test]
    fn test_define_and_collections() {
        assert_eq!(
            dump("{define f(a, b: nothing) [true, {k: :v}] end}")[0]["code"][0],
            json!({"define": {
                "name": "f",
                "parameters": [
                    {"positional": {"name": "a"}},
                    {"keyword": {"name": "b", "default": {"nothing": "nothing"}}},
                ],
                "body": {"inline": [{"list": [
                    {"boolean": "true"},
                    {"dictionary": [{
                        "key": {"short": "k"},
                        "value": {"string": [{"text": "v"}]},
                    }]},
                ]}]},
            }})
        );
    }
}
