//! Typed syntax tree.
//!
//! Produced by [`build`](crate::build) from a parse tree. Nodes are plain
//! immutable data; consumers walk them by matching on the enums.

use std::fmt;

/// A parsed template: literal text interleaved with code blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub children: Vec<Node>,
}

impl Template {
    /// Kind names of the top-level children, in order.
    pub fn node_names(&self) -> Vec<&'static str> {
        self.children.iter().map(Node::kind).collect()
    }
}

/// A piece of a template or of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(Text),
    Code(Code),
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Code(_) => "Code",
        }
    }
}

/// Literal text, with escapes already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub value: String,
}

/// A `{...}` block holding one or more statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    If(If),
    Define(Define),
    Value(Value),
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::If(_) => "If",
            Self::Define(_) => "Define",
            Self::Value(value) => value.kind(),
        }
    }
}

/// `if condition body (else if condition body)* (else body)? end`
///
/// Else-if clauses form a right-recursive chain through `alternative`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: Box<Statement>,
    pub body: Body,
    pub alternative: Option<Box<Alternative>>,
}

/// What runs when an `if` condition does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternative {
    ElseIf(If),
    Else(Body),
}

/// `define name(parameters) body end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: Name,
    pub parameters: Option<Vec<Parameter>>,
    pub body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// `name` or `name = default`
    Positional { name: Name, default: Option<Value> },
    /// `name: default`
    Keyword { name: Name, default: Value },
}

impl Parameter {
    pub fn name(&self) -> &Name {
        match self {
            Self::Positional { name, .. } | Self::Keyword { name, .. } => name,
        }
    }

    pub fn default(&self) -> Option<&Value> {
        match self {
            Self::Positional { default, .. } => default.as_ref(),
            Self::Keyword { default, .. } => Some(default),
        }
    }
}

/// The body of an `if` branch or a `define`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Statements written inside the same block, up to `else` or `end`.
    Inline(Vec<Statement>),
    /// Template text between `}` and the next `{`.
    Template(Template),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Call(Call),
    String(StringLiteral),
    Number(Number),
    Boolean(bool),
    Nothing,
    List(List),
    Dictionary(Dictionary),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Call(_) => "Call",
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Boolean(_) => "Boolean",
            Self::Nothing => "Nothing",
            Self::List(_) => "List",
            Self::Dictionary(_) => "Dictionary",
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The operator joining a call to the one chained after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(pub String);

impl Operator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `name(arguments)`, optionally followed by `.` and another call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: Name,
    pub arguments: Option<Vec<Value>>,
    pub chain: Option<Chain>,
}

impl Call {
    /// Names along the chain: `user.name.upcase` gives `["user", "name", "upcase"]`.
    pub fn path(&self) -> Vec<&str> {
        let mut path = vec![self.name.as_str()];
        let mut current = self;
        while let Some(chain) = &current.chain {
            current = &chain.call;
            path.push(current.name.as_str());
        }
        path
    }

    /// A call of a plain name: no arguments and nothing chained.
    pub fn is_bare(&self) -> bool {
        self.arguments.is_none() && self.chain.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub operator: Operator,
    pub call: Box<Call>,
}

/// A quoted string; `{...}` inside it is interpolated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub parts: Vec<Node>,
}

impl StringLiteral {
    /// The string's value when it has no interpolation.
    pub fn as_literal(&self) -> Option<String> {
        self.parts
            .iter()
            .map(|part| match part {
                Node::Text(text) => Some(text.value.as_str()),
                Node::Code(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// Numeric base of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Decimal,
    Hexadecimal,
    Octal,
    Binary,
}

impl Base {
    pub fn radix(self) -> u32 {
        match self {
            Self::Decimal => 10,
            Self::Hexadecimal => 16,
            Self::Octal => 8,
            Self::Binary => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    pub sign: Option<Sign>,
    pub literal: Literal,
}

/// The digits of a number, grouping separators removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Infinity,
    Decimal {
        whole: String,
        fraction: Option<String>,
        exponent: Option<Box<Number>>,
    },
    Radix { base: Base, digits: String },
}

impl Number {
    /// Base of the literal; `None` for infinity.
    pub fn base(&self) -> Option<Base> {
        match &self.literal {
            Literal::Infinity => None,
            Literal::Decimal { .. } => Some(Base::Decimal),
            Literal::Radix { base, .. } => Some(*base),
        }
    }

    /// Approximate value as a float.
    ///
    /// Integers beyond `f64` precision lose their low digits; nothing here
    /// ever fails, since the grammar only admits digits of the right base.
    pub fn to_f64(&self) -> f64 {
        let magnitude = match &self.literal {
            Literal::Infinity => f64::INFINITY,
            Literal::Decimal {
                whole,
                fraction,
                exponent,
            } => {
                let mut value = digits_to_f64(whole, 10);
                if let Some(fraction) = fraction {
                    let mut scale = 1.0;
                    for digit in fraction.chars().filter_map(|c| c.to_digit(10)) {
                        scale /= 10.0;
                        value += f64::from(digit) * scale;
                    }
                }
                if let Some(exponent) = exponent {
                    value *= 10f64.powf(exponent.to_f64());
                }
                value
            }
            Literal::Radix { base, digits } => digits_to_f64(digits, base.radix()),
        };

        match self.sign {
            Some(Sign::Minus) => -magnitude,
            _ => magnitude,
        }
    }
}

/// Canonical source form: grouping separators dropped, radix prefixes in
/// lower case, infinity spelled out.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Some(Sign::Plus) => f.write_str("+")?,
            Some(Sign::Minus) => f.write_str("-")?,
            None => {}
        }
        match &self.literal {
            Literal::Infinity => f.write_str("Infinity"),
            Literal::Decimal {
                whole,
                fraction,
                exponent,
            } => {
                f.write_str(whole)?;
                if let Some(fraction) = fraction {
                    write!(f, ".{fraction}")?;
                }
                if let Some(exponent) = exponent {
                    write!(f, "e{exponent}")?;
                }
                Ok(())
            }
            Literal::Radix { base, digits } => {
                let prefix = match base {
                    Base::Hexadecimal => "0x",
                    Base::Octal => "0o",
                    Base::Binary => "0b",
                    Base::Decimal => "",
                };
                write!(f, "{prefix}{digits}")
            }
        }
    }
}

fn digits_to_f64(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |value, digit| value * f64::from(radix) + f64::from(digit))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub elements: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
}

/// Dictionary key forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// `name: value`
    Short(Name),
    /// `value: value` or `value => value`
    Long(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, chain: Option<Call>) -> Call {
        Call {
            name: Name(name.to_owned()),
            arguments: None,
            chain: chain.map(|call| Chain {
                operator: Operator(".".to_owned()),
                call: Box::new(call),
            }),
        }
    }

    fn decimal(whole: &str, fraction: Option<&str>, exponent: Option<Number>) -> Number {
        Number {
            sign: None,
            literal: Literal::Decimal {
                whole: whole.to_owned(),
                fraction: fraction.map(str::to_owned),
                exponent: exponent.map(Box::new),
            },
        }
    }

    #[test]
    fn test_call_path() {
        let chained = call("user", Some(call("name", Some(call("upcase", None)))));
        assert_eq!(chained.path(), ["user", "name", "upcase"]);
        assert!(!chained.is_bare());
        assert!(call("user", None).is_bare());
    }

    #[test]
    fn test_number_values() {
        assert_eq!(decimal("12345", None, None).to_f64(), 12345.0);
        assert_eq!(decimal("12", Some("5"), None).to_f64(), 12.5);
        assert_eq!(
            decimal("1", None, Some(decimal("3", None, None))).to_f64(),
            1000.0
        );

        let hex = Number {
            sign: Some(Sign::Minus),
            literal: Literal::Radix {
                base: Base::Hexadecimal,
                digits: "FF".to_owned(),
            },
        };
        assert_eq!(hex.to_f64(), -255.0);
        assert_eq!(hex.base(), Some(Base::Hexadecimal));

        let infinity = Number {
            sign: None,
            literal: Literal::Infinity,
        };
        assert!(infinity.to_f64().is_infinite());
        assert_eq!(infinity.base(), None);
    }

    #[test]
    fn test_number_display() {
        let exponent = Number {
            sign: Some(Sign::Minus),
            literal: Literal::Decimal {
                whole: "3".to_owned(),
                fraction: None,
                exponent: None,
            },
        };
        let value = decimal("1234", Some("5"), Some(exponent));
        assert_eq!(value.to_string(), "1234.5e-3");

        let binary = Number {
            sign: Some(Sign::Plus),
            literal: Literal::Radix {
                base: Base::Binary,
                digits: "101".to_owned(),
            },
        };
        assert_eq!(binary.to_string(), "+0b101");
    }

    #[test]
    fn test_string_literal() {
        let plain = StringLiteral {
            parts: vec![
                Node::Text(Text {
                    value: "Hello ".to_owned(),
                }),
                Node::Text(Text {
                    value: "world".to_owned(),
                }),
            ],
        };
        assert_eq!(plain.as_literal().as_deref(), Some("Hello world"));

        let interpolated = StringLiteral {
            parts: vec![Node::Code(Code { statements: vec![] })],
        };
        assert_eq!(interpolated.as_literal(), None);

        let empty = StringLiteral { parts: vec![] };
        assert_eq!(empty.as_literal().as_deref(), Some(""));
    }

    #[test]
    fn test_kinds() {
        let template = Template {
            children: vec![
                Node::Text(Text {
                    value: "Hi ".to_owned(),
                }),
                Node::Code(Code {
                    statements: vec![Statement::Value(Value::Nothing)],
                }),
            ],
        };
        assert_eq!(template.node_names(), ["Text", "Code"]);
        assert_eq!(Statement::Value(Value::Boolean(true)).kind(), "Boolean");
    }
}
