//! AST builder.
//!
//! Turns the generic parse tree into the typed [`ast`](crate::ast). Each
//! keyed node is wrapped in a [`Fields`] reader: fields are removed as they
//! are read, and [`Fields::finish`] rejects anything the builder did not
//! consume. The builder trusts nothing about the tree's shape; a mismatch is
//! reported as a [`BuildError`] instead of a panic.

use log::{debug, trace};

use crate::{
    ast::{
        Alternative, Base, Body, Call, Chain, Code, Define, Dictionary, Entry, If, Key, List,
        Literal, Name, Node, Number, Operator, Parameter, Sign, Statement, StringLiteral,
        Template, Text, Value,
    },
    error::BuildError,
    tree::{self, Tree},
};

type Result<T> = std::result::Result<T, BuildError>;

/// Build a [`Template`] from a parse tree produced by the grammar.
///
/// # Errors
///
/// Returns a [`BuildError`] when the tree does not have the shape the grammar
/// produces. That always indicates a defect, not bad input.
pub fn build(tree: Tree) -> Result<Template> {
    debug!(kind = tree.kind(); "Building AST");
    let template = template(tree)?;
    trace!(template:?; "AST");
    Ok(template)
}

/// Reader over the fields of one keyed parse tree node.
struct Fields {
    node: &'static str,
    fields: tree::Fields,
}

impl Fields {
    fn new(node: &'static str, tree: Tree) -> Result<Self> {
        match tree {
            Tree::Node(fields) => Ok(Self { node, fields }),
            other => Err(unexpected(node, "node", &other)),
        }
    }

    fn take(&mut self, field: &'static str) -> Result<Tree> {
        self.take_opt(field).ok_or(BuildError::MissingField {
            node: self.node,
            field,
        })
    }

    fn take_opt(&mut self, field: &'static str) -> Option<Tree> {
        self.fields.shift_remove(field)
    }

    fn contains(&self, field: &'static str) -> bool {
        self.fields.contains_key(field)
    }

    /// Fail if any field was left unread.
    fn finish(self) -> Result<()> {
        if self.fields.is_empty() {
            return Ok(());
        }
        Err(BuildError::UnconsumedFields {
            node: self.node,
            fields: self.fields.keys().copied().collect(),
        })
    }
}

fn unexpected(node: &'static str, expected: &'static str, found: &Tree) -> BuildError {
    BuildError::UnexpectedKind {
        node,
        expected,
        found: found.kind(),
    }
}

/// Split a single-field node into its tag and payload.
fn untag(node: &'static str, tree: Tree) -> Result<(&'static str, Tree)> {
    match tree {
        Tree::Node(mut fields) if fields.len() == 1 => match fields.pop() {
            Some((tag, inner)) => Ok((tag, inner)),
            None => Err(BuildError::UnknownShape {
                node,
                fields: Vec::new(),
            }),
        },
        Tree::Node(fields) => Err(BuildError::UnknownShape {
            node,
            fields: fields.keys().copied().collect(),
        }),
        other => Err(unexpected(node, "node", &other)),
    }
}

fn leaf(node: &'static str, tree: Tree) -> Result<String> {
    match tree {
        Tree::Leaf(value) => Ok(value),
        other => Err(unexpected(node, "leaf", &other)),
    }
}

/// Build every item of a sequence with `item`.
fn sequence<T>(node: &'static str, tree: Tree, item: fn(Tree) -> Result<T>) -> Result<Vec<T>> {
    match tree {
        Tree::Seq(items) => items.into_iter().map(item).collect(),
        other => Err(unexpected(node, "sequence", &other)),
    }
}

fn template(tree: Tree) -> Result<Template> {
    Ok(Template {
        children: sequence("template", tree, node)?,
    })
}

fn node(tree: Tree) -> Result<Node> {
    match untag("template node", tree)? {
        ("text", value) => Ok(Node::Text(Text {
            value: leaf("text", value)?,
        })),
        ("code", statements) => Ok(Node::Code(Code {
            statements: sequence("code", statements, statement)?,
        })),
        (tag, _) => Err(unknown_tag("template node", tag)),
    }
}

fn invalid_leaf(node: &'static str, text: &str) -> BuildError {
    BuildError::InvalidLeaf {
        node,
        text: text.to_owned(),
    }
}

fn unknown_tag(node: &'static str, tag: &'static str) -> BuildError {
    BuildError::UnknownShape {
        node,
        fields: vec![tag],
    }
}

fn statement(tree: Tree) -> Result<Statement> {
    match untag("statement", tree)? {
        ("if", inner) => Ok(Statement::If(if_statement(inner)?)),
        ("define", inner) => Ok(Statement::Define(define(inner)?)),
        (tag, inner) => Ok(Statement::Value(tagged_value(tag, inner)?)),
    }
}

fn if_statement(tree: Tree) -> Result<If> {
    let mut fields = Fields::new("if", tree)?;
    let condition = statement(fields.take("condition")?)?;
    let then = body(fields.take("body")?)?;
    let else_ifs = match fields.take_opt("else_if") {
        Some(clauses) => sequence("else_if", clauses, else_if)?,
        None => Vec::new(),
    };
    let otherwise = fields.take_opt("else").map(body).transpose()?;
    fields.finish()?;

    // Fold right to left so each else-if owns everything after it.
    let alternative = else_ifs.into_iter().rev().fold(
        otherwise.map(|body| Box::new(Alternative::Else(body))),
        |alternative, (condition, body)| {
            Some(Box::new(Alternative::ElseIf(If {
                condition: Box::new(condition),
                body,
                alternative,
            })))
        },
    );

    Ok(If {
        condition: Box::new(condition),
        body: then,
        alternative,
    })
}

fn else_if(tree: Tree) -> Result<(Statement, Body)> {
    let mut fields = Fields::new("else_if", tree)?;
    let condition = statement(fields.take("condition")?)?;
    let then = body(fields.take("body")?)?;
    fields.finish()?;
    Ok((condition, then))
}

fn body(tree: Tree) -> Result<Body> {
    match untag("body", tree)? {
        ("template", inner) => Ok(Body::Template(template(inner)?)),
        ("statements", inner) => Ok(Body::Inline(sequence("body", inner, statement)?)),
        (tag, _) => Err(unknown_tag("body", tag)),
    }
}

fn define(tree: Tree) -> Result<Define> {
    let mut fields = Fields::new("define", tree)?;
    let name = name("define", fields.take("name")?)?;
    let parameters = fields
        .take_opt("parameters")
        .map(|parameters| sequence("parameters", parameters, parameter))
        .transpose()?;
    let body = fields.take_opt("body").map(body).transpose()?;
    fields.finish()?;
    Ok(Define {
        name,
        parameters,
        body,
    })
}

fn parameter(tree: Tree) -> Result<Parameter> {
    match untag("parameter", tree)? {
        ("keyword", inner) => {
            let mut fields = Fields::new("keyword", inner)?;
            let name = name("keyword", fields.take("name")?)?;
            let default = value(fields.take("default")?)?;
            fields.finish()?;
            Ok(Parameter::Keyword { name, default })
        }
        ("positional", inner) => {
            let mut fields = Fields::new("positional", inner)?;
            let name = name("positional", fields.take("name")?)?;
            let default = fields.take_opt("default").map(value).transpose()?;
            fields.finish()?;
            Ok(Parameter::Positional { name, default })
        }
        (tag, _) => Err(unknown_tag("parameter", tag)),
    }
}

fn name(node: &'static str, tree: Tree) -> Result<Name> {
    Ok(Name(leaf(node, tree)?))
}

fn value(tree: Tree) -> Result<Value> {
    let (tag, inner) = untag("value", tree)?;
    tagged_value(tag, inner)
}

fn tagged_value(tag: &'static str, inner: Tree) -> Result<Value> {
    match tag {
        "call" => Ok(Value::Call(call(inner)?)),
        "string" => Ok(Value::String(StringLiteral {
            parts: sequence("string", inner, node)?,
        })),
        "number" => Ok(Value::Number(number(inner)?)),
        "boolean" => match leaf("boolean", inner)?.as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            text => Err(invalid_leaf("boolean", text)),
        },
        "nothing" => match leaf("nothing", inner)?.as_str() {
            "nothing" => Ok(Value::Nothing),
            text => Err(invalid_leaf("nothing", text)),
        },
        "list" => Ok(Value::List(List {
            elements: sequence("list", inner, value)?,
        })),
        "dictionary" => Ok(Value::Dictionary(Dictionary {
            entries: sequence("dictionary", inner, entry)?,
        })),
        _ => Err(unknown_tag("value", tag)),
    }
}

fn call(tree: Tree) -> Result<Call> {
    let mut fields = Fields::new("call", tree)?;
    let name = name("call", fields.take("name")?)?;
    let arguments = fields
        .take_opt("arguments")
        .map(|arguments| sequence("arguments", arguments, value))
        .transpose()?;

    let chain = match (fields.take_opt("operator"), fields.take_opt("call")) {
        (Some(operator), Some(chained)) => Some(Chain {
            operator: Operator(leaf("operator", operator)?),
            call: Box::new(call(chained)?),
        }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(BuildError::MissingField {
                node: "call",
                field: "call",
            });
        }
        (None, Some(_)) => {
            return Err(BuildError::MissingField {
                node: "call",
                field: "operator",
            });
        }
    };
    fields.finish()?;

    Ok(Call {
        name,
        arguments,
        chain,
    })
}

fn entry(tree: Tree) -> Result<Entry> {
    let mut fields = Fields::new("entry", tree)?;
    let key = if fields.contains("short_key") {
        Key::Short(name("short_key", fields.take("short_key")?)?)
    } else if fields.contains("long_key") {
        Key::Long(value(fields.take("long_key")?)?)
    } else {
        return Err(BuildError::UnknownShape {
            node: "entry",
            fields: fields.fields.keys().copied().collect(),
        });
    };
    let value = value(fields.take("value")?)?;
    fields.finish()?;
    Ok(Entry { key, value })
}

fn number(tree: Tree) -> Result<Number> {
    let mut fields = Fields::new("number", tree)?;
    let sign = fields
        .take_opt("sign")
        .map(|sign| match leaf("sign", sign)?.as_str() {
            "-" => Ok(Sign::Minus),
            "+" => Ok(Sign::Plus),
            _ => Err(unknown_tag("sign", "sign")),
        })
        .transpose()?;

    let radix = [
        ("base_16", Base::Hexadecimal),
        ("base_8", Base::Octal),
        ("base_2", Base::Binary),
    ];
    let literal = if let Some(base_10) = fields.take_opt("base_10") {
        decimal(base_10)?
    } else if let Some(infinity) = fields.take_opt("infinity") {
        leaf("infinity", infinity)?;
        Literal::Infinity
    } else if let Some((field, base)) = radix
        .into_iter()
        .find(|(field, _)| fields.contains(*field))
    {
        Literal::Radix {
            base,
            digits: leaf(field, fields.take(field)?)?,
        }
    } else {
        return Err(BuildError::UnknownShape {
            node: "number",
            fields: fields.fields.keys().copied().collect(),
        });
    };
    fields.finish()?;

    Ok(Number { sign, literal })
}

fn decimal(tree: Tree) -> Result<Literal> {
    let mut fields = Fields::new("base_10", tree)?;
    let whole = leaf("whole", fields.take("whole")?)?;
    let fraction = fields
        .take_opt("decimal")
        .map(|fraction| leaf("decimal", fraction))
        .transpose()?;
    let exponent = fields
        .take_opt("exponent")
        .map(|exponent| number(exponent).map(Box::new))
        .transpose()?;
    fields.finish()?;

    Ok(Literal::Decimal {
        whole,
        fraction,
        exponent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    fn build_source(source: &str) -> Template {
        build(grammar::parse(source).unwrap()).unwrap()
    }

    fn single_statement(source: &str) -> Statement {
        let mut template = build_source(source);
        assert_eq!(template.children.len(), 1, "{source}");
        let Node::Code(mut code) = template.children.remove(0) else {
            panic!("expected code in {source}");
        };
        assert_eq!(code.statements.len(), 1, "{source}");
        code.statements.remove(0)
    }

    fn single_value(source: &str) -> Value {
        match single_statement(source) {
            Statement::Value(value) => value,
            other => panic!("expected value, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_template() {
        let template = build_source("");
        assert_eq!(
            template.children,
            [Node::Text(Text {
                value: String::new()
            })]
        );
    }

    #[test]
    fn test_text_and_code() {
        let template = build_source("Hello {name}!");
        assert_eq!(template.node_names(), ["Text", "Code", "Text"]);
    }

    #[test]
    fn test_call_chain() {
        let Value::Call(call) = single_value("{name.split(\" \", 2)}") else {
            panic!("expected call");
        };
        assert_eq!(call.path(), ["name", "split"]);
        assert!(call.arguments.is_none());

        let chain = call.chain.unwrap();
        assert_eq!(chain.operator.as_str(), ".");
        let arguments = chain.call.arguments.unwrap();
        assert_eq!(arguments.len(), 2);
        assert!(matches!(
            &arguments[0],
            Value::String(s) if s.as_literal().as_deref() == Some(" ")
        ));
        assert!(matches!(&arguments[1], Value::Number(n) if n.to_f64() == 2.0));
    }

    #[test]
    fn test_list_with_dictionary_element() {
        let Value::List(list) = single_value("{1, name: \"Dorian\"}") else {
            panic!("expected list");
        };
        assert_eq!(list.elements.len(), 2);
        assert_eq!(list.elements[0].kind(), "Number");

        let Value::Dictionary(dictionary) = &list.elements[1] else {
            panic!("expected dictionary");
        };
        assert_eq!(dictionary.entries.len(), 1);
        assert_eq!(dictionary.entries[0].key, Key::Short(Name("name".to_owned())));
    }

    #[test]
    fn test_long_keys() {
        let Value::Dictionary(dictionary) = single_value("{{1 => :one, [2]: \"two\"}}") else {
            panic!("expected dictionary");
        };
        assert_eq!(dictionary.entries.len(), 2);
        assert!(matches!(&dictionary.entries[0].key, Key::Long(Value::Number(_))));
        assert!(matches!(&dictionary.entries[1].key, Key::Long(Value::List(_))));
    }

    #[test]
    fn test_if_without_alternative() {
        let Statement::If(statement) = single_statement("{if item.parent}yes{end}") else {
            panic!("expected if");
        };
        assert!(statement.alternative.is_none());
        assert!(matches!(statement.body, Body::Template(_)));
    }

    #[test]
    fn test_else_if_chain_is_right_recursive() {
        let statement = single_statement("{if a}A{else if b}B{else if c}C{else}D{end}");
        let Statement::If(first) = statement else {
            panic!("expected if");
        };

        let Some(alternative) = first.alternative else {
            panic!("expected alternative");
        };
        let Alternative::ElseIf(second) = *alternative else {
            panic!("expected else if");
        };
        assert!(matches!(
            &*second.condition,
            Statement::Value(Value::Call(c)) if c.name.as_str() == "b"
        ));

        let Some(alternative) = second.alternative else {
            panic!("expected alternative");
        };
        let Alternative::ElseIf(third) = *alternative else {
            panic!("expected else if");
        };
        assert!(matches!(
            third.alternative.as_deref(),
            Some(Alternative::Else(Body::Template(_)))
        ));
    }

    #[test]
    fn test_define() {
        let Statement::Define(define) =
            single_statement("{define greet(name, greeting: \"Hello\", times = 1) name end}")
        else {
            panic!("expected define");
        };
        assert_eq!(define.name.as_str(), "greet");

        let parameters = define.parameters.unwrap();
        assert_eq!(parameters.len(), 3);
        assert!(matches!(&parameters[0], Parameter::Positional { default: None, .. }));
        assert!(matches!(&parameters[1], Parameter::Keyword { .. }));
        assert!(parameters[2].default().is_some());
        assert!(matches!(define.body, Some(Body::Inline(ref statements)) if statements.len() == 1));
    }

    #[test]
    fn test_numbers() {
        let Value::Number(number) = single_value("{-1,234.5e3}") else {
            panic!("expected number");
        };
        assert_eq!(number.sign, Some(Sign::Minus));
        let Literal::Decimal {
            whole,
            fraction,
            exponent,
        } = &number.literal
        else {
            panic!("expected decimal");
        };
        assert_eq!(whole, "1234");
        assert_eq!(fraction.as_deref(), Some("5"));
        assert!(exponent.is_some());

        let Value::Number(hex) = single_value("{0xFF}") else {
            panic!("expected number");
        };
        assert_eq!(hex.base(), Some(Base::Hexadecimal));
        assert_eq!(hex.to_f64(), 255.0);
    }

    #[test]
    fn test_interpolated_string() {
        let Value::String(string) = single_value("{\"Hi {name}!\"}") else {
            panic!("expected string");
        };
        assert_eq!(string.parts.len(), 3);
        assert_eq!(string.as_literal(), None);
    }

    #[test]
    fn test_rejects_unconsumed_fields() {
        let tree = Tree::seq(vec![Tree::tagged(
            "code",
            Tree::seq(vec![Tree::tagged(
                "call",
                Tree::node([("name", Tree::leaf("a")), ("extra", Tree::leaf("b"))]),
            )]),
        )]);

        assert_eq!(
            build(tree),
            Err(BuildError::UnconsumedFields {
                node: "call",
                fields: vec!["extra"],
            })
        );
    }

    #[test]
    fn test_rejects_missing_field() {
        let tree = Tree::seq(vec![Tree::tagged(
            "code",
            Tree::seq(vec![Tree::tagged("call", Tree::node([]))]),
        )]);

        assert_eq!(
            build(tree),
            Err(BuildError::MissingField {
                node: "call",
                field: "name",
            })
        );
    }

    #[test]
    fn test_rejects_unknown_body() {
        let tree = Tree::tagged("block", Tree::seq(vec![]));
        assert_eq!(
            body(tree),
            Err(BuildError::UnknownShape {
                node: "body",
                fields: vec!["block"],
            })
        );
    }

    #[test]
    fn test_rejects_wrong_kind() {
        assert_eq!(
            build(Tree::leaf("text")),
            Err(BuildError::UnexpectedKind {
                node: "template",
                expected: "sequence",
                found: "leaf",
            })
        );
    }

    #[test]
    fn test_keyword_leaves_are_checked() {
        assert_eq!(
            tagged_value("boolean", Tree::leaf("maybe")),
            Err(BuildError::InvalidLeaf {
                node: "boolean",
                text: "maybe".to_owned(),
            })
        );
        let error = tagged_value("boolean", Tree::leaf("maybe")).unwrap_err();
        assert_eq!(error.to_string(), "`boolean` leaf has unexpected text \"maybe\"");
        assert_eq!(
            tagged_value("nothing", Tree::leaf("none")),
            Err(BuildError::InvalidLeaf {
                node: "nothing",
                text: "none".to_owned(),
            })
        );
        assert_eq!(
            tagged_value("nothing", Tree::seq(vec![])),
            Err(BuildError::UnexpectedKind {
                node: "nothing",
                expected: "leaf",
                found: "sequence",
            })
        );
        assert_eq!(
            tagged_value("nothing", Tree::leaf("nothing")),
            Ok(Value::Nothing)
        );
    }

    #[test]
    fn test_rejects_operator_without_call() {
        let tree = Tree::node([("name", Tree::leaf("a")), ("operator", Tree::leaf("."))]);
        assert_eq!(
            call(tree),
            Err(BuildError::MissingField {
                node: "call",
                field: "call",
            })
        );
    }
}
