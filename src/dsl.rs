//! Parser for filter definition files.
//!
//! Definition format:
//! ```text
//! # bird observations
//! TEMPLATE breeding "BREEDING BIRD ATLAS CODE" text
//! | !in ["", "F"]
//! TEMPLATE species "SCIENTIFIC NAME"
//! | in
//! TEMPLATE date "OBSERVATION DATE"
//! | >=
//! | <=
//! USE breeding
//! USE species ["Periparus ater", "Parus major"]
//! ```
//!
//! - `TEMPLATE name column [type]` - define a template. The column is a
//!   quoted or bare header name, or a bare 1-based position. The type is
//!   `text` (default), `int` or `float`.
//! - `| op [value]` - add a comparison to the preceding template; without a
//!   value the slot is filled at activation
//! - `USE name [value ...]` - activate a template, filling its open slots
//!   in declaration order
//! - Values are `"quoted"`, `bare`, or lists `[a, "b c"]`, and are coerced
//!   with the template's type
//! - Lines starting with `#` are comments

use crate::engine::Engine;
use crate::error::{Result, TxtFilterError};
use crate::template::{FilterTemplate, Locator};
use crate::value::{Value, ValueType};

/// A value as written in a definition, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Scalar(String),
    List(Vec<String>),
}

impl Literal {
    /// Coerce with a template's value type; list items are coerced one by one.
    pub fn to_value(&self, value_type: &ValueType) -> std::result::Result<Value, (String, String)> {
        match self {
            Literal::Scalar(s) => value_type.coerce(s).map_err(|e| (s.clone(), e)),
            Literal::List(items) => items
                .iter()
                .map(|s| value_type.coerce(s).map_err(|e| (s.clone(), e)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }
}

/// One `| op [value]` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonDef {
    pub operator: String,
    pub value: Option<Literal>,
}

/// A parsed definition statement.
#[derive(Debug, Clone)]
pub enum Statement {
    Template {
        name: String,
        column: Locator,
        value_type: ValueType,
        comparisons: Vec<ComparisonDef>,
    },
    Use {
        name: String,
        values: Vec<Literal>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    List(Vec<String>),
}

impl Token {
    fn into_literal(self) -> Literal {
        match self {
            Token::Word(s) | Token::Quoted(s) => Literal::Scalar(s),
            Token::List(items) => Literal::List(items),
        }
    }
}

/// Parse definition text into statements.
pub fn parse_definitions(text: &str) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let syntax = |message: String| TxtFilterError::Syntax {
            line: line_num + 1,
            message,
        };

        if let Some(rest) = line.strip_prefix('|') {
            let def = parse_comparison(rest).map_err(syntax)?;
            match statements.last_mut() {
                Some(Statement::Template { comparisons, .. }) => comparisons.push(def),
                _ => return Err(syntax("comparison must follow a TEMPLATE".to_string())),
            }
            continue;
        }

        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let statement = match keyword.to_uppercase().as_str() {
            "TEMPLATE" => parse_template(rest),
            "USE" => parse_use_body(rest),
            _ => Err(format!("Unknown statement: {keyword}")),
        }
        .map_err(syntax)?;
        statements.push(statement);
    }

    Ok(statements)
}

/// Parse the body of a `USE` statement given outside a file, e.g. on the
/// command line: `species "Periparus ater"`.
pub fn parse_use(text: &str) -> Result<Statement> {
    let body = text.trim();
    let body = match body.split_once(char::is_whitespace) {
        Some((keyword, rest)) if keyword.eq_ignore_ascii_case("USE") => rest,
        _ => body,
    };
    parse_use_body(body).map_err(|message| TxtFilterError::InvalidActivation {
        text: text.to_string(),
        message,
    })
}

/// Register templates and perform activations on `engine`, in order.
pub fn apply(engine: &mut Engine, statements: &[Statement]) -> Result<()> {
    for statement in statements {
        match statement {
            Statement::Template {
                name,
                column,
                value_type,
                comparisons,
            } => {
                let mut template = FilterTemplate::new(name.clone(), column.clone(), value_type.clone());
                for def in comparisons {
                    let value = def
                        .value
                        .as_ref()
                        .map(|lit| lit.to_value(value_type))
                        .transpose()
                        .map_err(|(value, reason)| TxtFilterError::InvalidValue {
                            filter: name.clone(),
                            value,
                            reason,
                        })?;
                    template.add_comparison(def.operator.clone(), value);
                }
                engine.insert_template(template)?;
            }
            Statement::Use { name, values } => {
                let value_type = engine.template(name)?.value_type().clone();
                let values = values
                    .iter()
                    .map(|lit| lit.to_value(&value_type))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|(value, reason)| TxtFilterError::InvalidValue {
                        filter: name.clone(),
                        value,
                        reason,
                    })?;
                engine.activate(name, values)?;
            }
        }
    }
    Ok(())
}

/// Parse `name column [type]`.
fn parse_template(rest: &str) -> std::result::Result<Statement, String> {
    let mut tokens = tokenize(rest)?.into_iter();

    let name = match tokens.next() {
        Some(Token::Word(name)) => name,
        _ => return Err("TEMPLATE requires a name".to_string()),
    };

    let column = match tokens.next() {
        Some(Token::Quoted(header)) => Locator::Header(header),
        Some(Token::Word(word)) if word.chars().all(|c| c.is_ascii_digit()) => {
            let pos: usize = word.parse().map_err(|_| "Invalid column position")?;
            if pos == 0 {
                return Err("Column positions start at 1".to_string());
            }
            Locator::Position(pos)
        }
        Some(Token::Word(header)) => Locator::Header(header),
        _ => return Err("TEMPLATE requires a column".to_string()),
    };

    let value_type = match tokens.next() {
        Some(Token::Word(ty)) => ty.parse::<ValueType>()?,
        Some(_) => return Err("Value type must be a bare word".to_string()),
        None => ValueType::Text,
    };

    if tokens.next().is_some() {
        return Err("Unexpected text after TEMPLATE value type".to_string());
    }

    Ok(Statement::Template {
        name,
        column,
        value_type,
        comparisons: Vec::new(),
    })
}

/// Parse `op [value]`.
fn parse_comparison(rest: &str) -> std::result::Result<ComparisonDef, String> {
    let mut tokens = tokenize(rest)?.into_iter();

    let operator = match tokens.next() {
        Some(Token::Word(op)) => op,
        _ => return Err("Comparison requires an operator".to_string()),
    };
    let value = tokens.next().map(Token::into_literal);

    if tokens.next().is_some() {
        return Err(format!("Comparison '{operator}' takes at most one value"));
    }

    Ok(ComparisonDef { operator, value })
}

/// Parse `name [value ...]`.
fn parse_use_body(rest: &str) -> std::result::Result<Statement, String> {
    let mut tokens = tokenize(rest)?.into_iter();

    let name = match tokens.next() {
        Some(Token::Word(name)) => name,
        _ => return Err("USE requires a template name".to_string()),
    };
    let values = tokens.map(Token::into_literal).collect();

    Ok(Statement::Use { name, values })
}

/// Split a line into bare words, quoted strings and bracketed lists.
fn tokenize(s: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' || c == '\'' {
            chars.next();
            tokens.push(Token::Quoted(read_quoted(&mut chars, c)?));
        } else if c == '[' {
            chars.next();
            tokens.push(Token::List(read_list(&mut chars)?));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// Read up to the closing `delim`; the opening one is already consumed.
fn read_quoted(chars: &mut Chars<'_>, delim: char) -> std::result::Result<String, String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => break,
            },
            c if c == delim => return Ok(out),
            c => out.push(c),
        }
    }
    Err(format!("Unclosed delimiter '{delim}'"))
}

/// Read list items up to `]`; the opening `[` is already consumed.
fn read_list(chars: &mut Chars<'_>) -> std::result::Result<Vec<String>, String> {
    let mut items = Vec::new();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None => return Err("Unclosed list".to_string()),
            Some(']') => {
                chars.next();
                return Ok(items);
            }
            Some(&q) if q == '"' || q == '\'' => {
                chars.next();
                items.push(read_quoted(chars, q)?);
            }
            Some(_) => {
                let mut item = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' || c == ']' {
                        break;
                    }
                    item.push(c);
                    chars.next();
                }
                items.push(item.trim_end().to_string());
            }
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') => continue,
            Some(']') => return Ok(items),
            Some(c) => return Err(format!("Expected ',' or ']' in list, found '{c}'")),
            None => return Err("Unclosed list".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const EBIRD: &str = r#"
# bird observations
TEMPLATE breeding "BREEDING BIRD ATLAS CODE" text
| !in ["", "F"]
TEMPLATE species "SCIENTIFIC NAME"
| in
TEMPLATE date "OBSERVATION DATE" str
| >=
| <=
"#;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize(r#"species "SCIENTIFIC NAME" [a, "b c", 'd'] 5"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("species".into()),
                Token::Quoted("SCIENTIFIC NAME".into()),
                Token::List(vec!["a".into(), "b c".into(), "d".into()]),
                Token::Word("5".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_empty_items() {
        assert_eq!(
            tokenize(r#"["", "F"]"#).unwrap(),
            vec![Token::List(vec!["".into(), "F".into()])]
        );
        assert_eq!(tokenize("[]").unwrap(), vec![Token::List(vec![])]);
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize(r#""open"#).is_err());
        assert!(tokenize("[a, b").is_err());
        assert!(tokenize(r#"["a" "b"]"#).is_err());
    }

    #[test]
    fn test_parse_definitions() {
        let statements = parse_definitions(EBIRD).unwrap();
        assert_eq!(statements.len(), 3);
        match &statements[0] {
            Statement::Template {
                name,
                column,
                value_type,
                comparisons,
            } => {
                assert_eq!(name, "breeding");
                assert_eq!(column, &Locator::Header("BREEDING BIRD ATLAS CODE".into()));
                assert_eq!(value_type.name(), "text");
                assert_eq!(
                    comparisons,
                    &vec![ComparisonDef {
                        operator: "!in".into(),
                        value: Some(Literal::List(vec!["".into(), "F".into()])),
                    }]
                );
            }
            _ => panic!("Expected Template"),
        }
        match &statements[2] {
            Statement::Template { comparisons, .. } => {
                assert_eq!(comparisons.len(), 2);
                assert!(comparisons.iter().all(|c| c.value.is_none()));
            }
            _ => panic!("Expected Template"),
        }
    }

    #[test]
    fn test_parse_positional_column() {
        let statements = parse_definitions("TEMPLATE count 7 int\n| > 10").unwrap();
        match &statements[0] {
            Statement::Template {
                column, value_type, ..
            } => {
                assert_eq!(column, &Locator::Position(7));
                assert_eq!(value_type.name(), "integer");
            }
            _ => panic!("Expected Template"),
        }
    }

    #[test]
    fn test_comparison_without_template() {
        let err = parse_definitions("# header\n| == x").unwrap_err();
        assert!(matches!(err, TxtFilterError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_unknown_statement() {
        let err = parse_definitions("FILTER a b").unwrap_err();
        assert!(err.to_string().contains("Unknown statement: FILTER"));
        assert_eq!(err.kind(), ErrorKind::Definition);
    }

    #[test]
    fn test_position_zero() {
        assert!(parse_definitions("TEMPLATE t 0").is_err());
    }

    #[test]
    fn test_parse_use() {
        match parse_use(r#"species "Periparus ater""#).unwrap() {
            Statement::Use { name, values } => {
                assert_eq!(name, "species");
                assert_eq!(values, vec![Literal::Scalar("Periparus ater".into())]);
            }
            _ => panic!("Expected Use"),
        }
        match parse_use("USE breeding").unwrap() {
            Statement::Use { name, values } => {
                assert_eq!(name, "breeding");
                assert!(values.is_empty());
            }
            _ => panic!("Expected Use"),
        }
        assert!(matches!(
            parse_use(r#""quoted""#),
            Err(TxtFilterError::InvalidActivation { .. })
        ));
    }

    #[test]
    fn test_apply_coerces_values() {
        let mut engine = Engine::new("e", true);
        engine.define_operator("!in", |codes, code| !codes.contains(code), true);
        engine
            .load_definitions(&format!("{EBIRD}\nTEMPLATE count \"COUNT\" int\n| >\nUSE count 3"))
            .unwrap();
        let count = engine.active("count").unwrap();
        assert_eq!(
            count.comparisons().next().unwrap().value(),
            Some(&Value::Integer(3))
        );
        assert_eq!(engine.template("species").unwrap().unbound_count(), 1);
    }

    #[test]
    fn test_apply_invalid_value() {
        let mut engine = Engine::new("e", true);
        let err = engine
            .load_definitions("TEMPLATE count \"COUNT\" int\n| > many")
            .unwrap_err();
        assert!(matches!(err, TxtFilterError::InvalidValue { ref value, .. } if value == "many"));
    }

    #[test]
    fn test_invalid_value_leaves_no_template() {
        let mut engine = Engine::new("e", true);
        engine
            .load_definitions("TEMPLATE count \"COUNT\" int\n| >= 1\n| > many")
            .unwrap_err();
        assert!(engine.template("count").is_err());

        engine
            .load_definitions("TEMPLATE count \"COUNT\" int\n| >= 1\n| > 5")
            .unwrap();
        assert_eq!(engine.template("count").unwrap().comparisons().len(), 2);
    }

    #[test]
    fn test_apply_use_arity() {
        let mut engine = Engine::new("e", true);
        let err = engine
            .load_definitions("TEMPLATE d \"DATE\"\n| >=\n| <=\nUSE d 2020-01-01")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActivationArity);
    }
}
