//! Builtin Mapper: PHP routine names and argument shapes to JavaScript.
//!
//! - `echo`, `print`, `print_r`, `var_dump` → `console.log(arg)`
//! - `abs`, `ceil`, `floor`, `round`, `sqrt`, `pow`, `max`, `min` → `Math.*`
//! - anything else is called by its own name
//!
//! Arguments must be scalars: `$var`, strings, numbers, booleans or `null`.

use pj_ast::LiteralValue;
use pj_lexer::{tokenize, Token, TokenKind};
use pj_parser::{parse_php_number, ScalarLiteral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Output routine, becomes a single-argument `console.log`.
    Log,
    /// Routine with a same-arity `Math` counterpart.
    Math(&'static str),
}

static BUILTINS: &[(&str, Builtin)] = &[
    ("echo", Builtin::Log),
    ("print", Builtin::Log),
    ("print_r", Builtin::Log),
    ("var_dump", Builtin::Log),
    ("abs", Builtin::Math("abs")),
    ("ceil", Builtin::Math("ceil")),
    ("floor", Builtin::Math("floor")),
    ("round", Builtin::Math("round")),
    ("sqrt", Builtin::Math("sqrt")),
    ("pow", Builtin::Math("pow")),
    ("max", Builtin::Math("max")),
    ("min", Builtin::Math("min")),
];

/// Look up a PHP builtin. PHP function names are case-insensitive.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(php, _)| php.eq_ignore_ascii_case(name))
        .map(|(_, builtin)| *builtin)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// `object.property`, e.g. `console.log`.
    Member {
        object: &'static str,
        property: &'static str,
    },
    /// Plain function name, passed through unchanged.
    Name(String),
}

impl Callee {
    pub fn render(&self) -> String {
        match self {
            Callee::Member { object, property } => format!("{object}.{property}"),
            Callee::Name(name) => name.clone(),
        }
    }
}

/// A literal in target syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct JsLiteral {
    pub value: LiteralValue,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetArg {
    Identifier(String),
    Literal(JsLiteral),
}

impl TargetArg {
    pub fn render(&self) -> &str {
        match self {
            TargetArg::Identifier(name) => name,
            TargetArg::Literal(lit) => &lit.raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedCall {
    pub callee: Callee,
    pub args: Vec<TargetArg>,
}

impl MappedCall {
    pub fn is_log(&self) -> bool {
        self.callee
            == Callee::Member {
                object: "console",
                property: "log",
            }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("`{name}` takes exactly one argument, got {got}")]
    Arity { name: String, got: usize },

    #[error("unsupported argument `{arg}`")]
    UnsupportedArgument { arg: String },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("`{0}` is a reserved word in JavaScript")]
    ReservedWord(String),
}

// Everything a strict-mode module refuses as a binding or reference name.
static RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Reject names that cannot appear as a JavaScript identifier.
pub fn check_identifier(name: &str) -> Result<(), MapError> {
    if RESERVED_WORDS.contains(&name) {
        return Err(MapError::ReservedWord(name.to_string()));
    }
    Ok(())
}

/// Map a PHP call onto its JavaScript form.
pub fn map_call(name: &str, raw_args: &str) -> Result<MappedCall, MapError> {
    let args = parse_args(raw_args)?;
    let callee = match lookup(name) {
        Some(Builtin::Log) => {
            if args.len() != 1 {
                return Err(MapError::Arity {
                    name: name.to_string(),
                    got: args.len(),
                });
            }
            Callee::Member {
                object: "console",
                property: "log",
            }
        }
        Some(Builtin::Math(property)) => Callee::Member {
            object: "Math",
            property,
        },
        None => Callee::Name(name.to_string()),
    };
    Ok(MappedCall { callee, args })
}

/// Translate a raw PHP argument list into target arguments.
pub fn parse_args(raw: &str) -> Result<Vec<TargetArg>, MapError> {
    let tokens = tokenize(raw);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    split_args(&tokens)
        .into_iter()
        .map(|group| translate_arg(raw, group))
        .collect()
}

fn split_args(tokens: &[Token]) -> Vec<&[Token]> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1)
            }
            TokenKind::Comma if depth == 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&tokens[start..]);
    groups
}

fn translate_arg(raw: &str, group: &[Token]) -> Result<TargetArg, MapError> {
    let unsupported = || MapError::UnsupportedArgument {
        arg: match (group.first(), group.last()) {
            (Some(first), Some(last)) => raw[first.span.start..last.span.end].to_string(),
            _ => String::new(),
        },
    };

    let literal = match group {
        [tok] => match tok.kind {
            TokenKind::Variable => {
                let name = tok.variable_name(raw).ok_or_else(unsupported)?;
                return Ok(TargetArg::Identifier(name.to_string()));
            }
            TokenKind::Str {
                terminated: true, ..
            } => ScalarLiteral::Str(pj_lexer::unquote(tok.text(raw)).ok_or_else(unsupported)?),
            TokenKind::Number => ScalarLiteral::Number(tok.text(raw).to_string()),
            TokenKind::Ident if tok.is_ident(raw, "true") => ScalarLiteral::Bool(true),
            TokenKind::Ident if tok.is_ident(raw, "false") => ScalarLiteral::Bool(false),
            TokenKind::Ident if tok.is_ident(raw, "null") => ScalarLiteral::Null,
            _ => return Err(unsupported()),
        },
        [minus, num] if minus.text(raw) == "-" && num.kind == TokenKind::Number => {
            ScalarLiteral::Number(format!("-{}", num.text(raw)))
        }
        _ => return Err(unsupported()),
    };

    js_literal(&literal).map(TargetArg::Literal)
}

/// Render a PHP scalar in JavaScript literal syntax.
pub fn js_literal(literal: &ScalarLiteral) -> Result<JsLiteral, MapError> {
    Ok(match literal {
        ScalarLiteral::Str(s) => JsLiteral {
            value: LiteralValue::String(s.clone()),
            raw: quote_js(s),
        },
        ScalarLiteral::Number(text) => {
            let value = parse_php_number(text)
                .filter(|v| v.is_finite())
                .ok_or_else(|| MapError::InvalidNumber(text.clone()))?;
            JsLiteral {
                value: LiteralValue::Number(value),
                raw: render_number(value),
            }
        }
        ScalarLiteral::Bool(b) => JsLiteral {
            value: LiteralValue::Bool(*b),
            raw: b.to_string(),
        },
        ScalarLiteral::Null => JsLiteral {
            value: LiteralValue::Null,
            raw: "null".into(),
        },
    })
}

/// Double-quoted JavaScript string literal.
fn quote_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// PHP hex, octal and binary numerals all come out as plain decimals.
fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
