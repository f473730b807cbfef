//! Statement records produced by the front-ends.

use std::ops::Range;

/// The three top-level statement kinds pj understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    VariableAssignment,
    FunctionCall,
    FunctionDeclaration,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::VariableAssignment => write!(f, "variable assignment"),
            StatementKind::FunctionCall => write!(f, "function call"),
            StatementKind::FunctionDeclaration => write!(f, "function declaration"),
        }
    }
}

/// A scalar literal as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarLiteral {
    /// Decoded string contents.
    Str(String),
    /// Numeral text as written, possibly with a leading `-`.
    Number(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `$name = <literal>;`
    VariableAssignment { name: String, value: ScalarLiteral },
    /// `callee(args);`, `args` is the raw text between the parentheses.
    FunctionCall { callee: String, args: String },
    /// `function name($a, $b) { body }`.
    FunctionDeclaration {
        name: String,
        /// Parameter names, sigils stripped, in declaration order.
        params: Vec<String>,
        /// Raw text between the braces. Context for diagnostics only; the
        /// body is built from `body_statements`.
        body: String,
        /// The front-end's reading of `body`.
        body_statements: Vec<Scanned>,
    },
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::VariableAssignment { .. } => StatementKind::VariableAssignment,
            Statement::FunctionCall { .. } => StatementKind::FunctionCall,
            Statement::FunctionDeclaration { .. } => StatementKind::FunctionDeclaration,
        }
    }
}

/// One recognised statement plus the exact source it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    pub statement: Statement,
    /// Byte range of the statement in the source.
    pub span: Range<usize>,
    /// `source[span]`.
    pub raw: String,
}

impl StatementRecord {
    pub fn new(statement: Statement, source: &str, span: Range<usize>) -> Self {
        Self {
            statement,
            raw: source[span.clone()].to_string(),
            span,
        }
    }
}

/// A chunk of source a front-end could not turn into a statement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("unrecognized statement: {text}")]
    UnrecognizedStatement { span: Range<usize>, text: String },

    #[error("unsupported construct `{construct}`: {text}")]
    UnsupportedConstruct {
        construct: String,
        span: Range<usize>,
        text: String,
    },
}

impl ScanError {
    pub fn span(&self) -> Range<usize> {
        match self {
            ScanError::UnrecognizedStatement { span, .. }
            | ScanError::UnsupportedConstruct { span, .. } => span.clone(),
        }
    }
}

pub type Scanned = Result<StatementRecord, ScanError>;

/// Parse a PHP numeral (`42`, `-1.5e3`, `1_000`, `0x1F`, `0b101`, `0o17`,
/// `017`) into its numeric value.
pub fn parse_php_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, cleaned.as_str()),
    };
    if digits.is_empty() {
        return None;
    }

    let lower = digits.to_ascii_lowercase();
    let radix_body = |prefix: &str, radix: u32| {
        lower
            .strip_prefix(prefix)
            .map(|body| i64::from_str_radix(body, radix).ok().map(|v| v as f64))
    };
    let value = if let Some(v) = radix_body("0x", 16) {
        v?
    } else if let Some(v) = radix_body("0b", 2) {
        v?
    } else if let Some(v) = radix_body("0o", 8) {
        v?
    } else if lower.len() > 1 && lower.starts_with('0') && lower.bytes().all(|b| b.is_ascii_digit()) {
        i64::from_str_radix(&lower[1..], 8).ok()? as f64
    } else if lower.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'+' | b'-')) {
        lower.parse::<f64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -value } else { value })
}
