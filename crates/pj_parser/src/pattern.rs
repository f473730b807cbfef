//! Token-pattern front-end.
//!
//! Recognises three statement shapes on the token stream from `pj_lexer`:
//!
//! 1. `$name = "string";` (also the emitted form `var name = "string";`)
//! 2. `name(args);`
//! 3. `function name($a, $b) { body }`
//!
//! Shapes are tried in that order and the first match wins. The scanner keeps
//! a position index into an immutable token vector; the source text is never
//! copied or mutated while scanning.

use pj_lexer::{tokenize, Token, TokenKind};

use crate::record::{ScalarLiteral, ScanError, Scanned, Statement, StatementKind, StatementRecord};
use crate::{Frontend, ReadError, StatementStream};

pub struct PatternFrontend;

impl Frontend for PatternFrontend {
    fn kind(&self) -> pj_ast::FrontendKind {
        pj_ast::FrontendKind::Pattern
    }

    fn statements<'src>(&self, source: &'src str) -> Result<StatementStream<'src>, ReadError> {
        Ok(Box::new(PatternScanner::new(source)))
    }
}

/// Iterator over the statements of one source file.
pub struct PatternScanner<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> PatternScanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }
}

impl Iterator for PatternScanner<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        let (item, consumed) = step(self.source, &self.tokens[self.pos..])?;
        self.pos += consumed;
        Some(item)
    }
}

/// Scan one statement off the front of `tokens`, skipping PHP tags first.
/// Returns the result and the number of tokens consumed, or `None` once only
/// tags (or nothing) remain.
fn step(source: &str, tokens: &[Token]) -> Option<(Scanned, usize)> {
    let skipped = tokens
        .iter()
        .take_while(|t| matches!(t.kind, TokenKind::OpenTag | TokenKind::CloseTag))
        .count();
    let rest = &tokens[skipped..];
    if rest.is_empty() {
        return None;
    }

    let (item, consumed) = match classify(source, rest) {
        Some(kind) => match extract(source, rest, kind) {
            Ok((record, consumed)) => (Ok(record), consumed),
            Err(err) => (Err(err), skip_unrecognized(source, rest)),
        },
        None => {
            let consumed = skip_unrecognized(source, rest);
            let span = rest[0].span.start..rest[consumed - 1].span.end;
            let err = ScanError::UnrecognizedStatement {
                text: source[span.clone()].to_string(),
                span,
            };
            (Err(err), consumed)
        }
    };

    Some((item, skipped + consumed))
}

fn scan_all(source: &str, tokens: &[Token]) -> Vec<Scanned> {
    let mut items = Vec::new();
    let mut pos = 0;
    while let Some((item, consumed)) = step(source, &tokens[pos..]) {
        items.push(item);
        pos += consumed;
    }
    items
}

/// Decide which statement kind `tokens` starts with.
pub fn classify(source: &str, tokens: &[Token]) -> Option<StatementKind> {
    if match_variable(source, tokens).is_some() {
        Some(StatementKind::VariableAssignment)
    } else if match_call(source, tokens).is_some() {
        Some(StatementKind::FunctionCall)
    } else if match_function(source, tokens).is_some() {
        Some(StatementKind::FunctionDeclaration)
    } else {
        None
    }
}

/// Decompose the statement of `kind` at the front of `tokens`. Returns the
/// record and the number of tokens it spans.
pub fn extract(
    source: &str,
    tokens: &[Token],
    kind: StatementKind,
) -> Result<(StatementRecord, usize), ScanError> {
    let extracted = match kind {
        StatementKind::VariableAssignment => match match_variable(source, tokens) {
            Some(m) => {
                let literal = &tokens[m.value];
                let value = pj_lexer::unquote(literal.text(source)).ok_or_else(|| {
                    ScanError::UnsupportedConstruct {
                        construct: "string escape".into(),
                        span: tokens[0].span.start..tokens[m.len - 1].span.end,
                        text: literal.text(source).to_string(),
                    }
                })?;
                let statement = Statement::VariableAssignment {
                    name: m.name.to_string(),
                    value: ScalarLiteral::Str(value),
                };
                Some((statement, m.len))
            }
            None => None,
        },
        StatementKind::FunctionCall => match_call(source, tokens).map(|m| {
            let statement = Statement::FunctionCall {
                callee: tokens[0].text(source).to_string(),
                args: inner_text(source, tokens, m.open, m.close).to_string(),
            };
            (statement, m.close + 2)
        }),
        StatementKind::FunctionDeclaration => match_function(source, tokens).map(|m| {
            let statement = Statement::FunctionDeclaration {
                name: tokens[1].text(source).to_string(),
                params: m.params.iter().map(|p| p.to_string()).collect(),
                body: inner_text(source, tokens, m.body_open, m.body_close).to_string(),
                body_statements: scan_all(source, &tokens[m.body_open + 1..m.body_close]),
            };
            (statement, m.body_close + 1)
        }),
    };

    let (statement, len) = extracted.ok_or_else(|| {
        let end = skip_unrecognized(source, tokens);
        let span = tokens[0].span.start..tokens[end - 1].span.end;
        ScanError::UnrecognizedStatement {
            text: source[span.clone()].to_string(),
            span,
        }
    })?;

    let span = tokens[0].span.start..tokens[len - 1].span.end;
    Ok((StatementRecord::new(statement, source, span), len))
}

struct VariableMatch<'src> {
    name: &'src str,
    /// Index of the string token.
    value: usize,
    len: usize,
}

fn match_variable<'src>(source: &'src str, tokens: &[Token]) -> Option<VariableMatch<'src>> {
    let (name, eq) = match tokens.first()?.kind {
        TokenKind::Variable => (tokens[0].variable_name(source)?, 1),
        // The emitted target form, so printed output can be read back.
        TokenKind::Ident if tokens[0].is_ident(source, "var") => {
            let ident = tokens.get(1).filter(|t| t.kind == TokenKind::Ident)?;
            (ident.text(source), 2)
        }
        _ => return None,
    };

    let is_match = tokens.get(eq)?.kind == TokenKind::Eq
        && tokens.get(eq + 1)?.is_closed_str('"')
        && tokens.get(eq + 2)?.kind == TokenKind::Semi;

    is_match.then_some(VariableMatch {
        name,
        value: eq + 1,
        len: eq + 3,
    })
}

struct CallMatch {
    open: usize,
    close: usize,
}

fn match_call(source: &str, tokens: &[Token]) -> Option<CallMatch> {
    let callee = tokens.first()?;
    if callee.kind != TokenKind::Ident || is_keyword(callee.text(source)) {
        return None;
    }
    if tokens.get(1)?.kind != TokenKind::LParen {
        return None;
    }
    let close = matching(tokens, 1)?;
    (tokens.get(close + 1)?.kind == TokenKind::Semi).then_some(CallMatch { open: 1, close })
}

struct FunctionMatch<'src> {
    params: Vec<&'src str>,
    body_open: usize,
    body_close: usize,
}

fn match_function<'src>(source: &'src str, tokens: &[Token]) -> Option<FunctionMatch<'src>> {
    if !tokens.first()?.is_ident(source, "function") {
        return None;
    }
    let name = tokens.get(1)?;
    if name.kind != TokenKind::Ident || tokens.get(2)?.kind != TokenKind::LParen {
        return None;
    }
    let params_close = matching(tokens, 2)?;
    let params = split_params(source, &tokens[3..params_close])?;

    let body_open = params_close + 1;
    if tokens.get(body_open)?.kind != TokenKind::LBrace {
        return None;
    }
    let body_close = matching(tokens, body_open)?;

    Some(FunctionMatch {
        params,
        body_open,
        body_close,
    })
}

/// Each comma-separated group must contain a `$name`; type hints and default
/// values around it are ignored. A variadic `...$name` has no counterpart and
/// fails the match.
fn split_params<'src>(source: &'src str, tokens: &[Token]) -> Option<Vec<&'src str>> {
    if tokens.is_empty() {
        return Some(Vec::new());
    }
    split_top_level(tokens)
        .into_iter()
        .map(|group| {
            let at = group.iter().position(|t| t.kind == TokenKind::Variable)?;
            let variadic = group[..at]
                .iter()
                .any(|t| t.kind == TokenKind::Punct && t.text(source).starts_with('.'));
            if variadic {
                return None;
            }
            group[at].variable_name(source)
        })
        .collect()
}

/// Split on commas that are not nested inside brackets.
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
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

/// Index of the bracket closing the one at `open`.
fn matching(tokens: &[Token], open: usize) -> Option<usize> {
    let (opener, closer) = match tokens.get(open)?.kind {
        TokenKind::LParen => (TokenKind::LParen, TokenKind::RParen),
        TokenKind::LBrace => (TokenKind::LBrace, TokenKind::RBrace),
        TokenKind::LBracket => (TokenKind::LBracket, TokenKind::RBracket),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind == opener {
            depth += 1;
        } else if token.kind == closer {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn inner_text<'src>(source: &'src str, tokens: &[Token], open: usize, close: usize) -> &'src str {
    source[tokens[open].span.end..tokens[close].span.start].trim()
}

fn is_keyword(word: &str) -> bool {
    // `echo` and `print` are language constructs too, but `echo(...)` reads
    // as a call.
    const KEYWORDS: &[&str] = &[
        "function", "if", "else", "elseif", "while", "for", "foreach", "switch", "return",
        "class", "var", "do", "try", "catch", "finally", "new",
    ];
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Number of tokens making up the unrecognised chunk at the front of
/// `tokens`: up to the next top-level `;`, or through the `}` closing a block
/// opened inside the chunk (plus trailing `else`/`catch` arms). Always at
/// least one.
fn skip_unrecognized(source: &str, tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    let mut i = 0;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => {
                // Stray closer: consume it alone.
                return i.max(1);
            }
            TokenKind::RParen | TokenKind::RBracket => depth -= 1,
            TokenKind::RBrace => {
                depth -= 1;
                let continues = tokens.get(i + 1).is_some_and(|next| {
                    ["else", "elseif", "catch", "finally"]
                        .iter()
                        .any(|kw| next.is_ident(source, kw))
                });
                if depth == 0 && !continues {
                    return i + 1;
                }
            }
            TokenKind::Semi if depth == 0 => return i + 1,
            TokenKind::OpenTag | TokenKind::CloseTag if depth == 0 && i > 0 => return i,
            _ => {}
        }
        i += 1;
    }
    tokens.len().max(1)
}
