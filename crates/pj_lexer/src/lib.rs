//! Lexer for the PHP subset read by pj.
//!
//! Produces a flat token stream with byte spans into the source text.
//! Whitespace and comments (`//`, `#`, `/* */`) are dropped; PHP open and
//! close tags survive as tokens so the scanner can skip them explicitly.
//!
//! The lexer never fails. Unterminated strings are flagged on the token and
//! unknown bytes become [`TokenKind::Punct`].

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `$name`, span includes the sigil.
    Variable,
    /// Bare word: function name, keyword or constant.
    Ident,
    /// Quoted string, span includes the quotes.
    Str { quote: char, terminated: bool },
    Number,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Eq,
    /// `<?php`, `<?=` or `<?`.
    OpenTag,
    /// `?>`.
    CloseTag,
    /// Any other single byte.
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.clone()]
    }

    /// Variable name with the `$` sigil stripped.
    pub fn variable_name<'src>(&self, source: &'src str) -> Option<&'src str> {
        match self.kind {
            TokenKind::Variable => Some(&source[self.span.start + 1..self.span.end]),
            _ => None,
        }
    }

    pub fn is_ident(&self, source: &str, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source).eq_ignore_ascii_case(word)
    }

    /// True for a string token opened with `quote` and properly closed.
    pub fn is_closed_str(&self, quote: char) -> bool {
        matches!(self.kind, TokenKind::Str { quote: q, terminated: true } if q == quote)
    }
}

/// Tokenize `source`. Spans always fall on ASCII byte boundaries.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = skip_trivia(bytes, i) {
            i = next;
            continue;
        }

        let start = i;
        let kind = match bytes[i] {
            b'<' if bytes.get(i + 1) == Some(&b'?') => {
                i += 2;
                if source[i..].get(..3).is_some_and(|w| w.eq_ignore_ascii_case("php")) {
                    i += 3;
                } else if bytes.get(i) == Some(&b'=') {
                    i += 1;
                }
                TokenKind::OpenTag
            }
            b'?' if bytes.get(i + 1) == Some(&b'>') => {
                i += 2;
                TokenKind::CloseTag
            }
            b'"' | b'\'' => {
                let (end, terminated) = scan_string(bytes, i);
                i = end;
                TokenKind::Str {
                    quote: bytes[start] as char,
                    terminated,
                }
            }
            b'$' if bytes.get(i + 1).is_some_and(|&b| is_ident_start(b)) => {
                i = scan_word(bytes, i + 1);
                TokenKind::Variable
            }
            b if b.is_ascii_digit() => {
                i = scan_number(bytes, i);
                TokenKind::Number
            }
            b if is_ident_start(b) => {
                i = scan_word(bytes, i);
                TokenKind::Ident
            }
            b => {
                i += 1;
                match b {
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b'[' => TokenKind::LBracket,
                    b']' => TokenKind::RBracket,
                    b',' => TokenKind::Comma,
                    b';' => TokenKind::Semi,
                    b'=' => TokenKind::Eq,
                    _ => TokenKind::Punct,
                }
            }
        };

        tokens.push(Token { kind, span: start..i });
    }

    tokens
}

/// Skip whitespace and comments at `i`. Returns the position after them, or
/// `None` if `i` starts a real token.
fn skip_trivia(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes[i].is_ascii_whitespace() {
        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        return Some(j);
    }

    let line_comment = bytes[i] == b'#' || (bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'/'));
    if line_comment {
        let mut j = i;
        while j < bytes.len() && bytes[j] != b'\n' {
            j += 1;
        }
        return Some(j);
    }

    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
        let mut j = i + 2;
        while j + 1 < bytes.len() {
            if bytes[j] == b'*' && bytes[j + 1] == b'/' {
                return Some(j + 2);
            }
            j += 1;
        }
        return Some(bytes.len());
    }

    None
}

/// Returns the end of the string starting at `i` and whether it was closed.
fn scan_string(bytes: &[u8], i: usize) -> (usize, bool) {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return (j + 1, true),
            _ => j += 1,
        }
    }
    (bytes.len(), false)
}

fn scan_word(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && is_ident_continue(bytes[i]) {
        i += 1;
    }
    i
}

// Covers decimal, float, exponent, hex/octal/binary prefixes and `_`
// separators. Validation happens when the value is parsed.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        let exponent_sign = (b == b'+' || b == b'-') && matches!(bytes[i - 1], b'e' | b'E');
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
            i += 1;
        } else {
            break;
        }
    }
    i
}

// PHP identifiers may contain any byte from 0x80 upwards.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

/// Decode the body of a quoted string token.
///
/// Double-quoted strings honour PHP's escape set: `\n`, `\t`, `\r`, `\v`,
/// `\e`, `\f`, `\\`, `\$`, `\"`, octal `\NNN`, hex `\xHH` and `\u{...}`.
/// Single-quoted strings only `\\` and `\'`. Unknown escapes are kept
/// verbatim, as PHP does.
///
/// Returns `None` when the decoded bytes are not valid UTF-8 or a `\u{...}`
/// escape names no code point.
pub fn unquote(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let quote = match bytes.first() {
        Some(&q @ (b'"' | b'\'')) => q,
        _ => return Some(text.to_string()),
    };
    let body = &bytes[1..];
    let body = body.strip_suffix(&[quote]).unwrap_or(body);

    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let Some(&next) = body.get(i) else {
            out.push(b'\\');
            break;
        };
        if quote == b'\'' {
            if matches!(next, b'\\' | b'\'') {
                out.push(next);
                i += 1;
            } else {
                out.push(b'\\');
            }
            continue;
        }

        i += 1;
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' | b'$' | b'"' => out.push(next),
            b'0'..=b'7' => {
                let (value, len) = digit_run(&body[i - 1..], 3, 8);
                // `\400` and up wrap, as in PHP.
                out.push((value & 0xff) as u8);
                i += len - 1;
            }
            b'x' if body.get(i).is_some_and(u8::is_ascii_hexdigit) => {
                let (value, len) = digit_run(&body[i..], 2, 16);
                out.push(value as u8);
                i += len;
            }
            b'u' if body.get(i) == Some(&b'{') => {
                let close = i + body[i..].iter().position(|&c| c == b'}')?;
                let hex = std::str::from_utf8(&body[i + 1..close]).ok()?;
                let c = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)?;
                out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                i = close + 1;
            }
            _ => {
                out.push(b'\\');
                out.push(next);
            }
        }
    }
    String::from_utf8(out).ok()
}

/// Value and length of the run of up to `max` digits in `radix` at the
/// front of `bytes`.
fn digit_run(bytes: &[u8], max: usize, radix: u32) -> (u32, usize) {
    bytes
        .iter()
        .take(max)
        .map_while(|&b| char::from(b).to_digit(radix))
        .fold((0, 0), |(value, len), d| (value * radix + d, len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn variable_assignment_tokens() {
        let src = r#"$x = "hello";"#;
        let tokens = tokenize(src);
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Variable,
                TokenKind::Eq,
                TokenKind::Str {
                    quote: '"',
                    terminated: true
                },
                TokenKind::Semi,
            ]
        );
        assert_eq!(tokens[0].variable_name(src), Some("x"));
        assert_eq!(tokens[2].text(src), "\"hello\"");
    }

    #[test]
    fn string_hides_parens_and_semicolons() {
        let src = r#"echo("a); b(\"");"#;
        let tokens = tokenize(src);
        assert_eq!(tokens.len(), 5, "{tokens:?}");
        assert_eq!(tokens[2].text(src), r#""a); b(\"""#);
    }

    #[test]
    fn comments_and_tags() {
        let src = "<?php\n// note\n# other\n/* block */ foo(); ?>";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::OpenTag,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::CloseTag,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_flagged() {
        let tokens = tokenize("$x = \"oops;");
        assert_eq!(
            tokens[2].kind,
            TokenKind::Str {
                quote: '"',
                terminated: false
            }
        );
        assert_eq!(tokens[2].span.end, 11);
    }

    #[test]
    fn numbers_with_exponent_and_separator() {
        let src = "1_000 2.5e-3 0x1F";
        let texts: Vec<_> = tokenize(src).iter().map(|t| t.text(src).to_string()).collect();
        assert_eq!(texts, vec!["1_000", "2.5e-3", "0x1F"]);
    }

    #[test]
    fn lone_dollar_is_punct() {
        assert_eq!(kinds("$ ;"), vec![TokenKind::Punct, TokenKind::Semi]);
    }

    #[test]
    fn non_ascii_identifiers_stay_whole() {
        let src = "$café = \"x\";";
        let tokens = tokenize(src);
        assert_eq!(tokens[0].variable_name(src), Some("café"));
    }

    #[test]
    fn unquote_handles_php_escapes() {
        assert_eq!(unquote(r#""a\"b\n\$c""#).as_deref(), Some("a\"b\n$c"));
        assert_eq!(unquote(r"'it\'s \n'").as_deref(), Some("it's \\n"));
        assert_eq!(unquote(r#""back\\slash""#).as_deref(), Some("back\\slash"));
    }

    #[test]
    fn unquote_decodes_numeric_and_control_escapes() {
        assert_eq!(unquote(r#""a\x41""#).as_deref(), Some("aA"));
        assert_eq!(unquote(r#""\101\7""#).as_deref(), Some("A\u{7}"));
        assert_eq!(unquote(r#""\u{1F600}\u{e9}""#).as_deref(), Some("\u{1F600}\u{e9}"));
        assert_eq!(unquote(r#""\e\v\f""#).as_deref(), Some("\u{1b}\u{b}\u{c}"));
        // Only double quotes decode these.
        assert_eq!(unquote(r"'\x41'").as_deref(), Some("\\x41"));
    }

    #[test]
    fn unquote_keeps_incomplete_escapes() {
        assert_eq!(unquote(r#""\q \x \u""#).as_deref(), Some("\\q \\x \\u"));
    }

    #[test]
    fn unquote_rejects_undecodable_escapes() {
        assert_eq!(unquote(r#""\xff""#), None);
        assert_eq!(unquote(r#""\u{zz}""#), None);
        assert_eq!(unquote(r#""\u{110000}""#), None);
        assert_eq!(unquote(r#""\u{41""#), None);
    }
}
