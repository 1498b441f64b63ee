//! Lexer for expression fragments.

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Op(&'static str),
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

// Longest first so `//` wins over `/` and `==` over `=`.
const OPERATORS: &[&str] = &[
    "//", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">", "=", "(", ")", "[", "]",
    ",", ".", ";",
];

/// Split `source` into tokens, ending with [`TokenKind::End`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            let (kind, end) = lex_number(source, pos)?;
            tokens.push(Token { kind, offset: start });
            pos = end;
            continue;
        }

        if c == b'_' || c.is_ascii_alphabetic() {
            while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric()) {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Name(source[start..pos].to_string()),
                offset: start,
            });
            continue;
        }

        if c == b'\'' || c == b'"' {
            let (value, end) = lex_string(source, pos)?;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                offset: start,
            });
            pos = end;
            continue;
        }

        let rest = &source[pos..];
        let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) else {
            let ch = rest.chars().next().unwrap_or('?');
            return Err(SyntaxError::new(format!("unexpected character '{ch}'"), start));
        };
        tokens.push(Token {
            kind: TokenKind::Op(*op),
            offset: start,
        });
        pos += op.len();
    }

    tokens.push(Token {
        kind: TokenKind::End,
        offset: source.len(),
    });
    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(TokenKind, usize), SyntaxError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    let mut is_float = false;

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        is_float = true;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut p = pos + 1;
        if p < bytes.len() && (bytes[p] == b'+' || bytes[p] == b'-') {
            p += 1;
        }
        if p < bytes.len() && bytes[p].is_ascii_digit() {
            is_float = true;
            pos = p;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text = &source[start..pos];
    let kind = if is_float {
        text.parse()
            .map(TokenKind::Float)
            .map_err(|_| SyntaxError::new(format!("invalid number '{text}'"), start))?
    } else {
        text.parse()
            .map(TokenKind::Int)
            .map_err(|_| SyntaxError::new(format!("integer '{text}' is too large"), start))?
    };
    Ok((kind, pos))
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize), SyntaxError> {
    let mut chars = source[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(SyntaxError::new("unterminated string", start));
    };
    let mut value = String::new();

    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((value, start + i + c.len_utf8())),
            '\n' => break,
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' | '\'' | '"' => value.push(escaped),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            other => value.push(other),
        }
    }
    Err(SyntaxError::new("unterminated string", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_expression() {
        assert_eq!(
            kinds("'%s' % user.name"),
            vec![
                TokenKind::Str("%s".into()),
                TokenKind::Op("%"),
                TokenKind::Name("user".into()),
                TokenKind::Op("."),
                TokenKind::Name("name".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(
            kinds("7 // 2.5e1 <= .5"),
            vec![
                TokenKind::Int(7),
                TokenKind::Op("//"),
                TokenKind::Float(25.0),
                TokenKind::Op("<="),
                TokenKind::Float(0.5),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""it\'s\n""#),
            vec![TokenKind::Str("it's\n".into()), TokenKind::End]
        );
        let err = tokenize("'open").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a $ b").unwrap_err();
        assert_eq!(err.offset, 2);
    }
}
