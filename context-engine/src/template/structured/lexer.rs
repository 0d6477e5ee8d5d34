//! Lexer for `{{ ... }}` actions
//!
//! Splits template source into literal text and action token lists, applying
//! `{{-` / `-}}` whitespace trimming and dropping `{{/* comments */}}`.

use super::SyntaxError;

/// A token inside an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `.A.B` chain relative to dot; `.` alone is an empty chain
    Field(Vec<String>),
    /// `$` or `$.A.B` relative to the root data
    Root(Vec<String>),
    /// Function name or keyword
    Ident(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Nil,
    Pipe,
    LParen,
    RParen,
}

/// Lexed template item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Text(String),
    Action { tokens: Vec<Token>, offset: usize },
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Split `src` into text and actions.
pub fn lex(src: &str) -> Result<Vec<Item>, SyntaxError> {
    let mut items = Vec::new();
    let mut rest = src;
    let mut offset = 0usize;
    let mut trim_next_leading = false;

    while let Some(open_at) = rest.find(OPEN) {
        let mut text = &rest[..open_at];
        if trim_next_leading {
            text = text.trim_start();
        }
        let after_open = &rest[open_at + OPEN.len()..];
        let trim_left = ["- ", "-\t", "-\n"]
            .iter()
            .any(|marker| after_open.starts_with(marker));
        let body_start = usize::from(trim_left);
        if trim_left {
            text = text.trim_end();
        }
        if !text.is_empty() {
            items.push(Item::Text(text.to_string()));
        }

        let action_offset = offset + open_at;
        let inner_src = &after_open[body_start..];
        let close_rel = find_close(inner_src)
            .ok_or_else(|| SyntaxError::new("unclosed action", action_offset))?;
        let mut inner = &inner_src[..close_rel];
        let trim_right = [" -", "\t-", "\n-"]
            .iter()
            .any(|marker| inner.ends_with(marker));
        if trim_right {
            inner = &inner[..inner.len() - 1];
        }

        let trimmed = inner.trim();
        if !(trimmed.starts_with("/*") && trimmed.ends_with("*/")) {
            let tokens = tokenize(inner, action_offset)?;
            if tokens.is_empty() {
                return Err(SyntaxError::new("missing value for command", action_offset));
            }
            items.push(Item::Action {
                tokens,
                offset: action_offset,
            });
        }

        let consumed = open_at + OPEN.len() + body_start + close_rel + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
        trim_next_leading = trim_right;
    }

    let tail = if trim_next_leading {
        rest.trim_start()
    } else {
        rest
    };
    if !tail.is_empty() {
        items.push(Item::Text(tail.to_string()));
    }
    Ok(items)
}

/// Find the closing `}}`, skipping over quoted strings.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += 1;
                }
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn field_chain(chars: &[char], mut i: usize) -> (Vec<String>, usize) {
    let mut chain = Vec::new();
    while i < chars.len() && chars[i] == '.' {
        let start = i + 1;
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        if end == start {
            // bare `.`
            i = end;
            break;
        }
        chain.push(chars[start..end].iter().collect());
        i = end;
    }
    (chain, i)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())
}

/// Tokenize the inside of one action.
pub fn tokenize(src: &str, offset: usize) -> Result<Vec<Token>, SyntaxError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '.' => {
                let (chain, next) = field_chain(&chars, i);
                tokens.push(Token::Field(chain));
                i = next;
            }
            '$' => {
                let (chain, next) = field_chain(&chars, i + 1);
                tokens.push(Token::Root(chain));
                i = next;
            }
            '"' => {
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(SyntaxError::new("unterminated quoted string", offset)),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = match chars.get(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('"') => '"',
                                Some('\\') => '\\',
                                Some(other) => {
                                    return Err(SyntaxError::new(
                                        format!("unknown escape sequence \\{other}"),
                                        offset,
                                    ))
                                }
                                None => {
                                    return Err(SyntaxError::new(
                                        "unterminated quoted string",
                                        offset,
                                    ))
                                }
                            };
                            s.push(escaped);
                            i += 2;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            '`' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == '`')
                    .map(|p| start + p)
                    .ok_or_else(|| SyntaxError::new("unterminated raw string", offset))?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(&chars, i)) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<i64>()
                    .map_err(|_| SyntaxError::new(format!("bad number syntax: {text}"), offset))?;
                tokens.push(Token::Int(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    "nil" => Token::Nil,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(SyntaxError::new(
                    format!("unexpected character {other:?} in action"),
                    offset,
                ))
            }
        }
    }
    Ok(tokens)
}
