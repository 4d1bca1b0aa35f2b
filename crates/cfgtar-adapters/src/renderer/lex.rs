//! Splitting template text into text and actions, and actions into tokens.

use cfgtar_core::{application::RenderError, domain::Delimiters};

// ── Segments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Segment {
    Text(String),
    Action { body: String, line: usize },
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// `-` followed by whitespace right after the left delimiter.
fn has_left_trim(rest: &[u8]) -> bool {
    rest.len() >= 2 && rest[0] == b'-' && is_space(rest[1])
}

/// Split `source` at action boundaries, applying trim markers and dropping
/// comments.
pub(super) fn split(source: &str, delimiters: &Delimiters) -> Result<Vec<Segment>, RenderError> {
    let bytes = source.as_bytes();
    let left = delimiters.left().as_bytes();
    let right = delimiters.right().as_bytes();

    let mut segments = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut trim_next = false;

    while let Some(offset) = find(&bytes[pos..], left) {
        let start = pos + offset;
        let mut text = &source[pos..start];
        if trim_next {
            text = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
        }
        line += source[pos..start].matches('\n').count();

        let mut body_start = start + left.len();
        if has_left_trim(&bytes[body_start..]) {
            text = text.trim_end_matches(|c: char| c.is_ascii_whitespace());
            body_start += 2;
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text.to_owned()));
        }

        let (body_end, after, trim_right) = if bytes[body_start..].starts_with(b"/*") {
            comment_end(bytes, body_start, right, line)?
        } else {
            action_end(bytes, body_start, right, line)?
        };
        if !bytes[body_start..].starts_with(b"/*") {
            segments.push(Segment::Action {
                body: source[body_start..body_end].to_owned(),
                line,
            });
        }

        line += source[start..after].matches('\n').count();
        trim_next = trim_right;
        pos = after;
    }

    let mut rest = &source[pos..];
    if trim_next {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_owned()));
    }
    Ok(segments)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Whether `" -"` precedes the right delimiter found at `at`.
fn right_trim_before(bytes: &[u8], body_start: usize, at: usize) -> bool {
    at >= body_start + 2 && bytes[at - 1] == b'-' && is_space(bytes[at - 2])
}

/// Locate the right delimiter closing an action, skipping quoted text.
///
/// Returns `(body_end, after_delimiter, trim_right)`.
fn action_end(
    bytes: &[u8],
    body_start: usize,
    right: &[u8],
    line: usize,
) -> Result<(usize, usize, bool), RenderError> {
    let mut quote: Option<u8> = None;
    let mut i = body_start;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' && q != b'`' {
                i += 2;
                continue;
            }
            if b == b'\n' && q != b'`' {
                return Err(RenderError::new("unterminated quoted string").at_line(line));
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if matches!(b, b'"' | b'`' | b'\'') {
            quote = Some(b);
        } else if bytes[i..].starts_with(right) {
            return Ok(if right_trim_before(bytes, body_start, i) {
                (i - 2, i + right.len(), true)
            } else {
                (i, i + right.len(), false)
            });
        }
        i += 1;
    }
    Err(RenderError::new("unclosed action").at_line(line))
}

/// Comments run to `*/`, which must be followed by the right delimiter.
fn comment_end(
    bytes: &[u8],
    body_start: usize,
    right: &[u8],
    line: usize,
) -> Result<(usize, usize, bool), RenderError> {
    let close = find(&bytes[body_start + 2..], b"*/")
        .map(|i| body_start + 2 + i + 2)
        .ok_or_else(|| RenderError::new("unclosed comment").at_line(line))?;
    if bytes[close..].starts_with(right) {
        return Ok((close, close + right.len(), false));
    }
    if has_left_trim_reversed(&bytes[close..]) && bytes[close + 2..].starts_with(right) {
        return Ok((close, close + 2 + right.len(), true));
    }
    Err(RenderError::new("comment ends before closing delimiter").at_line(line))
}

/// Whitespace followed by `-`, the right-hand trim marker.
fn has_left_trim_reversed(rest: &[u8]) -> bool {
    rest.len() >= 2 && is_space(rest[0]) && rest[1] == b'-'
}

// ── Tokens ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Tok {
    Dot,
    /// `.name`
    Field(String),
    /// `$name`; the bare `$` has an empty name.
    Var(String),
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Pipe,
    LParen,
    RParen,
    Comma,
    Declare,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub tok: Tok,
    /// Whitespace came before this token.
    pub spaced: bool,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize one action body.
pub(super) fn tokenize(body: &str, line: usize) -> Result<Vec<Token>, RenderError> {
    let err = |msg: String| RenderError::new(msg).at_line(line);
    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut spaced = true;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c.is_whitespace() {
            spaced = true;
            i += 1;
            continue;
        }

        let tok = match c {
            '|' => {
                i += 1;
                Tok::Pipe
            }
            '(' => {
                i += 1;
                Tok::LParen
            }
            ')' => {
                i += 1;
                Tok::RParen
            }
            ',' => {
                i += 1;
                Tok::Comma
            }
            ':' if next == Some('=') => {
                i += 2;
                Tok::Declare
            }
            '=' => {
                i += 1;
                Tok::Assign
            }
            '"' => {
                let (s, end) = quoted(&chars, i + 1).map_err(err)?;
                i = end;
                Tok::Str(s)
            }
            '`' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '`')
                    .ok_or_else(|| err("unterminated raw string".into()))?;
                let s: String = chars[i + 1..i + 1 + close].iter().collect();
                i += close + 2;
                Tok::Str(s)
            }
            '.' if next.is_some_and(is_ident_start) => {
                let (name, end) = ident(&chars, i + 1);
                i = end;
                Tok::Field(name)
            }
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                let (tok, end) = number(&chars, i).map_err(err)?;
                i = end;
                tok
            }
            '.' => {
                i += 1;
                Tok::Dot
            }
            '$' => {
                let (name, end) = ident(&chars, i + 1);
                i = end;
                Tok::Var(name)
            }
            '-' | '+' if next.is_some_and(|n| n.is_ascii_digit() || n == '.') => {
                let (tok, end) = number(&chars, i).map_err(err)?;
                i = end;
                tok
            }
            c if c.is_ascii_digit() => {
                let (tok, end) = number(&chars, i).map_err(err)?;
                i = end;
                tok
            }
            c if is_ident_start(c) => {
                let (name, end) = ident(&chars, i);
                i = end;
                match name.as_str() {
                    "true" => Tok::Bool(true),
                    "false" => Tok::Bool(false),
                    "nil" => Tok::Nil,
                    _ => Tok::Ident(name),
                }
            }
            other => return Err(err(format!("unexpected {other:?} in action"))),
        };
        tokens.push(Token { tok, spaced });
        spaced = false;
    }
    Ok(tokens)
}

fn ident(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|&c| !is_ident_char(c))
        .map_or(chars.len(), |n| start + n);
    (chars[start..end].iter().collect(), end)
}

fn number(chars: &[char], start: usize) -> Result<(Tok, usize), String> {
    let end = chars[start..]
        .iter()
        .enumerate()
        .position(|(n, &c)| {
            let prev = if n == 0 { None } else { chars.get(start + n - 1).copied() };
            let signed_exponent = matches!(c, '+' | '-') && matches!(prev, Some('e' | 'E'));
            !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || n == 0 || signed_exponent)
        })
        .map_or(chars.len(), |n| start + n);
    let text: String = chars[start..end].iter().filter(|&&c| c != '_').collect();

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    let bad = || format!("bad number syntax: {text:?}");

    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        let n = i64::from_str_radix(hex, 16).map_err(|_| bad())?;
        return Ok((Tok::Int(if negative { -n } else { n }), end));
    }
    if let Ok(n) = digits.parse::<i64>() {
        return Ok((Tok::Int(if negative { -n } else { n }), end));
    }
    let f = digits.parse::<f64>().map_err(|_| bad())?;
    if !f.is_finite() {
        return Err(bad());
    }
    Ok((Tok::Float(if negative { -f } else { f }), end))
}

/// Read a double-quoted string starting after the opening quote.
fn quoted(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut out = String::new();
    let mut i = start;
    while let Some(&c) = chars.get(i) {
        match c {
            '"' => return Ok((out, i + 1)),
            '\\' => {
                let esc = chars.get(i + 1).copied().ok_or("unterminated quoted string")?;
                i += 2;
                match esc {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' | '"' | '\'' => out.push(esc),
                    'x' | 'u' | 'U' => {
                        let width = match esc {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let hex: String = chars.get(i..i + width).ok_or("short escape")?.iter().collect();
                        let code = u32::from_str_radix(&hex, 16).map_err(|_| format!("bad escape \\{esc}{hex}"))?;
                        out.push(char::from_u32(code).ok_or(format!("bad escape \\{esc}{hex}"))?);
                        i += width;
                    }
                    other => return Err(format!("unknown escape sequence \\{other}")),
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err("unterminated quoted string".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(source: &str) -> Vec<Segment> {
        split(source, &Delimiters::default()).unwrap()
    }

    fn toks(body: &str) -> Vec<Tok> {
        tokenize(body, 1).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn splits_text_and_actions() {
        assert_eq!(
            actions("a {{.x}} b"),
            vec![
                Segment::Text("a ".into()),
                Segment::Action { body: ".x".into(), line: 1 },
                Segment::Text(" b".into()),
            ]
        );
    }

    #[test]
    fn trim_markers_eat_whitespace() {
        assert_eq!(
            actions("a  \n{{- .x -}}\n  b"),
            vec![
                Segment::Text("a".into()),
                Segment::Action { body: ".x".into(), line: 2 },
                Segment::Text("b".into()),
            ]
        );
    }

    #[test]
    fn negative_number_is_not_a_trim_marker() {
        assert_eq!(actions("{{-3}}"), vec![Segment::Action { body: "-3".into(), line: 1 }]);
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(actions("a{{/* note */}}b"), vec![Segment::Text("a".into()), Segment::Text("b".into())]);
        assert_eq!(actions("a {{- /* x */ -}} b"), vec![Segment::Text("a".into()), Segment::Text("b".into())]);
    }

    #[test]
    fn delimiter_inside_string_does_not_close() {
        assert_eq!(
            actions(r#"{{ print "}}" }}"#),
            vec![Segment::Action { body: r#" print "}}" "#.into(), line: 1 }]
        );
    }

    #[test]
    fn custom_delimiters() {
        let d: Delimiters = "<%.%>".parse().unwrap();
        assert_eq!(
            split("{{x}} <% .y %>", &d).unwrap(),
            vec![
                Segment::Text("{{x}} ".into()),
                Segment::Action { body: " .y ".into(), line: 1 },
            ]
        );
    }

    #[test]
    fn unclosed_action_fails() {
        assert!(split("x {{ .y", &Delimiters::default()).is_err());
    }

    #[test]
    fn tokens_of_a_pipeline() {
        assert_eq!(
            toks(r#"$v := index .a.b "k" 1 | printf 2.5 `raw` nil"#),
            vec![
                Tok::Var("v".into()),
                Tok::Declare,
                Tok::Ident("index".into()),
                Tok::Field("a".into()),
                Tok::Field("b".into()),
                Tok::Str("k".into()),
                Tok::Int(1),
                Tok::Pipe,
                Tok::Ident("printf".into()),
                Tok::Float(2.5),
                Tok::Str("raw".into()),
                Tok::Nil,
            ]
        );
    }

    #[test]
    fn chained_fields_are_unspaced() {
        let tokens = tokenize(".a.b .c", 1).unwrap();
        assert!(tokens[0].spaced);
        assert!(!tokens[1].spaced);
        assert!(tokens[2].spaced);
    }

    #[test]
    fn numbers_and_escapes() {
        assert_eq!(toks("-7 0x1F 1e3"), vec![Tok::Int(-7), Tok::Int(31), Tok::Float(1000.0)]);
        assert_eq!(toks(r#""a\tbé""#), vec![Tok::Str("a\tbé".into())]);
    }
}
