//! Reply decoder: untrusted model text → [`Suggestion`] records.
//!
//! The reply is never evaluated. It is repaired (code fences, surrounding
//! prose, a bare single record), then read by a small literal parser that
//! accepts exactly:
//!
//! - lists `[ ... ]` and tuples `( ... )`, trailing comma allowed
//! - strings in `"` or `'` with backslash escapes (JSON `\uXXXX` included)
//! - non-negative integers
//!
//! and finally checked against the record shape `[path, position, body, hunk]`.
//! If the repaired text does not decode, escaped quotes (`\"`, `\'`) are
//! normalized to plain quotes and decoding is attempted once more.
//!
//! A well-formed JSON reply (what the prompt asks for) goes through
//! `serde_json` directly; the literal parser handles everything else.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::DecodeError;
use crate::review::Suggestion;

/// Records sit two levels deep; anything far beyond that is rejected.
const MAX_DEPTH: usize = 16;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)\s*```$").unwrap();
}

/// Decodes a model reply into suggestions, in reply order.
///
/// `[]` is a valid reply and yields an empty list.
pub fn decode_suggestions(reply: &str) -> Result<Vec<Suggestion>, DecodeError> {
    let text = repair(reply);
    match decode_repaired(&text) {
        Ok(list) => Ok(list),
        Err(first) => {
            let normalized = normalize_escaped_quotes(&text);
            if normalized == text {
                return Err(first);
            }
            decode_repaired(&normalized)
        }
    }
}

/// Strips fences and prose around the list; wraps a bare `( ... )` record.
pub(crate) fn repair(reply: &str) -> String {
    let mut t = reply.trim();
    if let Some(caps) = CODE_FENCE.captures(t) {
        t = caps.get(1).map_or("", |m| m.as_str()).trim();
    }
    let t = isolate_list(t);
    if t.starts_with('(') {
        format!("[{t}]")
    } else {
        t.to_string()
    }
}

pub(crate) fn normalize_escaped_quotes(text: &str) -> String {
    text.replace("\\\"", "\"").replace("\\'", "'")
}

fn isolate_list(t: &str) -> &str {
    let pairs: &[(char, char)] = match t.chars().next() {
        Some('[') => &[('[', ']')],
        Some('(') => &[('(', ')')],
        _ => &[('[', ']'), ('(', ')')],
    };
    for &(open, close) in pairs {
        if let (Some(a), Some(b)) = (t.find(open), t.rfind(close)) {
            if a < b {
                return &t[a..=b];
            }
        }
    }
    t
}

fn decode_repaired(text: &str) -> Result<Vec<Suggestion>, DecodeError> {
    if let Ok(rows) = serde_json::from_str::<Vec<(String, u64, String, String)>>(text) {
        return rows
            .into_iter()
            .enumerate()
            .map(|(index, (path, position, body, hunk))| {
                let fields = vec![
                    Literal::Str(path),
                    Literal::Int(position),
                    Literal::Str(body),
                    Literal::Str(hunk),
                ];
                record(index, Literal::Seq(fields))
            })
            .collect();
    }

    match parse_literal(text)? {
        // A reply that was itself string-encoded: decode the inner text once.
        Literal::Str(inner) => into_suggestions(parse_literal(&repair(&inner))?),
        lit => into_suggestions(lit),
    }
}

/* ------------------------------------------------------------------------- */
/* Literal parser                                                            */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Int(u64),
    Seq(Vec<Literal>),
}

fn parse_literal(text: &str) -> Result<Literal, DecodeError> {
    let mut p = Parser {
        src: text,
        pos: 0,
        depth: 0,
    };
    p.skip_ws();
    if p.peek().is_none() {
        return Err(DecodeError::Empty);
    }
    let value = p.value()?;
    p.skip_ws();
    if p.pos < text.len() {
        return Err(DecodeError::Trailing(p.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    /// Byte offset into `src`.
    pos: usize,
    /// Open brackets around `pos`.
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn value(&mut self) -> Result<Literal, DecodeError> {
        self.skip_ws();
        match self.peek() {
            None => Err(DecodeError::UnexpectedEof {
                expected: "a value",
            }),
            Some('[') => self.nested(']'),
            Some('(') => self.nested(')'),
            Some(q @ ('"' | '\'')) => self.string(q).map(Literal::Str),
            Some(c) if c.is_ascii_digit() => self.int().map(Literal::Int),
            Some(c) => Err(DecodeError::Unexpected {
                offset: self.pos,
                found: c,
                expected: "a list, tuple, string or integer",
            }),
        }
    }

    fn nested(&mut self, close: char) -> Result<Literal, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::TooDeep(self.pos));
        }
        self.depth += 1;
        let out = self.seq(close);
        self.depth -= 1;
        out
    }

    fn seq(&mut self, close: char) -> Result<Literal, DecodeError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Literal::Seq(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(Literal::Seq(items)),
                Some(c) => {
                    return Err(DecodeError::Unexpected {
                        offset: self.pos - c.len_utf8(),
                        found: c,
                        expected: "',' or a closing bracket",
                    });
                }
                None => {
                    return Err(DecodeError::UnexpectedEof {
                        expected: "',' or a closing bracket",
                    });
                }
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, DecodeError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(DecodeError::UnterminatedString(start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let esc_at = self.pos - 1;
                    match self.bump() {
                        None => return Err(DecodeError::UnterminatedString(start)),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('0') => out.push('\0'),
                        Some('\n') => {}
                        Some('u') => out.push(self.unicode_escape(esc_at)?),
                        Some(c @ ('\\' | '"' | '\'' | '/')) => out.push(c),
                        // Unknown escapes are kept literally.
                        Some(c) => {
                            out.push('\\');
                            out.push(c);
                        }
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Reads the hex digits after `\u`, joining UTF-16 surrogate pairs.
    fn unicode_escape(&mut self, esc_at: usize) -> Result<char, DecodeError> {
        let hi = self.hex4(esc_at)?;
        if (0xD800..0xDC00).contains(&hi) {
            if self.bump() != Some('\\') || self.bump() != Some('u') {
                return Err(DecodeError::InvalidEscape(esc_at));
            }
            let lo = self.hex4(esc_at)?;
            if !(0xDC00..0xE000).contains(&lo) {
                return Err(DecodeError::InvalidEscape(esc_at));
            }
            let cp = 0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00);
            return char::from_u32(cp).ok_or(DecodeError::InvalidEscape(esc_at));
        }
        char::from_u32(hi).ok_or(DecodeError::InvalidEscape(esc_at))
    }

    fn hex4(&mut self, esc_at: usize) -> Result<u32, DecodeError> {
        let mut v = 0u32;
        for _ in 0..4 {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or(DecodeError::InvalidEscape(esc_at))?;
            v = v * 16 + d;
        }
        Ok(v)
    }

    fn int(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut v: u64 = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            v = v
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(d)))
                .ok_or(DecodeError::Overflow(start))?;
            self.bump();
        }
        if let Some(c @ ('.' | 'e' | 'E')) = self.peek() {
            return Err(DecodeError::Unexpected {
                offset: self.pos,
                found: c,
                expected: "an integer",
            });
        }
        Ok(v)
    }
}

/* ------------------------------------------------------------------------- */
/* Shape validation                                                          */
/* ------------------------------------------------------------------------- */

fn into_suggestions(lit: Literal) -> Result<Vec<Suggestion>, DecodeError> {
    let Literal::Seq(items) = lit else {
        return Err(DecodeError::NotAList);
    };

    // `["a.py", 3, "fix", "@@"]`: one flat record instead of a list of records.
    if matches!(items.first(), Some(Literal::Str(_))) {
        return Ok(vec![record(0, Literal::Seq(items))?]);
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, rec)| record(index, rec))
        .collect()
}

fn record(index: usize, rec: Literal) -> Result<Suggestion, DecodeError> {
    let Literal::Seq(fields) = rec else {
        return Err(DecodeError::FieldType {
            index,
            field: "record",
            expected: "a tuple or list",
        });
    };
    let [path, position, body, hunk]: [Literal; 4] = fields
        .try_into()
        .map_err(|f: Vec<Literal>| DecodeError::Arity {
            index,
            len: f.len(),
        })?;

    Ok(Suggestion {
        path: non_empty_text(index, "file path", path)?,
        position: position_of(index, position)?,
        body: non_empty_text(index, "comment", body)?,
        diff_hunk: match hunk {
            Literal::Str(s) => s,
            _ => {
                return Err(DecodeError::FieldType {
                    index,
                    field: "diff hunk",
                    expected: "a string",
                });
            }
        },
    })
}

fn non_empty_text(index: usize, field: &'static str, lit: Literal) -> Result<String, DecodeError> {
    match lit {
        Literal::Str(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(DecodeError::FieldType {
            index,
            field,
            expected: "a non-empty string",
        }),
    }
}

fn position_of(index: usize, lit: Literal) -> Result<u64, DecodeError> {
    let err = DecodeError::FieldType {
        index,
        field: "line number",
        expected: "a non-negative integer",
    };
    match lit {
        Literal::Int(n) => Ok(n),
        Literal::Str(s) => s.trim().parse::<u64>().map_err(|_| err),
        Literal::Seq(_) => Err(err),
    }
}
