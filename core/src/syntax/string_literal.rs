/// String literal escaping and unescaping.
///
/// This module converts between:
/// - Runtime strings (e.g., "hello\n" with an actual newline character)
/// - Source code string literals (e.g., "hello\n" with a backslash-n sequence)
use core::fmt;

/// Errors that can occur when unescaping string or bytes literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnescapeError {
    /// Invalid escape sequence (e.g., `\q`)
    InvalidEscape { pos: usize, seq: String },
    /// Invalid hex digit in a `\x`, `\u` or `\U` escape
    InvalidHexDigit { pos: usize, seq: String },
    /// Incomplete escape (not enough digits)
    IncompleteEscape {
        pos: usize,
        expected: usize,
        got: usize,
    },
    /// Invalid Unicode scalar value
    InvalidUnicodeScalar { pos: usize, value: u32 },
}

impl fmt::Display for UnescapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnescapeError::InvalidEscape { pos, seq } => {
                write!(f, "invalid escape sequence '{}' at position {}", seq, pos)
            }
            UnescapeError::InvalidHexDigit { pos, seq } => {
                write!(f, "invalid hex digit in '{}' at position {}", seq, pos)
            }
            UnescapeError::IncompleteEscape { pos, expected, got } => {
                write!(
                    f,
                    "incomplete escape at position {}: expected {} digits, got {}",
                    pos, expected, got
                )
            }
            UnescapeError::InvalidUnicodeScalar { pos, value } => {
                write!(
                    f,
                    "invalid Unicode scalar value U+{:X} at position {}",
                    value, pos
                )
            }
        }
    }
}

/// Escape special characters for a double-quoted string literal.
///
/// - `"` → `\"`
/// - `\` → `\\`
/// - `\n`, `\r`, `\t` → their backslash forms
/// - Other control characters → `\uNNNN`
pub fn escape_string(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Unescape the body of a string literal (without its quotes).
///
/// Supports:
/// - Single-character escapes: `\a \b \f \n \r \t \v \\ \" \' \` \?`
/// - Hex escapes `\xHH` and octal escapes `\ooo`, both naming a code point
/// - Unicode escapes `\uNNNN` and `\UNNNNNNNN`
/// - `\0` on its own as NUL
pub fn unescape_string(input: &str) -> Result<String, UnescapeError> {
    if !input.contains('\\') {
        return Ok(input.to_string());
    }
    let bytes = unescape(input, false)?;
    // Only chars are pushed in string mode, so the buffer is valid UTF-8.
    String::from_utf8(bytes).map_err(|_| UnescapeError::InvalidEscape {
        pos: 0,
        seq: input.to_string(),
    })
}

/// Shared escape processor.
///
/// In bytes mode `\x` and octal escapes produce a single raw byte; in string
/// mode they produce the UTF-8 encoding of the code point.
pub(crate) fn unescape(input: &str, bytes_mode: bool) -> Result<Vec<u8>, UnescapeError> {
    let mut output = Vec::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut buf = [0u8; 4];

    while let Some((pos, ch)) = chars.next() {
        if ch != '\\' {
            output.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let simple = |b: u8| Some(b);
        let escaped = match chars.next() {
            Some((_, 'a')) => simple(0x07),
            Some((_, 'b')) => simple(0x08),
            Some((_, 'f')) => simple(0x0c),
            Some((_, 'n')) => simple(b'\n'),
            Some((_, 'r')) => simple(b'\r'),
            Some((_, 't')) => simple(b'\t'),
            Some((_, 'v')) => simple(0x0b),
            Some((_, '\\')) => simple(b'\\'),
            Some((_, '"')) => simple(b'"'),
            Some((_, '\'')) => simple(b'\''),
            Some((_, '`')) => simple(b'`'),
            Some((_, '?')) => simple(b'?'),
            Some((_, 'x')) | Some((_, 'X')) => {
                let value = read_hex(&mut chars, pos, 2, "\\x")?;
                push_code(&mut output, value, bytes_mode, pos)?;
                None
            }
            Some((_, 'u')) => {
                let value = read_hex(&mut chars, pos, 4, "\\u")?;
                push_char(&mut output, value, pos)?;
                None
            }
            Some((_, 'U')) => {
                let value = read_hex(&mut chars, pos, 8, "\\U")?;
                push_char(&mut output, value, pos)?;
                None
            }
            Some((_, first @ '0'..='3')) => {
                let mut value = first as u32 - '0' as u32;
                let mut digits = 1;
                while digits < 3 {
                    match chars.peek() {
                        Some((_, c @ '0'..='7')) => {
                            value = value * 8 + (*c as u32 - '0' as u32);
                            chars.next();
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                if digits == 1 && first == '0' {
                    simple(0)
                } else if digits < 3 {
                    return Err(UnescapeError::IncompleteEscape {
                        pos,
                        expected: 3,
                        got: digits,
                    });
                } else {
                    push_code(&mut output, value, bytes_mode, pos)?;
                    None
                }
            }
            Some((_, other)) => {
                return Err(UnescapeError::InvalidEscape {
                    pos,
                    seq: format!("\\{}", other),
                });
            }
            None => {
                return Err(UnescapeError::InvalidEscape {
                    pos,
                    seq: "\\".to_string(),
                });
            }
        };
        if let Some(b) = escaped {
            output.push(b);
        }
    }

    Ok(output)
}

fn read_hex(
    chars: &mut core::iter::Peekable<core::str::CharIndices<'_>>,
    pos: usize,
    count: usize,
    prefix: &str,
) -> Result<u32, UnescapeError> {
    let mut value = 0u32;
    for got in 0..count {
        match chars.next() {
            Some((_, ch)) => match ch.to_digit(16) {
                Some(digit) => value = (value << 4) | digit,
                None => {
                    return Err(UnescapeError::InvalidHexDigit {
                        pos,
                        seq: format!("{}{}", prefix, ch),
                    });
                }
            },
            None => {
                return Err(UnescapeError::IncompleteEscape {
                    pos,
                    expected: count,
                    got,
                });
            }
        }
    }
    Ok(value)
}

fn push_code(
    output: &mut Vec<u8>,
    value: u32,
    bytes_mode: bool,
    pos: usize,
) -> Result<(), UnescapeError> {
    if bytes_mode {
        // Two hex digits or three octal digits starting 0-3 always fit a byte.
        output.push(value as u8);
        Ok(())
    } else {
        push_char(output, value, pos)
    }
}

fn push_char(output: &mut Vec<u8>, value: u32, pos: usize) -> Result<(), UnescapeError> {
    let ch = char::from_u32(value).ok_or(UnescapeError::InvalidUnicodeScalar { pos, value })?;
    let mut buf = [0u8; 4];
    output.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    Ok(())
}
