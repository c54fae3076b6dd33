/// Bytes literal escaping and unescaping.
///
/// This module converts between:
/// - Runtime bytes (e.g., `[104, 105, 10]`)
/// - Source code bytes literals (e.g., `b"hi\n"` or `b"\x68\x69\x0a"`)
use core::fmt;

use super::string_literal::{UnescapeError, unescape};

/// Escape bytes for a bytes literal body.
///
/// - Printable ASCII characters (0x20-0x7E) are shown directly
/// - Common escape sequences use backslash notation (`\n`, `\r`, `\t`, `\"`, `\\`)
/// - Everything else uses hex notation (`\xNN`)
pub fn escape_bytes(f: &mut impl fmt::Write, bytes: &[u8]) -> fmt::Result {
    for &byte in bytes {
        match byte {
            b'"' => write!(f, "\\\"")?,
            b'\\' => write!(f, "\\\\")?,
            b'\n' => write!(f, "\\n")?,
            b'\r' => write!(f, "\\r")?,
            b'\t' => write!(f, "\\t")?,
            0x20..=0x7E => write!(f, "{}", byte as char)?,
            _ => write!(f, "\\x{:02x}", byte)?,
        }
    }
    Ok(())
}

/// Unescape the body of a bytes literal (without its prefix and quotes).
///
/// `\xHH` and octal escapes produce single raw bytes; other characters and
/// `\u` escapes contribute their UTF-8 encoding.
pub fn unescape_bytes(input: &str) -> Result<Vec<u8>, UnescapeError> {
    unescape(input, true)
}
