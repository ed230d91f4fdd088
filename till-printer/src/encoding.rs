//! Code-page utilities for Latin thermal printers
//!
//! Receipt hardware in this product line speaks a Windows-1252-class
//! single-byte code page. This module provides:
//! - Converting UTF-8 text to that code page with substitution
//! - Width/pad/truncate helpers for the fixed character grid
//! - Currency-symbol sanitization for the raw USB path

use std::borrow::Cow;

/// Substituted for characters the printer code page cannot represent
const SUBSTITUTE: u8 = b'?';

/// Convert a string to the printer's code page
///
/// ASCII passes through untouched (protecting any embedded control
/// bytes); everything else goes through Windows-1252, with unmappable
/// characters substituted rather than dropped.
pub fn encode_code_page(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let mut buf = [0u8; 4];
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors {
            out.push(SUBSTITUTE);
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

/// Grid width of a string on the printer
///
/// Every code-page character occupies one cell, so this is the char count.
pub fn grid_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to at most `max_width` grid cells
pub fn truncate_grid(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad (or truncate) a string to exactly `width` grid cells
pub fn pad_grid(s: &str, width: usize, align_right: bool) -> String {
    let current = grid_width(s);
    if current >= width {
        return truncate_grid(s, width);
    }
    let spaces = " ".repeat(width - current);
    if align_right {
        format!("{spaces}{s}")
    } else {
        format!("{s}{spaces}")
    }
}

/// Replace a non-ASCII currency symbol with an ASCII fallback
///
/// Applies to the raw/USB formatting path only; the HTML path renders the
/// configured symbol as-is. Never written back to settings.
pub fn sanitize_currency<'a>(symbol: &'a str, fallback: &'a str) -> Cow<'a, str> {
    if symbol.is_ascii() && !symbol.is_empty() {
        Cow::Borrowed(symbol)
    } else {
        Cow::Borrowed(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii_passthrough() {
        assert_eq!(encode_code_page("TOTAL $15.99"), b"TOTAL $15.99");
    }

    #[test]
    fn test_encode_latin1_accents() {
        // é is 0xE9 in Windows-1252
        assert_eq!(encode_code_page("café"), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_encode_substitutes_unmappable() {
        assert_eq!(encode_code_page("₹100"), vec![b'?', b'1', b'0', b'0']);
    }

    #[test]
    fn test_pad_grid() {
        assert_eq!(pad_grid("hi", 5, false), "hi   ");
        assert_eq!(pad_grid("hi", 5, true), "   hi");
        assert_eq!(pad_grid("hello world", 5, false), "hello");
    }

    #[test]
    fn test_sanitize_currency() {
        assert_eq!(sanitize_currency("$", "USD"), "$");
        assert_eq!(sanitize_currency("₹", "INR"), "INR");
        assert_eq!(sanitize_currency("", "USD"), "USD");
    }
}
