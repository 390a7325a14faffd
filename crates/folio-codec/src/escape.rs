//! Percent-style escaping of the row delimiter.
//!
//! The delimiter becomes `%2C` (the URI encoding of a comma). The escape
//! character and line breaks are escaped too, otherwise a literal `%2C` in a
//! value would not survive a round trip and a newline would split the row.
//! Unknown `%XY` sequences are left untouched on unescape.

use std::borrow::Cow;

/// Field separator within a row.
pub const DELIMITER: char = ',';

const ESCAPES: [(char, &str); 4] = [('%', "%25"), (',', "%2C"), ('\n', "%0A"), ('\r', "%0D")];

/// Escape a raw string into a delimiter-safe token.
pub fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains(|c: char| ESCAPES.iter().any(|(e, _)| *e == c)) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match ESCAPES.iter().find(|(e, _)| *e == c) {
            Some((_, code)) => out.push_str(code),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Reverse [`escape`].
pub fn unescape(token: &str) -> Cow<'_, str> {
    if !token.contains('%') {
        return Cow::Borrowed(token);
    }
    let mut out = String::with_capacity(token.len());
    let mut rest = token;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ESCAPES.iter().find(|(_, code)| tail.starts_with(code)) {
            Some((c, code)) => {
                out.push(*c);
                rest = &tail[code.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
