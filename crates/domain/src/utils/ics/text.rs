//! RFC 5545 text value escaping.
//!
//! TEXT property values escape backslash, newline, comma and semicolon on
//! the wire; records hold the unescaped form.

/// Escape a text value for emission into an ICS property.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            // Stray carriage returns would corrupt the output framing.
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Unescape a text value read from an ICS property.
///
/// Unknown escapes degrade to the escaped character rather than failing;
/// malformed feeds are common.
pub fn unescape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
