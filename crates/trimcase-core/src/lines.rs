//! Line sequences: the opaque unit the engine shrinks.
//!
//! Lines are held without their `\n` terminator and always written back
//! newline-terminated. A `\r` before the newline stays part of the line, so
//! CRLF input round-trips byte for byte. Input must be UTF-8.

use std::io;
use std::path::Path;

/// Split text into lines, dropping each `\n` terminator.
#[must_use]
pub fn parse_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line).to_string())
        .collect()
}

/// Render lines as newline-terminated records.
#[must_use]
pub fn render_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let capacity = lines.iter().map(|l| l.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(capacity);
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

/// Read a file as a line sequence.
///
/// Input that is not UTF-8 fails with `InvalidData`, naming the byte offset
/// of the first bad sequence.
pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "input is not valid UTF-8 (first bad byte at offset {})",
                err.utf8_error().valid_up_to()
            ),
        )
    })?;
    Ok(parse_lines(&text))
}
