//! Ordered header fields.

use crate::error::{Error, Result};
use std::fmt;

/// Line length that rendering folds at when a value allows it
/// (RFC 5322 §2.1.1).
pub const MAX_LINE_LENGTH: usize = 78;

/// Ordered collection of header fields.
///
/// Fields keep their insertion order and original capitalization; name
/// lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Appends a header field.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains a bare CR or LF, which would inject extra header lines.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();

        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
            return Err(Error::InvalidHeader(name));
        }
        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidHeader(name));
        }

        self.fields.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a header block, stopping at the first empty line.
    ///
    /// Folded continuation lines are joined with a single space.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a field nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                let Some((_, value)) = fields.last_mut() else {
                    return Err(Error::InvalidHeader(line.to_string()));
                };
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
                continue;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
            fields.push((name.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self { fields })
    }
}

impl fmt::Display for Headers {
    /// Writes each field as `Name: value` followed by CRLF, folding lines
    /// longer than [`MAX_LINE_LENGTH`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            write!(f, "{name}:")?;
            write_folded(f, name.len() + 1, value)?;
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}

/// Writes ` value`, breaking before a space or after a comma whenever the
/// next piece would overrun the line. A piece too long on its own is
/// written unbroken.
fn write_folded(f: &mut fmt::Formatter<'_>, mut column: usize, value: &str) -> fmt::Result {
    let value = format!(" {value}");
    let mut line_empty = false;

    for piece in fold_pieces(&value) {
        if !line_empty && column + piece.len() > MAX_LINE_LENGTH {
            if piece.starts_with(' ') {
                f.write_str("\r\n")?;
                column = 0;
            } else {
                f.write_str("\r\n ")?;
                column = 1;
            }
            line_empty = true;
        }
        f.write_str(piece)?;
        column += piece.len();
        line_empty = line_empty && piece.trim().is_empty();
    }
    Ok(())
}

/// Splits a value before each space and after each comma.
fn fold_pieces(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, b) in value.bytes().enumerate() {
        if b == b' ' && i > start {
            pieces.push(&value[start..i]);
            start = i;
        } else if b == b',' {
            pieces.push(&value[start..=i]);
            start = i + 1;
        }
    }
    if start < value.len() {
        pieces.push(&value[start..]);
    }
    pieces
}
