/*
 * headers.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Recvmail, an IMAP mail retrieval client.
 *
 * Recvmail is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Recvmail is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Recvmail.  If not, see <http://www.gnu.org/licenses/>.
 */

//! RFC 5322 header fields of a message part, and their readable serialization.

use std::io::{self, Write};

use super::rfc2047::{decode_encoded_words, header_bytes_to_string};
use super::utils::{lines_with_endings, trim_line_ending};

const FOLD_WIDTH: usize = 78;

/// Header fields in message order. Values are unfolded but not decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields(Vec<(String, String)>);

impl HeaderFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a header block (everything before the blank line). Continuation
    /// lines are joined to the previous field; lines without a colon are skipped.
    pub fn parse(block: &[u8]) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();
        for line in lines_with_endings(block) {
            let line = trim_line_ending(line);
            if line.is_empty() {
                break;
            }
            if line[0] == b' ' || line[0] == b'\t' {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(' ');
                    value.push_str(header_bytes_to_string(line).trim());
                }
                continue;
            }
            let colon = match line.iter().position(|&b| b == b':') {
                Some(0) | None => continue,
                Some(i) => i,
            };
            let name = header_bytes_to_string(&line[..colon]).trim().to_string();
            let value = header_bytes_to_string(&line[colon + 1..]).trim().to_string();
            fields.push((name, value));
        }
        HeaderFields(fields)
    }

    /// First value of `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Write each field as `Name: value` with encoded-words decoded, folding long
/// lines at whitespace. Lines end in CRLF.
pub fn write_fields<W: Write + ?Sized>(out: &mut W, fields: &HeaderFields) -> io::Result<()> {
    for (name, value) in fields.iter() {
        let decoded = decode_encoded_words(value);
        let mut line = String::with_capacity(name.len() + decoded.len() + 2);
        line.push_str(name);
        line.push(':');
        let mut width = line.chars().count();
        for word in decoded.split_whitespace() {
            let len = word.chars().count();
            if width + 1 + len > FOLD_WIDTH && width > name.len() + 1 {
                line.push_str("\r\n ");
                width = 1;
            } else {
                line.push(' ');
                width += 1;
            }
            line.push_str(word);
            width += len;
        }
        line.push_str("\r\n");
        out.write_all(line.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unfolds_and_looks_up() {
        let fields = HeaderFields::parse(
            b"From: a@example.com\r\nSubject: one\r\n two\r\nX-Junk\r\nsubject: dup\r\n\r\nbody",
        );
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("SUBJECT"), Some("one two"));
        assert_eq!(fields.get("from"), Some("a@example.com"));
        assert_eq!(fields.get("To"), None);
    }

    #[test]
    fn write_decodes_encoded_words() {
        let mut fields = HeaderFields::new();
        fields.push("Subject", "=?UTF-8?Q?caf=C3=A9?= tonight");
        let mut out = Vec::new();
        write_fields(&mut out, &fields).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Subject: café tonight\r\n");
    }

    #[test]
    fn write_folds_long_values() {
        let mut fields = HeaderFields::new();
        fields.push("To", vec!["someone@example.com"; 6].join(", "));
        let mut out = Vec::new();
        write_fields(&mut out, &fields).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= FOLD_WIDTH));
        assert!(lines[1].starts_with(' '));
    }
}
