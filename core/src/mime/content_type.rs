/*
 * content_type.rs
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

//! Content-Type (RFC 2045) and Content-Disposition (RFC 2183) header values.

use std::collections::HashMap;
use std::fmt;

use super::rfc2047::{decode_encoded_words, decode_extended_value};
use super::utils::is_token;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    primary_type: String,
    sub_type: String,
    parameter_map: HashMap<String, String>,
}

impl ContentType {
    pub fn new(primary_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            primary_type: primary_type.into(),
            sub_type: sub_type.into(),
            parameter_map: HashMap::new(),
        }
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn is_primary_type(&self, t: &str) -> bool {
        self.primary_type.eq_ignore_ascii_case(t)
    }

    pub fn is_sub_type(&self, t: &str) -> bool {
        self.sub_type.eq_ignore_ascii_case(t)
    }

    pub fn is_mime_type(&self, primary: &str, sub: &str) -> bool {
        self.is_primary_type(primary) && self.is_sub_type(sub)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameter_map.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary_type, self.sub_type)
    }
}

/// Parse a Content-Type header value.
pub fn parse_content_type(value: &str) -> Option<ContentType> {
    let value = value.trim();
    let (type_part, params_part) = match value.find(';') {
        Some(i) => (value[..i].trim(), &value[i + 1..]),
        None => (value, ""),
    };
    let slash = type_part.find('/')?;
    let primary = type_part[..slash].trim();
    let sub = type_part[slash + 1..].trim();
    if !is_token(primary) || !is_token(sub) {
        return None;
    }
    Some(ContentType {
        primary_type: primary.to_ascii_lowercase(),
        sub_type: sub.to_ascii_lowercase(),
        parameter_map: parse_parameter_list(params_part),
    })
}

/// Content-Disposition: a type (inline, attachment) and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: String,
    parameter_map: HashMap<String, String>,
}

impl ContentDisposition {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameter_map.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn filename(&self) -> Option<&str> {
        self.parameter("filename")
    }
}

pub fn parse_content_disposition(value: &str) -> Option<ContentDisposition> {
    let value = value.trim();
    let (disp_part, params_part) = match value.find(';') {
        Some(i) => (value[..i].trim(), &value[i + 1..]),
        None => (value, ""),
    };
    if !is_token(disp_part) {
        return None;
    }
    Some(ContentDisposition {
        disposition_type: disp_part.to_ascii_lowercase(),
        parameter_map: parse_parameter_list(params_part),
    })
}

/// Parse a semicolon-separated parameter list (name=value; name="value").
/// Names are lowercased. RFC 2231 extended values (`name*=charset''text`) are
/// decoded under the plain name; RFC 2047 encoded-words in quoted values are
/// decoded as many agents send them.
pub fn parse_parameter_list(params_part: &str) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    let bytes = params_part.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let eq = match bytes[pos..].iter().position(|&b| b == b'=') {
            Some(i) => pos + i,
            None => break,
        };
        let name = params_part[pos..eq].trim().to_ascii_lowercase();
        pos = eq + 1;
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = Vec::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1]);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c);
                    pos += 1;
                }
            }
            decode_encoded_words(&String::from_utf8_lossy(&v))
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| pos + i)
                .unwrap_or(len);
            let v = params_part[pos..end].trim().to_string();
            pos = end;
            v
        };
        if let Some(base) = name.strip_suffix('*') {
            parameters.insert(base.to_string(), decode_extended_value(&value));
        } else if is_token(&name) {
            parameters.entry(name).or_insert(value);
        }
    }
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_and_parameters() {
        let ct = parse_content_type("Text/Plain; charset=\"ISO-8859-1\"; format=flowed").unwrap();
        assert!(ct.is_mime_type("text", "plain"));
        assert_eq!(ct.parameter("CHARSET"), Some("ISO-8859-1"));
        assert_eq!(ct.parameter("format"), Some("flowed"));
        assert_eq!(ct.to_string(), "text/plain");
    }

    #[test]
    fn rejects_malformed_type() {
        assert!(parse_content_type("text").is_none());
        assert!(parse_content_type("te xt/plain").is_none());
    }

    #[test]
    fn disposition_filename_forms() {
        let d = parse_content_disposition("attachment; filename=\"report 1.pdf\"").unwrap();
        assert_eq!(d.disposition_type, "attachment");
        assert_eq!(d.filename(), Some("report 1.pdf"));

        let d = parse_content_disposition("attachment; filename*=UTF-8''caf%C3%A9.txt").unwrap();
        assert_eq!(d.filename(), Some("café.txt"));

        let d = parse_content_disposition("inline; filename=\"=?UTF-8?Q?r=C3=A9sum=C3=A9.doc?=\"").unwrap();
        assert_eq!(d.filename(), Some("résumé.doc"));
    }
}
