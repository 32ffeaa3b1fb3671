/*
 * tree.rs
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

//! MIME structure of a message, built once from its raw RFC 5322 bytes.
//!
//! Every node carries the IMAP section path that addresses it, so a renderer
//! can re-fetch a leaf from the server instead of using the bytes held here.
//! Numbering follows RFC 3501: the children of a multipart are numbered from
//! 1 under the multipart's own section, and the body of a non-multipart
//! message is part 1 of that message.

use super::content_type::{parse_content_disposition, parse_content_type, ContentType};
use super::headers::HeaderFields;
use super::rfc2047::decode_encoded_words;
use super::utils::{is_valid_boundary, lines_with_endings, trim_line_ending};
use crate::fetch::Encoding;

/// Nesting deeper than this is kept as an opaque single part.
const MAX_DEPTH: usize = 32;

/// What every node knows about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// IMAP section path; empty for the top-level message.
    pub section: String,
    /// Declared Content-Type, or the context default (text/plain, or
    /// message/rfc822 inside multipart/digest).
    pub content_type: ContentType,
    pub filename: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// A leaf. `body` is still transfer-encoded.
    Single {
        info: PartInfo,
        encoding: Encoding,
        charset: Option<String>,
        body: Vec<u8>,
    },
    Multipart {
        info: PartInfo,
        children: Vec<MimeNode>,
    },
    /// An embedded message (or the top-level one).
    Message {
        info: PartInfo,
        fields: Option<HeaderFields>,
        body: Option<Box<MimeNode>>,
    },
}

impl MimeNode {
    /// Build the tree of a complete message. The root is a `Message` node
    /// holding the top-level header fields.
    pub fn parse(raw: &[u8]) -> MimeNode {
        let (header, body) = split_header(raw);
        let fields = HeaderFields::parse(header);
        let content = message_body(&fields, body, "", 0);
        MimeNode::Message {
            info: PartInfo {
                section: String::new(),
                content_type: ContentType::new("message", "rfc822"),
                filename: None,
                description: None,
            },
            fields: Some(fields),
            body: Some(Box::new(content)),
        }
    }

    pub fn info(&self) -> &PartInfo {
        match self {
            MimeNode::Single { info, .. }
            | MimeNode::Multipart { info, .. }
            | MimeNode::Message { info, .. } => info,
        }
    }

    pub fn section(&self) -> &str {
        &self.info().section
    }

    pub fn content_type(&self) -> &ContentType {
        &self.info().content_type
    }

    /// A single part whose primary type is text.
    pub fn is_text(&self) -> bool {
        matches!(self, MimeNode::Single { info, .. } if info.content_type.is_primary_type("text"))
    }

    /// Depth-first search by section path.
    pub fn find(&self, section: &str) -> Option<&MimeNode> {
        if self.section() == section {
            return Some(self);
        }
        match self {
            MimeNode::Single { .. } => None,
            MimeNode::Multipart { children, .. } => children.iter().find_map(|c| c.find(section)),
            MimeNode::Message { body, .. } => body.as_deref().and_then(|b| b.find(section)),
        }
    }
}

fn child_section(prefix: &str, index: usize) -> String {
    if prefix.is_empty() {
        index.to_string()
    } else {
        format!("{}.{}", prefix, index)
    }
}

fn declared_type(fields: &HeaderFields, default: &ContentType) -> ContentType {
    fields
        .get("Content-Type")
        .and_then(parse_content_type)
        .unwrap_or_else(|| default.clone())
}

/// Boundary of a multipart type we will descend into.
fn multipart_boundary(content_type: &ContentType, depth: usize) -> Option<String> {
    if depth >= MAX_DEPTH || !content_type.is_primary_type("multipart") {
        return None;
    }
    content_type
        .parameter("boundary")
        .filter(|b| is_valid_boundary(b))
        .map(str::to_string)
}

/// The content of a message whose own section is `prefix`.
fn message_body(fields: &HeaderFields, body: &[u8], prefix: &str, depth: usize) -> MimeNode {
    let text_plain = ContentType::new("text", "plain");
    if multipart_boundary(&declared_type(fields, &text_plain), depth).is_some() {
        entity(fields, body, prefix.to_string(), &text_plain, depth)
    } else {
        entity(fields, body, child_section(prefix, 1), &text_plain, depth)
    }
}

fn entity(
    fields: &HeaderFields,
    body: &[u8],
    section: String,
    default_type: &ContentType,
    depth: usize,
) -> MimeNode {
    let content_type = declared_type(fields, default_type);
    let filename = fields
        .get("Content-Disposition")
        .and_then(parse_content_disposition)
        .and_then(|d| d.filename().map(str::to_string))
        .or_else(|| content_type.parameter("name").map(str::to_string));
    let description = fields
        .get("Content-Description")
        .map(decode_encoded_words)
        .filter(|d| !d.is_empty());

    if let Some(boundary) = multipart_boundary(&content_type, depth) {
        let child_default = if content_type.is_sub_type("digest") {
            ContentType::new("message", "rfc822")
        } else {
            ContentType::new("text", "plain")
        };
        let children = split_multipart(body, &boundary)
            .into_iter()
            .enumerate()
            .map(|(i, part)| {
                let (header, part_body) = split_header(part);
                let part_fields = HeaderFields::parse(header);
                entity(
                    &part_fields,
                    part_body,
                    child_section(&section, i + 1),
                    &child_default,
                    depth + 1,
                )
            })
            .collect();
        let info = PartInfo {
            section,
            content_type,
            filename,
            description,
        };
        return MimeNode::Multipart { info, children };
    }

    if depth < MAX_DEPTH && content_type.is_mime_type("message", "rfc822") {
        let (header, inner_body) = split_header(body);
        let inner_fields = HeaderFields::parse(header);
        let content = message_body(&inner_fields, inner_body, &section, depth + 1);
        let info = PartInfo {
            section,
            content_type,
            filename,
            description,
        };
        return MimeNode::Message {
            info,
            fields: Some(inner_fields),
            body: Some(Box::new(content)),
        };
    }

    let encoding = Encoding::from_label(fields.get("Content-Transfer-Encoding").unwrap_or(""));
    let charset = content_type.parameter("charset").map(str::to_string);
    MimeNode::Single {
        info: PartInfo {
            section,
            content_type,
            filename,
            description,
        },
        encoding,
        charset,
        body: body.to_vec(),
    }
}

/// Split an entity at its first blank line. Without one, everything is header.
pub fn split_header(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in lines_with_endings(raw) {
        if trim_line_ending(line).is_empty() {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}

/// Body parts of a multipart, without the preamble, epilogue, delimiter lines
/// and the line break that precedes each delimiter. A missing close delimiter
/// ends the last part at end of input.
pub fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;
    for line in lines_with_endings(body) {
        let content = trim_line_ending(line);
        if let Some(rest) = content.strip_prefix(delimiter.as_bytes()) {
            let closing = rest.starts_with(b"--");
            if closing || rest.iter().all(|b| *b == b' ' || *b == b'\t') {
                if let Some(s) = start {
                    let mut end = offset;
                    if end > s && body[end - 1] == b'\n' {
                        end -= 1;
                    }
                    if end > s && body[end - 1] == b'\r' {
                        end -= 1;
                    }
                    parts.push(&body[s..end]);
                }
                if closing {
                    return parts;
                }
                start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }
    if let Some(s) = start {
        parts.push(&body[s.min(body.len())..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(node: &MimeNode, out: &mut Vec<String>) {
        out.push(format!("{}={}", node.section(), node.content_type()));
        match node {
            MimeNode::Single { .. } => {}
            MimeNode::Multipart { children, .. } => children.iter().for_each(|c| sections(c, out)),
            MimeNode::Message { body, .. } => {
                if let Some(b) = body {
                    sections(b, out);
                }
            }
        }
    }

    fn layout(raw: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        sections(&MimeNode::parse(raw), &mut out);
        out
    }

    #[test]
    fn plain_message_is_part_one() {
        let raw = b"Subject: hi\r\nContent-Type: text/plain; charset=ISO-8859-1\r\n\r\nHello\r\n";
        let tree = MimeNode::parse(raw);
        assert_eq!(layout(raw), vec!["=message/rfc822", "1=text/plain"]);
        match tree.find("1") {
            Some(MimeNode::Single { charset, body, encoding, .. }) => {
                assert_eq!(charset.as_deref(), Some("ISO-8859-1"));
                assert_eq!(body, b"Hello\r\n");
                assert_eq!(*encoding, Encoding::SevenBit);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn nested_multiparts_and_messages() {
        let raw = b"Content-Type: multipart/mixed; boundary=outer\r\n\r\n\
preamble\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\r\n\
plain\r\n\
--inner\r\n\
Content-Type: text/html\r\n\r\n\
<p>html</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: message/rfc822\r\n\r\n\
Subject: inner\r\n\
Content-Type: multipart/mixed; boundary=m\r\n\r\n\
--m\r\n\r\n\
one\r\n\
--m\r\n\
Content-Type: image/png; name=dot.png\r\n\
Content-Transfer-Encoding: base64\r\n\r\n\
iVBORw0K\r\n\
--m--\r\n\
--outer\r\n\
Content-Type: message/rfc822\r\n\r\n\
Subject: flat\r\n\r\n\
flat body\r\n\
--outer--\r\n\
epilogue\r\n";
        assert_eq!(
            layout(raw),
            vec![
                "=message/rfc822",
                "=multipart/mixed",
                "1=multipart/alternative",
                "1.1=text/plain",
                "1.2=text/html",
                "2=message/rfc822",
                "2=multipart/mixed",
                "2.1=text/plain",
                "2.2=image/png",
                "3=message/rfc822",
                "3.1=text/plain",
            ]
        );
        let tree = MimeNode::parse(raw);
        match tree.find("1.1") {
            Some(MimeNode::Single { body, .. }) => assert_eq!(body, b"plain"),
            other => panic!("unexpected node {:?}", other),
        }
        match tree.find("2.2") {
            Some(MimeNode::Single { info, encoding, .. }) => {
                assert_eq!(info.filename.as_deref(), Some("dot.png"));
                assert_eq!(*encoding, Encoding::Base64);
            }
            other => panic!("unexpected node {:?}", other),
        }
        match tree.find("2") {
            Some(MimeNode::Message { fields: Some(fields), .. }) => {
                assert_eq!(fields.get("subject"), Some("inner"));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn digest_children_default_to_messages() {
        let raw = b"Content-Type: multipart/digest; boundary=d\r\n\r\n\
--d\r\n\r\n\
Subject: first\r\n\r\n\
text\r\n\
--d--\r\n";
        assert_eq!(
            layout(raw),
            vec!["=message/rfc822", "=multipart/digest", "1=message/rfc822", "1.1=text/plain"]
        );
    }

    #[test]
    fn invalid_boundary_is_single_part() {
        let raw = b"Content-Type: multipart/mixed\r\n\r\n--x\r\nbody\r\n--x--\r\n";
        let tree = MimeNode::parse(raw);
        match tree.find("1") {
            Some(MimeNode::Single { body, .. }) => assert_eq!(body, b"--x\r\nbody\r\n--x--\r\n"),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn split_multipart_edges() {
        let parts = split_multipart(b"--b\r\nA\r\n--b \r\nB\n--b--\r\nC", "b");
        assert_eq!(parts, vec![&b"A"[..], &b"B"[..]]);
        let unterminated = split_multipart(b"x\r\n--b\r\nlast\r\n", "b");
        assert_eq!(unterminated, vec![&b"last\r\n"[..]]);
        assert!(split_multipart(b"no delimiters", "b").is_empty());
        let lookalike = split_multipart(b"--b\r\n--bb\r\n--b--", "b");
        assert_eq!(lookalike, vec![&b"--bb"[..]]);
    }

    #[test]
    fn header_split_without_blank_line() {
        assert_eq!(split_header(b"A: 1\r\n"), (&b"A: 1\r\n"[..], &b""[..]));
        assert_eq!(split_header(b"\r\nbody"), (&b""[..], &b"body"[..]));
    }
}
