/*
 * render.rs
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

//! Text rendition of a MIME tree.
//!
//! Text leaves are transfer-decoded and converted to the destination charset;
//! other leaves are replaced by a placeholder. Of a multipart/alternative only
//! the preferred child is shown (text/plain, then any text, then the first).

use std::io::Write;

use tracing::{debug, warn};

use super::charset::{CharsetConverter, EncodingRsConverter, DEFAULT_CHARSET};
use super::headers::write_fields;
use super::tree::{MimeNode, PartInfo};
use crate::error::ImapError;
use crate::fetch::{Encoding, TransferDecoders};
use crate::protocol::imap::{FetchRange, MessageRef, Transport};
use crate::session::Session;

/// Supplies the raw (transfer-encoded) bytes of a part by section path.
pub trait PartSource {
    fn fetch_part(&mut self, section: &str) -> Result<Vec<u8>, ImapError>;
}

/// Fetches parts of one message through a session.
pub struct SessionPartSource<'a, T: Transport> {
    session: &'a mut Session<T>,
    folder: String,
    message: MessageRef,
}

impl<'a, T: Transport> SessionPartSource<'a, T> {
    pub fn new(session: &'a mut Session<T>, folder: impl Into<String>, message: MessageRef) -> Self {
        Self {
            session,
            folder: folder.into(),
            message,
        }
    }
}

impl<T: Transport> PartSource for SessionPartSource<'_, T> {
    fn fetch_part(&mut self, section: &str) -> Result<Vec<u8>, ImapError> {
        self.session
            .fetch_attachment_undecoded(&self.folder, self.message, section, FetchRange::Whole)
    }
}

pub struct MimeRenderer<C = EncodingRsConverter> {
    converter: C,
    decoders: TransferDecoders,
    dest_charset: String,
}

impl MimeRenderer<EncodingRsConverter> {
    pub fn new() -> Self {
        Self::with_converter(EncodingRsConverter)
    }
}

impl Default for MimeRenderer<EncodingRsConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CharsetConverter> MimeRenderer<C> {
    pub fn with_converter(converter: C) -> Self {
        Self {
            converter,
            decoders: TransferDecoders::standard(),
            dest_charset: DEFAULT_CHARSET.to_string(),
        }
    }

    pub fn decoders(mut self, decoders: TransferDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    /// Charset of the rendered text; also assumed for parts that declare none.
    pub fn dest_charset(mut self, charset: &str) -> Self {
        self.dest_charset = charset.to_string();
        self
    }

    /// Render `node` and everything below it. With a `source`, text leaves are
    /// fetched from it; otherwise the bytes held in the tree are used. The first
    /// error aborts the rendition.
    pub fn render<W: Write + ?Sized>(
        &self,
        out: &mut W,
        node: &MimeNode,
        source: Option<&mut dyn PartSource>,
    ) -> Result<(), ImapError> {
        let mut source = source;
        self.render_node(out, node, &mut source)
    }

    fn render_node<W: Write + ?Sized>(
        &self,
        out: &mut W,
        node: &MimeNode,
        source: &mut Option<&mut dyn PartSource>,
    ) -> Result<(), ImapError> {
        write_part_info(out, node.info())?;
        match node {
            MimeNode::Single {
                info,
                encoding,
                charset,
                body,
            } => {
                if node.is_text() {
                    self.render_text(out, info, *encoding, charset.as_deref(), body, source)?;
                } else {
                    out.write_all(b"   (not shown)\n\n")?;
                }
            }
            MimeNode::Multipart { info, children } if info.content_type.is_sub_type("alternative") => {
                if let Some(preferred) = preferred_alternative(children) {
                    debug!(
                        "alternative {}: showing {}",
                        info.section,
                        preferred.content_type()
                    );
                    self.render_node(out, preferred, source)?;
                }
            }
            MimeNode::Multipart { children, .. } => {
                for child in children {
                    self.render_node(out, child, source)?;
                }
            }
            MimeNode::Message { fields, body, .. } => {
                if let Some(fields) = fields {
                    write_fields(out, fields)?;
                    out.write_all(b"\r\n")?;
                }
                if let Some(body) = body {
                    self.render_node(out, body, source)?;
                }
            }
        }
        Ok(())
    }

    fn render_text<W: Write + ?Sized>(
        &self,
        out: &mut W,
        info: &PartInfo,
        encoding: Encoding,
        charset: Option<&str>,
        body: &[u8],
        source: &mut Option<&mut dyn PartSource>,
    ) -> Result<(), ImapError> {
        let raw = match source {
            Some(src) => src.fetch_part(&info.section)?,
            None => body.to_vec(),
        };
        let data = self.decoders.decode(encoding, raw);
        let from = charset.unwrap_or(&self.dest_charset);
        match self.converter.convert(from, &self.dest_charset, &data) {
            Ok(converted) => out.write_all(&converted)?,
            Err(e) => {
                warn!("part {}: {}", info.section, e);
                writeln!(
                    out,
                    "[ error converting charset from {} to {} ]",
                    from, self.dest_charset
                )?;
                out.write_all(&data)?;
            }
        }
        out.write_all(b"\r\n\r\n")?;
        Ok(())
    }
}

/// ` [ Part type/subtype (filename) : description ]` for parts that have a
/// filename or a description.
fn write_part_info<W: Write + ?Sized>(out: &mut W, info: &PartInfo) -> std::io::Result<()> {
    if info.filename.is_none() && info.description.is_none() {
        return Ok(());
    }
    write!(out, " [ Part {}", info.content_type)?;
    if let Some(filename) = &info.filename {
        write!(out, " ({})", filename)?;
    }
    if let Some(description) = &info.description {
        write!(out, " : {}", description)?;
    }
    out.write_all(b" ]\n\n")
}

fn alternative_score(node: &MimeNode) -> u8 {
    if node.content_type().is_sub_type("plain") {
        3
    } else if node.is_text() {
        2
    } else {
        1
    }
}

/// Highest score wins; the first of equals is kept.
fn preferred_alternative(children: &[MimeNode]) -> Option<&MimeNode> {
    let mut best: Option<(&MimeNode, u8)> = None;
    for child in children {
        let score = alternative_score(child);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((child, score));
        }
    }
    best.map(|(node, _)| node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::charset::ConversionError;
    use crate::mime::content_type::ContentType;
    use crate::mime::headers::HeaderFields;

    fn leaf(section: &str, primary: &str, sub: &str, body: &str) -> MimeNode {
        MimeNode::Single {
            info: PartInfo {
                section: section.to_string(),
                content_type: ContentType::new(primary, sub),
                filename: None,
                description: None,
            },
            encoding: Encoding::SevenBit,
            charset: None,
            body: body.as_bytes().to_vec(),
        }
    }

    fn multipart(section: &str, sub: &str, children: Vec<MimeNode>) -> MimeNode {
        MimeNode::Multipart {
            info: PartInfo {
                section: section.to_string(),
                content_type: ContentType::new("multipart", sub),
                filename: None,
                description: None,
            },
            children,
        }
    }

    fn render(node: &MimeNode) -> String {
        let mut out = Vec::new();
        MimeRenderer::new().render(&mut out, node, None).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn alternative_prefers_plain_then_text() {
        let tree = multipart(
            "",
            "alternative",
            vec![
                leaf("1", "image", "png", "PNG"),
                leaf("2", "text", "html", "<b>html</b>"),
                leaf("3", "text", "plain", "plain"),
            ],
        );
        assert_eq!(render(&tree), "plain\r\n\r\n");

        let tree = multipart(
            "",
            "alternative",
            vec![
                leaf("1", "image", "png", "PNG"),
                leaf("2", "text", "html", "first"),
                leaf("3", "text", "rfc822-headers", "second"),
            ],
        );
        assert_eq!(render(&tree), "first\r\n\r\n");
    }

    #[test]
    fn mixed_renders_every_child() {
        let tree = multipart(
            "",
            "mixed",
            vec![leaf("1", "text", "plain", "one"), leaf("2", "application", "pdf", "%PDF")],
        );
        assert_eq!(render(&tree), "one\r\n\r\n   (not shown)\n\n");
    }

    #[test]
    fn conversion_failure_falls_back_to_raw_bytes() {
        let mut bad = leaf("1", "text", "plain", "");
        if let MimeNode::Single { charset, body, .. } = &mut bad {
            *charset = Some("x-unknown".to_string());
            *body = b"caf\xe9".to_vec();
        }
        let tree = multipart("", "mixed", vec![bad, leaf("2", "text", "plain", "next")]);
        let mut out = Vec::new();
        MimeRenderer::new().render(&mut out, &tree, None).unwrap();
        let mut expected = b"[ error converting charset from x-unknown to utf-8 ]\ncaf\xe9\r\n\r\n".to_vec();
        expected.extend_from_slice(b"next\r\n\r\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn message_headers_then_body() {
        let mut fields = HeaderFields::new();
        fields.push("From", "a@example.com");
        fields.push("Subject", "=?UTF-8?B?SGVsbG8=?=");
        let tree = MimeNode::Message {
            info: PartInfo {
                section: String::new(),
                content_type: ContentType::new("message", "rfc822"),
                filename: None,
                description: None,
            },
            fields: Some(fields),
            body: Some(Box::new(leaf("1", "text", "plain", "body"))),
        };
        assert_eq!(
            render(&tree),
            "From: a@example.com\r\nSubject: Hello\r\n\r\nbody\r\n\r\n"
        );
    }

    #[test]
    fn part_info_and_transfer_decoding() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
--b\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
Content-Description: note\r\n\r\n\
caf=E9\r\n\
--b\r\n\
Content-Type: image/png\r\n\
Content-Disposition: attachment; filename=\"dot.png\"\r\n\
Content-Transfer-Encoding: base64\r\n\r\n\
iVBORw0K\r\n\
--b--\r\n";
        let tree = MimeNode::parse(raw);
        let text = render(&tree);
        assert_eq!(
            text,
            "Content-Type: multipart/mixed; boundary=b\r\n\r\n \
[ Part text/plain : note ]\n\ncafé\r\n\r\n \
[ Part image/png (dot.png) ]\n\n   (not shown)\n\n"
        );
    }

    struct Recorder {
        requested: Vec<String>,
        fail: bool,
    }

    impl PartSource for Recorder {
        fn fetch_part(&mut self, section: &str) -> Result<Vec<u8>, ImapError> {
            self.requested.push(section.to_string());
            if self.fail {
                Err(ImapError::Fetch(section.to_string()))
            } else {
                Ok(format!("fetched {}", section).into_bytes())
            }
        }
    }

    #[test]
    fn source_supplies_text_leaves_only() {
        let tree = multipart(
            "",
            "mixed",
            vec![leaf("1", "text", "plain", "stale"), leaf("2", "image", "gif", "GIF")],
        );
        let mut source = Recorder {
            requested: Vec::new(),
            fail: false,
        };
        let mut out = Vec::new();
        MimeRenderer::new()
            .render(&mut out, &tree, Some(&mut source as &mut dyn PartSource))
            .unwrap();
        assert_eq!(source.requested, vec!["1"]);
        assert_eq!(out, b"fetched 1\r\n\r\n   (not shown)\n\n");
    }

    #[test]
    fn first_error_aborts() {
        let tree = multipart(
            "",
            "mixed",
            vec![leaf("1", "text", "plain", "a"), leaf("2", "text", "plain", "b")],
        );
        let mut source = Recorder {
            requested: Vec::new(),
            fail: true,
        };
        let mut out = Vec::new();
        let err = MimeRenderer::new()
            .render(&mut out, &tree, Some(&mut source as &mut dyn PartSource))
            .unwrap_err();
        assert!(matches!(err, ImapError::Fetch(_)));
        assert_eq!(source.requested, vec!["1"]);
        assert!(out.is_empty());
    }

    struct Refuse;

    impl CharsetConverter for Refuse {
        fn convert(&self, from: &str, _to: &str, _input: &[u8]) -> Result<Vec<u8>, ConversionError> {
            Err(ConversionError::UnknownCharset(from.to_string()))
        }
    }

    #[test]
    fn custom_converter_and_destination() {
        let mut out = Vec::new();
        MimeRenderer::with_converter(Refuse)
            .dest_charset("iso-8859-1")
            .render(&mut out, &leaf("1", "text", "plain", "x"), None)
            .unwrap();
        assert_eq!(
            out,
            b"[ error converting charset from iso-8859-1 to iso-8859-1 ]\nx\r\n\r\n"
        );
    }
}
