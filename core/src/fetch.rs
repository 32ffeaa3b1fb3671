/*
 * fetch.rs
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

//! Whole-message and section-addressed body fetches.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ImapError, RejectionKind};
use crate::mime::{base64, quoted_printable, uuencode};
use crate::protocol::imap::{FetchRange, FetchRequest, FetchResponse, MessageRef, Transport};
use crate::session::Session;

/// Dotted MIME part address ("1.2.3"). Empty addresses the whole message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SectionPath(Vec<u32>);

impl SectionPath {
    pub fn whole() -> Self {
        SectionPath(Vec::new())
    }

    /// Split on '.' and parse each part. A part that is not a non-negative
    /// integer becomes 0 and is logged; parsing never fails.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Self::whole();
        }
        let parts = s
            .split('.')
            .map(|token| {
                token.parse::<u32>().unwrap_or_else(|_| {
                    warn!("section path {:?}: part {:?} is not a number, using 0", s, token);
                    0
                })
            })
            .collect();
        SectionPath(parts)
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    pub fn is_whole(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for SectionPath {
    fn from(parts: Vec<u32>) -> Self {
        SectionPath(parts)
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

/// Content-Transfer-Encoding of a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
    Other,
    Uuencode,
}

impl Encoding {
    /// From a Content-Transfer-Encoding value (case-insensitive). Unknown values are `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "7bit" | "" => Encoding::SevenBit,
            "8bit" => Encoding::EightBit,
            "binary" => Encoding::Binary,
            "base64" => Encoding::Base64,
            "quoted-printable" => Encoding::QuotedPrintable,
            "uuencode" | "x-uuencode" | "x-uue" => Encoding::Uuencode,
            _ => Encoding::Other,
        }
    }
}

impl FromStr for Encoding {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Encoding::from_label(s))
    }
}

/// Transfer decoding function. Decoders are lenient and never fail.
pub type Decoder = fn(&[u8]) -> Vec<u8>;

/// Decoders by transfer encoding. An encoding without a decoder passes bytes through.
#[derive(Clone, Default)]
pub struct TransferDecoders {
    decoders: HashMap<Encoding, Decoder>,
}

impl TransferDecoders {
    /// No decoders: every encoding is passed through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// base64, quoted-printable and uuencode.
    pub fn standard() -> Self {
        let mut d = Self::empty();
        d.register(Encoding::Base64, base64::decode)
            .register(Encoding::QuotedPrintable, quoted_printable::decode)
            .register(Encoding::Uuencode, uuencode::decode);
        d
    }

    pub fn register(&mut self, encoding: Encoding, decoder: Decoder) -> &mut Self {
        self.decoders.insert(encoding, decoder);
        self
    }

    pub fn has_decoder(&self, encoding: Encoding) -> bool {
        self.decoders.contains_key(&encoding)
    }

    pub fn decode(&self, encoding: Encoding, data: Vec<u8>) -> Vec<u8> {
        match self.decoders.get(&encoding) {
            Some(decode) => decode(&data),
            None => data,
        }
    }
}

impl fmt::Debug for TransferDecoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys()).finish()
    }
}

/// Body bytes of the last body section. A present but empty section is a
/// valid (empty) body; only NIL or no section at all is an error. A UID fetch only considers
/// responses for that UID when the server reports one (unsolicited FETCH
/// responses for other messages may be interleaved).
fn extract_body(message: MessageRef, responses: Vec<FetchResponse>) -> Result<Vec<u8>, ImapError> {
    let body = responses
        .into_iter()
        .filter(|r| match (message, r.uid) {
            (MessageRef::Uid(uid), Some(got)) => uid == got,
            (MessageRef::Number(n), _) => r.seq == n,
            _ => true,
        })
        .flat_map(|r| r.body_sections)
        .last()
        .and_then(|s| s.data);
    body.ok_or_else(|| ImapError::Fetch(format!("no body returned for {:?}", message)))
}

impl<T: Transport> Session<T> {
    fn fetch_section(
        &mut self,
        folder: &str,
        message: MessageRef,
        section: SectionPath,
        range: FetchRange,
    ) -> Result<Vec<u8>, ImapError> {
        self.ensure_selected(folder)?;
        let request = FetchRequest {
            message,
            section,
            range,
        };
        let responses = match self.transport_mut().fetch(&request) {
            Ok(r) => r,
            Err(e) => return Err(self.fail(e, RejectionKind::Fetch)),
        };
        let body = extract_body(message, responses)?;
        debug!("fetched {} bytes: {}", body.len(), request.command());
        Ok(body)
    }

    /// The whole message, raw.
    pub fn fetch_message(&mut self, folder: &str, message: MessageRef) -> Result<Vec<u8>, ImapError> {
        self.fetch_section(folder, message, SectionPath::whole(), FetchRange::Whole)
    }

    /// One MIME part addressed by a dotted section path. A whole-part fetch
    /// is transfer-decoded according to `encoding`; a partial window is
    /// returned raw.
    pub fn fetch_attachment(
        &mut self,
        folder: &str,
        message: MessageRef,
        section: &str,
        encoding: Encoding,
        range: FetchRange,
    ) -> Result<Vec<u8>, ImapError> {
        let raw = self.fetch_section(folder, message, SectionPath::parse(section), range)?;
        Ok(match range {
            FetchRange::Whole => self.decoders.decode(encoding, raw),
            FetchRange::Partial { .. } => raw,
        })
    }

    /// One MIME part, never decoded.
    pub fn fetch_attachment_undecoded(
        &mut self,
        folder: &str,
        message: MessageRef,
        section: &str,
        range: FetchRange,
    ) -> Result<Vec<u8>, ImapError> {
        self.fetch_section(folder, message, SectionPath::parse(section), range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::imap::BodySection;

    #[test]
    fn section_path_parsing() {
        assert_eq!(SectionPath::parse("1.2.3").parts(), &[1, 2, 3]);
        assert_eq!(SectionPath::parse("1.2.3").to_string(), "1.2.3");
        assert!(SectionPath::parse("").is_whole());
        assert_eq!(SectionPath::parse("2.x.4").parts(), &[2, 0, 4]);
        assert_eq!(SectionPath::parse("-1").parts(), &[0]);
        assert_eq!(SectionPath::parse("1..2").parts(), &[1, 0, 2]);
    }

    #[test]
    fn encoding_labels() {
        assert_eq!(Encoding::from_label("BASE64"), Encoding::Base64);
        assert_eq!(Encoding::from_label("Quoted-Printable"), Encoding::QuotedPrintable);
        assert_eq!(Encoding::from_label("x-uuencode"), Encoding::Uuencode);
        assert_eq!(Encoding::from_label("x-custom"), Encoding::Other);
    }

    #[test]
    fn decoders_pass_through_when_unregistered() {
        let empty = TransferDecoders::empty();
        assert_eq!(empty.decode(Encoding::Base64, b"aGk=".to_vec()), b"aGk=");
        let std = TransferDecoders::standard();
        assert_eq!(std.decode(Encoding::Base64, b"aGk=".to_vec()), b"hi");
        assert_eq!(std.decode(Encoding::EightBit, b"aGk=".to_vec()), b"aGk=");
    }

    fn response(seq: u32, uid: Option<u32>, data: Option<&[u8]>) -> FetchResponse {
        FetchResponse {
            seq,
            uid,
            body_sections: vec![BodySection {
                section: String::new(),
                data: data.map(|d| d.to_vec()),
            }],
        }
    }

    #[test]
    fn extract_skips_other_messages() {
        let responses = vec![response(9, Some(5), Some(b"wanted")), response(3, Some(2), Some(b"other"))];
        assert_eq!(extract_body(MessageRef::Uid(5), responses).unwrap(), b"wanted");
    }

    #[test]
    fn extract_nil_or_missing_is_fetch_error() {
        let err = extract_body(MessageRef::Number(1), vec![response(1, None, None)]).unwrap_err();
        assert!(matches!(err, ImapError::Fetch(_)));
        let err = extract_body(MessageRef::Uid(1), Vec::new()).unwrap_err();
        assert!(matches!(err, ImapError::Fetch(_)));
    }

    #[test]
    fn extract_empty_literal_is_empty_body() {
        let body = extract_body(MessageRef::Uid(5), vec![response(1, Some(5), Some(b""))]).unwrap();
        assert!(body.is_empty());
    }
}
