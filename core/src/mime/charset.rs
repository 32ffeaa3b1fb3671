/*
 * charset.rs
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

//! Charset conversion for rendered text parts.

use encoding_rs::Encoding;
use thiserror::Error;

/// Destination charset of rendered output.
pub const DEFAULT_CHARSET: &str = "utf-8";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown charset {0}")]
    UnknownCharset(String),
    #[error("malformed {charset} input")]
    Malformed { charset: String },
    #[error("characters not representable in {charset}")]
    Unmappable { charset: String },
}

/// Converts bytes between two charsets.
pub trait CharsetConverter {
    fn convert(&self, from: &str, to: &str, input: &[u8]) -> Result<Vec<u8>, ConversionError>;
}

/// Converter backed by `encoding_rs` (WHATWG labels). Decoding is strict.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsConverter;

fn lookup(label: &str) -> Result<&'static Encoding, ConversionError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConversionError::UnknownCharset(label.to_string()))
}

impl CharsetConverter for EncodingRsConverter {
    fn convert(&self, from: &str, to: &str, input: &[u8]) -> Result<Vec<u8>, ConversionError> {
        let source = lookup(from)?;
        let target = lookup(to)?;
        let (text, had_errors) = source.decode_without_bom_handling(input);
        if had_errors {
            return Err(ConversionError::Malformed {
                charset: source.name().to_string(),
            });
        }
        if target == encoding_rs::UTF_8 {
            return Ok(text.into_owned().into_bytes());
        }
        let (bytes, _, unmappable) = target.encode(&text);
        if unmappable {
            return Err(ConversionError::Unmappable {
                charset: target.name().to_string(),
            });
        }
        Ok(bytes.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_to_utf8() {
        let out = EncodingRsConverter.convert("ISO-8859-1", "utf-8", b"caf\xe9").unwrap();
        assert_eq!(out, "café".as_bytes());
    }

    #[test]
    fn utf8_passthrough() {
        let out = EncodingRsConverter.convert("utf-8", "UTF-8", "naïve".as_bytes()).unwrap();
        assert_eq!(out, "naïve".as_bytes());
    }

    #[test]
    fn failures() {
        assert_eq!(
            EncodingRsConverter.convert("x-klingon", "utf-8", b"abc"),
            Err(ConversionError::UnknownCharset("x-klingon".into()))
        );
        assert!(matches!(
            EncodingRsConverter.convert("utf-8", "utf-8", b"\xff\xfe"),
            Err(ConversionError::Malformed { .. })
        ));
        assert!(matches!(
            EncodingRsConverter.convert("utf-8", "iso-8859-1", "€ and ✓".as_bytes()),
            Err(ConversionError::Unmappable { .. })
        ));
    }
}
