/*
 * rfc2047.rs
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

//! RFC 2047 encoded-words (`=?charset?q?text?=`) in header values and
//! RFC 2231 extended parameter values (`utf-8''%E2%82%AC`).

use encoding_rs::Encoding;

use crate::mime::base64;
use crate::mime::quoted_printable;

/// Bytes in `charset` to a string; unknown charsets are read as UTF-8, lossily.
fn charset_bytes_to_string(bytes: &[u8], charset: &str) -> String {
    // RFC 2231 allows a language suffix: charset*lang
    let label = charset.split('*').next().unwrap_or(charset).trim();
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding.decode_without_bom_handling(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Header value bytes to a string: UTF-8 when valid, otherwise ISO-8859-1.
pub fn header_bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Expand encoded-words in `s`. Whitespace between two adjacent encoded-words
/// is dropped; anything that does not parse as an encoded-word is kept.
pub fn decode_encoded_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut last_was_word = false;

    while let Some(start) = rest.find("=?") {
        let literal = &rest[..start];
        match decode_one_encoded_word(&rest[start..]) {
            Some((decoded, consumed)) => {
                if !(last_was_word && literal.trim().is_empty()) {
                    out.push_str(literal);
                }
                out.push_str(&decoded);
                rest = &rest[start + consumed..];
                last_was_word = true;
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
                last_was_word = false;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one encoded-word at the start of `s`. Returns (text, bytes consumed).
fn decode_one_encoded_word(s: &str) -> Option<(String, usize)> {
    let body = s.strip_prefix("=?")?;
    let q1 = body.find('?')?;
    let charset = &body[..q1];
    let marker = body.as_bytes().get(q1 + 1..q1 + 3)?;
    if marker[1] != b'?' {
        return None;
    }
    let encoding = marker[0].to_ascii_lowercase();
    let payload_and_rest = &body[q1 + 3..];
    let end = payload_and_rest.find("?=")?;
    let payload = &payload_and_rest[..end];
    if charset.is_empty() || payload.contains(' ') {
        return None;
    }
    let decoded_bytes = match encoding {
        b'b' => base64::decode(payload.as_bytes()),
        b'q' => decode_q(payload.as_bytes()),
        _ => return None,
    };
    let consumed = 2 + q1 + 3 + end + 2;
    Some((charset_bytes_to_string(&decoded_bytes, charset), consumed))
}

/// Q encoding: _ = space, rest is quoted-printable.
fn decode_q(payload: &[u8]) -> Vec<u8> {
    let preprocessed: Vec<u8> = payload
        .iter()
        .map(|&b| if b == b'_' { b' ' } else { b })
        .collect();
    quoted_printable::decode(&preprocessed)
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// RFC 2231 extended value: `charset'language'percent-encoded`. A value
/// without the two quotes is percent-decoded as UTF-8.
pub fn decode_extended_value(value: &str) -> String {
    let mut parts = value.splitn(3, '\'');
    let (charset, encoded) = match (parts.next(), parts.next(), parts.next()) {
        (Some(cs), Some(_lang), Some(text)) => (cs, text),
        _ => ("utf-8", value),
    };
    let bytes = encoded.as_bytes();
    let mut raw = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let high = bytes.get(i + 1).copied().and_then(hex_value);
            let low = bytes.get(i + 2).copied().and_then(hex_value);
            if let (Some(h), Some(l)) = (high, low) {
                raw.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        raw.push(bytes[i]);
        i += 1;
    }
    let charset = if charset.is_empty() { "utf-8" } else { charset };
    charset_bytes_to_string(&raw, charset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_b_and_q_words() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SGVsbG8=?="), "Hello");
        assert_eq!(decode_encoded_words("=?UTF-8?Q?Hello_World?="), "Hello World");
        assert_eq!(decode_encoded_words("=?iso-8859-1?q?caf=E9?="), "café");
    }

    #[test]
    fn adjacent_words_join_and_literals_survive() {
        assert_eq!(decode_encoded_words("Hello =?UTF-8?B?V29ybGQ=?=!"), "Hello World!");
        assert_eq!(decode_encoded_words("=?UTF-8?Q?a?= =?UTF-8?Q?b?="), "ab");
        assert_eq!(decode_encoded_words("1 + 1 =? 2"), "1 + 1 =? 2");
    }

    #[test]
    fn extended_values() {
        assert_eq!(decode_extended_value("UTF-8''%E2%82%AC%20rates"), "€ rates");
        assert_eq!(decode_extended_value("iso-8859-1'en'caf%E9"), "café");
        assert_eq!(decode_extended_value("100%"), "100%");
    }

    #[test]
    fn header_bytes_fallback() {
        assert_eq!(header_bytes_to_string("café".as_bytes()), "café");
        assert_eq!(header_bytes_to_string(b"caf\xe9"), "café");
    }
}
