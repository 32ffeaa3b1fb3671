/*
 * utils.rs
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

//! Byte-level helpers shared by the MIME modules: RFC 2045 tokens, RFC 2046
//! boundaries, and line splitting.

#[inline]
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`{|}~".contains(&c)
}

/// 1+ token chars.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

#[inline]
pub fn is_boundary_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&c)
}

/// 1 to 70 boundary chars, not ending in a space.
pub fn is_valid_boundary(boundary: &str) -> bool {
    let b = boundary.as_bytes();
    (1..=70).contains(&b.len()) && b.iter().copied().all(is_boundary_char) && !boundary.ends_with(' ')
}

/// Strip one trailing CRLF, LF or CR.
pub fn trim_line_ending(s: &[u8]) -> &[u8] {
    s.strip_suffix(b"\r\n")
        .or_else(|| s.strip_suffix(b"\n"))
        .or_else(|| s.strip_suffix(b"\r"))
        .unwrap_or(s)
}

/// Lines of `data`, each including its line ending.
pub fn lines_with_endings(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens() {
        assert!(is_token("multipart"));
        assert!(is_token("x-custom.type"));
        assert!(!is_token(""));
        assert!(!is_token("a b"));
        assert!(!is_token("a/b"));
    }

    #[test]
    fn boundaries() {
        assert!(is_valid_boundary("----=_Part_0_12345.67890"));
        assert!(is_valid_boundary("simple boundary"));
        assert!(!is_valid_boundary(""));
        assert!(!is_valid_boundary("trailing "));
        assert!(!is_valid_boundary(&"x".repeat(71)));
        assert!(!is_valid_boundary("semi;colon"));
    }

    #[test]
    fn line_helpers() {
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
        let lines: Vec<&[u8]> = lines_with_endings(b"a\r\nb\nc").collect();
        assert_eq!(lines, vec![&b"a\r\n"[..], &b"b\n"[..], &b"c"[..]]);
    }
}
