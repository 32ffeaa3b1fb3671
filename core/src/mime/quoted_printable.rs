/*
 * quoted_printable.rs
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

//! Quoted-Printable decoder for Content-Transfer-Encoding (RFC 2045).

const HEX_DECODE: [i8; 256] = {
    let mut t = [-1i8; 256];
    let mut i = 0u8;
    while i < 10 {
        t[(b'0' + i) as usize] = i as i8;
        i += 1;
    }
    let mut i = 0u8;
    while i < 6 {
        t[(b'A' + i) as usize] = (10 + i) as i8;
        t[(b'a' + i) as usize] = (10 + i) as i8;
        i += 1;
    }
    t
};

/// Decode a complete quoted-printable body. Handles =XX and soft line breaks
/// (=CRLF, =LF, with trailing whitespace before the break). A malformed
/// escape is copied through literally.
pub fn decode(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut pos = 0;
    while pos < src.len() {
        let b = src[pos];
        if b != b'=' {
            out.push(b);
            pos += 1;
            continue;
        }
        let hex1 = src.get(pos + 1).copied();
        let hex2 = src.get(pos + 2).copied();
        if let (Some(h1), Some(h2)) = (hex1, hex2) {
            let v1 = HEX_DECODE[h1 as usize];
            let v2 = HEX_DECODE[h2 as usize];
            if v1 >= 0 && v2 >= 0 {
                out.push(((v1 << 4) | v2) as u8);
                pos += 3;
                continue;
            }
        }
        // Soft line break, possibly after transport padding.
        let mut p = pos + 1;
        while p < src.len() && (src[p] == b' ' || src[p] == b'\t') {
            p += 1;
        }
        if src.get(p) == Some(&b'\n') {
            pos = p + 1;
            continue;
        }
        if src.get(p) == Some(&b'\r') && src.get(p + 1) == Some(&b'\n') {
            pos = p + 2;
            continue;
        }
        if p == src.len() {
            break;
        }
        out.push(b);
        pos += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn escapes_and_soft_breaks() {
        assert_eq!(decode(b"caf=C3=A9"), "café".as_bytes());
        assert_eq!(decode(b"long=\r\nline"), b"longline");
        assert_eq!(decode(b"long=  \nline"), b"longline");
        assert_eq!(decode(b"a=3d=3D"), b"a==");
    }

    #[test]
    fn malformed_escape_is_literal() {
        assert_eq!(decode(b"100=%"), b"100=%");
        assert_eq!(decode(b"end="), b"end");
    }
}
