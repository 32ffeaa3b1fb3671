/*
 * uuencode.rs
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

//! uuencode decoder (x-uuencode transfer encoding).

fn sixbit(c: u8) -> u32 {
    (c.wrapping_sub(b' ') & 0x3f) as u32
}

/// Decode uuencoded data. Lines before `begin` are skipped when a `begin`
/// line is present; decoding stops at `end` or a zero-length line.
pub fn decode(src: &[u8]) -> Vec<u8> {
    let lines: Vec<&[u8]> = src
        .split(|&b| b == b'\n')
        .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
        .collect();
    let start = lines
        .iter()
        .position(|l| l.starts_with(b"begin "))
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut out = Vec::new();
    for line in &lines[start..] {
        if line.is_empty() {
            continue;
        }
        if *line == b"end" {
            break;
        }
        let len = sixbit(line[0]) as usize;
        if len == 0 {
            break;
        }
        let mut decoded = Vec::with_capacity(len + 2);
        for chunk in line[1..].chunks(4) {
            let mut n = 0u32;
            for i in 0..4 {
                n = (n << 6) | chunk.get(i).copied().map(sixbit).unwrap_or(0);
            }
            decoded.push((n >> 16) as u8);
            decoded.push((n >> 8) as u8);
            decoded.push(n as u8);
        }
        decoded.truncate(len);
        out.extend_from_slice(&decoded);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn decodes_with_header() {
        let data = b"begin 644 cat.txt\n#0V%T\n`\nend\n";
        assert_eq!(decode(data), b"Cat");
    }

    #[test]
    fn decodes_without_header() {
        assert_eq!(decode(b"#0V%T\r\n`\r\n"), b"Cat");
    }
}
