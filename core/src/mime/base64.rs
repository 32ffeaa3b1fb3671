/*
 * base64.rs
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

//! Base64 decoder for Content-Transfer-Encoding (RFC 2045).

use std::sync::OnceLock;

const INVALID: i8 = -1;
const WHITESPACE: i8 = -2;

fn decode_table() -> &'static [i8; 256] {
    static TABLE: OnceLock<[i8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [INVALID; 256];
        for ws in [b' ', b'\t', b'\r', b'\n'] {
            t[ws as usize] = WHITESPACE;
        }
        for i in 0..26u8 {
            t[(b'A' + i) as usize] = i as i8;
            t[(b'a' + i) as usize] = (26 + i) as i8;
        }
        for i in 0..10u8 {
            t[(b'0' + i) as usize] = (52 + i) as i8;
        }
        t[b'+' as usize] = 62;
        t[b'/' as usize] = 63;
        t
    })
}

/// Decode a complete base64 body. Whitespace and characters outside the
/// alphabet are skipped; decoding stops at the first '='.
pub fn decode(src: &[u8]) -> Vec<u8> {
    let table = decode_table();
    let mut out = Vec::with_capacity(src.len() / 4 * 3 + 3);
    let mut quantum: u32 = 0;
    let mut quantum_bits: u32 = 0;

    for &b in src {
        if b == b'=' {
            break;
        }
        let val = table[b as usize];
        if val < 0 {
            continue;
        }
        quantum = (quantum << 6) | val as u32;
        quantum_bits += 6;
        if quantum_bits == 24 {
            out.push((quantum >> 16) as u8);
            out.push((quantum >> 8) as u8);
            out.push(quantum as u8);
            quantum = 0;
            quantum_bits = 0;
        }
    }

    if quantum_bits >= 12 {
        out.push((quantum >> (quantum_bits - 8)) as u8);
        if quantum_bits >= 18 {
            out.push((quantum >> (quantum_bits - 16)) as u8);
        }
    }
    out
}
