/*
 * mod.rs
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

//! MIME structure, header and transfer decoding, and text rendering of
//! fetched messages.

pub mod base64;
mod charset;
mod content_type;
mod headers;
pub mod quoted_printable;
mod render;
mod rfc2047;
mod tree;
mod utils;
pub mod uuencode;

pub use charset::{CharsetConverter, ConversionError, EncodingRsConverter, DEFAULT_CHARSET};
pub use content_type::{
    parse_content_disposition, parse_content_type, ContentDisposition, ContentType,
};
pub use headers::{write_fields, HeaderFields};
pub use render::{MimeRenderer, PartSource, SessionPartSource};
pub use rfc2047::decode_encoded_words;
pub use tree::{split_header, split_multipart, MimeNode, PartInfo};
pub use utils::{is_token, is_valid_boundary};
