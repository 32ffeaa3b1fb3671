/*
 * lib.rs
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

//! Recvmail core: an IMAP session with lazy connect, login and select,
//! FETCH of whole messages or section-addressed parts, folder listing and
//! status, and a text renderer for the MIME structure of fetched mail.

pub mod config;
pub mod error;
pub mod fetch;
pub mod folders;
pub mod mime;
mod net;
pub mod protocol;
pub mod session;

pub use config::{load_config, ConnectionMode, SessionConfig};
pub use error::ImapError;
pub use fetch::{Encoding, SectionPath, TransferDecoders};
pub use folders::{FolderFlags, FolderListing, FolderStatus, INBOX};
pub use mime::{MimeNode, MimeRenderer, PartSource, SessionPartSource};
pub use protocol::imap::{FetchRange, MessageRef, NetTransport, Transport};
pub use session::{Session, SessionState};
