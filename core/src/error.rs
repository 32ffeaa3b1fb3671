/*
 * error.rs
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

//! Session, fetch, folder and rendering errors.
//!
//! The taxonomy is flat and keyed by failure site. Transport failures are
//! translated once, in [`ImapError::from_transport`], so every operation maps
//! stream and parse failures the same way and only differs in the kind used
//! for a well-formed rejection.

use thiserror::Error;

use crate::mime::ConversionError;
use crate::protocol::imap::TransportError;

/// Errors surfaced by [`Session`](crate::Session) operations and the MIME renderer.
#[derive(Debug, Error)]
pub enum ImapError {
    /// Transport or stream failure at any stage (including connect timeout).
    /// The session must be reset before it is used again.
    #[error("connection error: {0}")]
    Connection(String),
    /// The server sent a response that could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// SELECT or STATUS rejected for an unknown or inaccessible folder.
    #[error("folder does not exist: {0}")]
    NonExistentFolder(String),
    /// Well-formed FETCH response without a usable body section.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// LIST/LSUB/XLIST rejected.
    #[error("folder listing failed: {0}")]
    List(String),
    #[error("create failed: {0}")]
    Create(String),
    #[error("delete failed: {0}")]
    Delete(String),
    #[error("rename failed: {0}")]
    Rename(String),
    #[error("subscribe failed: {0}")]
    Subscribe(String),
    /// Writing the rendition to the output failed.
    #[error("write failed: {0}")]
    File(#[from] std::io::Error),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Operation-specific kind used when the server rejects a command with NO or BAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    Authentication,
    NonExistentFolder,
    Fetch,
    List,
    Create,
    Delete,
    Rename,
    Subscribe,
}

impl ImapError {
    /// Map a transport failure: stream -> Connection, parse -> Parse, NO/BAD -> `kind`.
    pub fn from_transport(err: TransportError, kind: RejectionKind) -> Self {
        match err {
            TransportError::Stream(msg) => ImapError::Connection(msg),
            TransportError::Parse(msg) => ImapError::Parse(msg),
            TransportError::No(msg) | TransportError::Bad(msg) => match kind {
                RejectionKind::Authentication => ImapError::Authentication(msg),
                RejectionKind::NonExistentFolder => ImapError::NonExistentFolder(msg),
                RejectionKind::Fetch => ImapError::Fetch(msg),
                RejectionKind::List => ImapError::List(msg),
                RejectionKind::Create => ImapError::Create(msg),
                RejectionKind::Delete => ImapError::Delete(msg),
                RejectionKind::Rename => ImapError::Rename(msg),
                RejectionKind::Subscribe => ImapError::Subscribe(msg),
            },
        }
    }

    /// True when the caller must treat the session as disconnected.
    pub fn is_connection(&self) -> bool {
        matches!(self, ImapError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_and_parse_ignore_operation_kind() {
        let e = ImapError::from_transport(TransportError::Stream("eof".into()), RejectionKind::Fetch);
        assert!(matches!(e, ImapError::Connection(_)));
        assert!(e.is_connection());
        let e = ImapError::from_transport(TransportError::Parse("junk".into()), RejectionKind::Create);
        assert!(matches!(e, ImapError::Parse(_)));
    }

    #[test]
    fn rejection_uses_operation_kind() {
        let e = ImapError::from_transport(TransportError::No("no such".into()), RejectionKind::NonExistentFolder);
        assert!(matches!(e, ImapError::NonExistentFolder(ref m) if m == "no such"));
        let e = ImapError::from_transport(TransportError::Bad("syntax".into()), RejectionKind::Rename);
        assert!(matches!(e, ImapError::Rename(_)));
        assert!(!e.is_connection());
    }
}
