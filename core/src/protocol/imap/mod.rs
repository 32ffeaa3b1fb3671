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

//! IMAP4rev1 transport: the blocking contract the session drives, the typed
//! request/response values it exchanges, and the network implementation.

mod client;
mod transport;

pub use client::ImapClient;
pub use transport::NetTransport;

use std::time::Duration;

use thiserror::Error;

use crate::config::ConnectionMode;
use crate::fetch::SectionPath;

/// Failure reported by a transport. Stream failures invalidate the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket, TLS, timeout or EOF.
    #[error("{0}")]
    Stream(String),
    /// Malformed server response.
    #[error("{0}")]
    Parse(String),
    /// Tagged NO.
    #[error("{0}")]
    No(String),
    /// Tagged BAD.
    #[error("{0}")]
    Bad(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Stream(e.to_string())
    }
}

/// Everything needed to open a connection.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    /// Bounds TCP connect, TLS handshake and the greeting.
    pub timeout: Duration,
    pub mode: ConnectionMode,
    /// Interactive mode: disables Nagle on the socket.
    pub voip: bool,
}

/// Greeting status; both are success at connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    /// `* OK`
    NotAuthenticated,
    /// `* PREAUTH`
    Authenticated,
}

/// How a message is addressed in a FETCH. Never mixed in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRef {
    Uid(u32),
    Number(u32),
}

impl MessageRef {
    pub fn value(self) -> u32 {
        match self {
            MessageRef::Uid(n) | MessageRef::Number(n) => n,
        }
    }
}

/// Whole part or a byte window into it (`<offset.length>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRange {
    Whole,
    Partial { offset: u32, length: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub message: MessageRef,
    pub section: SectionPath,
    pub range: FetchRange,
}

impl FetchRequest {
    /// Render the IMAP command text, without tag.
    pub fn command(&self) -> String {
        let (prefix, n) = match self.message {
            MessageRef::Uid(n) => ("UID FETCH", n),
            MessageRef::Number(n) => ("FETCH", n),
        };
        let mut item = format!("BODY.PEEK[{}]", self.section);
        if let FetchRange::Partial { offset, length } = self.range {
            item.push_str(&format!("<{}.{}>", offset, length));
        }
        format!("{} {} ({})", prefix, n, item)
    }
}

/// One `BODY[...]` item of a FETCH response. `NIL` data is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySection {
    pub section: String,
    pub data: Option<Vec<u8>>,
}

/// One untagged FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub seq: u32,
    pub uid: Option<u32>,
    pub body_sections: Vec<BodySection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    List,
    Lsub,
    Xlist,
}

impl ListCommand {
    pub fn verb(self) -> &'static str {
        match self {
            ListCommand::List => "LIST",
            ListCommand::Lsub => "LSUB",
            ListCommand::Xlist => "XLIST",
        }
    }
}

/// Single-valued selectability attribute of a LIST entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selectability {
    Marked,
    Unmarked,
    NoSelect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFlag {
    NoInferiors,
    /// Any other attribute, verbatim (e.g. `\Trash`, `\HasNoChildren`).
    Extension(String),
}

/// One LIST/LSUB/XLIST entry as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListEntry {
    pub name: String,
    pub delimiter: Option<char>,
    pub selectability: Option<Selectability>,
    pub flags: Vec<ListFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusItem {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
    HighestModSeq,
}

impl StatusItem {
    pub fn atom(self) -> &'static str {
        match self {
            StatusItem::Messages => "MESSAGES",
            StatusItem::Recent => "RECENT",
            StatusItem::UidNext => "UIDNEXT",
            StatusItem::UidValidity => "UIDVALIDITY",
            StatusItem::Unseen => "UNSEEN",
            StatusItem::HighestModSeq => "HIGHESTMODSEQ",
        }
    }
}

/// One attribute of a STATUS response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAttribute {
    Messages(u32),
    Recent(u32),
    UidNext(u32),
    UidValidity(u32),
    Unseen(u32),
    HighestModSeq(u64),
    Extension(String, u64),
}

/// Blocking IMAP transport. One command in flight at a time; the session owns it exclusively.
pub trait Transport {
    fn connect(&mut self, options: &ConnectOptions) -> Result<Greeting, TransportError>;

    fn login(&mut self, user: &str, password: &str) -> Result<(), TransportError>;

    fn select(&mut self, mailbox: &str) -> Result<(), TransportError>;

    fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<FetchResponse>, TransportError>;

    fn list(
        &mut self,
        command: ListCommand,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<RawListEntry>, TransportError>;

    fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusItem],
    ) -> Result<Vec<StatusAttribute>, TransportError>;

    fn create(&mut self, mailbox: &str) -> Result<(), TransportError>;

    fn delete(&mut self, mailbox: &str) -> Result<(), TransportError>;

    fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError>;

    fn subscribe(&mut self, mailbox: &str) -> Result<(), TransportError>;

    fn unsubscribe(&mut self, mailbox: &str) -> Result<(), TransportError>;

    /// Case-insensitive lookup in the last advertised capability list.
    fn has_capability(&self, name: &str) -> bool;

    fn logout(&mut self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_command_uid_whole_message() {
        let req = FetchRequest {
            message: MessageRef::Uid(42),
            section: SectionPath::whole(),
            range: FetchRange::Whole,
        };
        assert_eq!(req.command(), "UID FETCH 42 (BODY.PEEK[])");
    }

    #[test]
    fn fetch_command_number_partial_section() {
        let req = FetchRequest {
            message: MessageRef::Number(7),
            section: SectionPath::parse("2.1"),
            range: FetchRange::Partial { offset: 100, length: 50 },
        };
        assert_eq!(req.command(), "FETCH 7 (BODY.PEEK[2.1]<100.50>)");
    }
}
