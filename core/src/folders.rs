/*
 * folders.rs
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

//! Folder directory: listing with portable flags, status, and mailbox management.
//!
//! Providers mark special folders differently (RFC 6154 SPECIAL-USE attributes,
//! Gmail's XLIST names, plain `\Noselect`). Each raw LIST entry is reduced to a
//! [`FolderFlags`] set over one vocabulary.

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::OnceLock;

use tracing::{debug, trace};

use crate::error::{ImapError, RejectionKind};
use crate::protocol::imap::{
    ListCommand, ListFlag, RawListEntry, Selectability, StatusAttribute, StatusItem, Transport,
};
use crate::session::Session;

pub const INBOX: &str = "INBOX";

/// Portable folder flag set.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FolderFlags(u32);

impl FolderFlags {
    pub const NONE: FolderFlags = FolderFlags(0);
    pub const MARKED: FolderFlags = FolderFlags(1 << 0);
    pub const UNMARKED: FolderFlags = FolderFlags(1 << 1);
    pub const NO_SELECT: FolderFlags = FolderFlags(1 << 2);
    pub const NO_INFERIORS: FolderFlags = FolderFlags(1 << 3);
    pub const INBOX: FolderFlags = FolderFlags(1 << 4);
    pub const SENT_MAIL: FolderFlags = FolderFlags(1 << 5);
    pub const STARRED: FolderFlags = FolderFlags(1 << 6);
    pub const ALL_MAIL: FolderFlags = FolderFlags(1 << 7);
    pub const TRASH: FolderFlags = FolderFlags(1 << 8);
    pub const DRAFTS: FolderFlags = FolderFlags(1 << 9);
    pub const SPAM: FolderFlags = FolderFlags(1 << 10);
    pub const IMPORTANT: FolderFlags = FolderFlags(1 << 11);
    pub const ARCHIVE: FolderFlags = FolderFlags(1 << 12);
    pub const ALL: FolderFlags = Self::ALL_MAIL;
    pub const JUNK: FolderFlags = Self::SPAM;
    pub const FLAGGED: FolderFlags = Self::STARRED;

    const NAMES: [(FolderFlags, &'static str); 13] = [
        (Self::MARKED, "Marked"),
        (Self::UNMARKED, "Unmarked"),
        (Self::NO_SELECT, "NoSelect"),
        (Self::NO_INFERIORS, "NoInferiors"),
        (Self::INBOX, "Inbox"),
        (Self::SENT_MAIL, "SentMail"),
        (Self::STARRED, "Starred"),
        (Self::ALL_MAIL, "AllMail"),
        (Self::TRASH, "Trash"),
        (Self::DRAFTS, "Drafts"),
        (Self::SPAM, "Spam"),
        (Self::IMPORTANT, "Important"),
        (Self::ARCHIVE, "Archive"),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: FolderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FolderFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for FolderFlags {
    type Output = FolderFlags;

    fn bitor(self, rhs: FolderFlags) -> FolderFlags {
        FolderFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FolderFlags {
    fn bitor_assign(&mut self, rhs: FolderFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FolderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

impl fmt::Display for FolderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Provider keyword (lowercase, without backslash) to flag.
fn keyword_table() -> &'static HashMap<&'static str, FolderFlags> {
    static TABLE: OnceLock<HashMap<&'static str, FolderFlags>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("inbox", FolderFlags::INBOX),
            ("allmail", FolderFlags::ALL_MAIL),
            ("sentmail", FolderFlags::SENT_MAIL),
            ("sent", FolderFlags::SENT_MAIL),
            ("spam", FolderFlags::SPAM),
            ("starred", FolderFlags::STARRED),
            ("trash", FolderFlags::TRASH),
            ("important", FolderFlags::IMPORTANT),
            ("drafts", FolderFlags::DRAFTS),
            ("archive", FolderFlags::ARCHIVE),
            ("all", FolderFlags::ALL),
            ("junk", FolderFlags::JUNK),
            ("flagged", FolderFlags::FLAGGED),
        ])
    })
}

/// Flag for a provider keyword such as `\Trash` or `\AllMail`, case-insensitive.
pub fn keyword_flag(keyword: &str) -> Option<FolderFlags> {
    let key = keyword.trim_start_matches('\\').to_ascii_lowercase();
    keyword_table().get(key.as_str()).copied()
}

/// One folder as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderListing {
    pub path: String,
    pub delimiter: Option<char>,
    pub flags: FolderFlags,
}

impl FolderListing {
    pub fn is_inbox(&self) -> bool {
        self.path == INBOX
    }

    pub fn is_selectable(&self) -> bool {
        !self.flags.contains(FolderFlags::NO_SELECT)
    }
}

/// "INBOX" for any case variant of it, otherwise the name unchanged.
pub fn normalize_folder_name(name: &str) -> String {
    if name.eq_ignore_ascii_case(INBOX) {
        INBOX.to_string()
    } else {
        name.to_string()
    }
}

/// Decode a raw entry. `fallback_delimiter` applies when the entry carries none.
pub fn decode_entry(raw: &RawListEntry, fallback_delimiter: Option<char>) -> FolderListing {
    let mut flags = match raw.selectability {
        Some(Selectability::Marked) => FolderFlags::MARKED,
        Some(Selectability::Unmarked) => FolderFlags::UNMARKED,
        Some(Selectability::NoSelect) => FolderFlags::NO_SELECT,
        None => FolderFlags::NONE,
    };
    for flag in &raw.flags {
        match flag {
            ListFlag::NoInferiors => flags |= FolderFlags::NO_INFERIORS,
            ListFlag::Extension(keyword) => match keyword_flag(keyword) {
                Some(f) => flags |= f,
                None => trace!("ignoring folder attribute {} on {}", keyword, raw.name),
            },
        }
    }
    FolderListing {
        path: normalize_folder_name(&raw.name),
        delimiter: raw.delimiter.or(fallback_delimiter),
        flags,
    }
}

/// Decode entries, keeping only the first INBOX alias.
fn decode_entries(raw: &[RawListEntry], delimiter: Option<char>) -> Vec<FolderListing> {
    let mut seen_inbox = false;
    let mut out = Vec::with_capacity(raw.len());
    for entry in raw {
        let listing = decode_entry(entry, delimiter);
        if listing.is_inbox() {
            if seen_inbox {
                debug!("dropping duplicate inbox alias {:?}", entry.name);
                continue;
            }
            seen_inbox = true;
        }
        out.push(listing);
    }
    out
}

/// Folder counters; recomputed on every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderStatus {
    pub unseen: u32,
    pub messages: u32,
    pub recent: u32,
    pub uid_next: u32,
    pub uid_validity: u32,
    /// Present only when the server supports CONDSTORE.
    pub highest_mod_seq: Option<u64>,
}

impl FolderStatus {
    fn from_attributes(attributes: &[StatusAttribute]) -> Self {
        let mut status = FolderStatus::default();
        for attr in attributes {
            match *attr {
                StatusAttribute::Messages(n) => status.messages = n,
                StatusAttribute::Recent(n) => status.recent = n,
                StatusAttribute::UidNext(n) => status.uid_next = n,
                StatusAttribute::UidValidity(n) => status.uid_validity = n,
                StatusAttribute::Unseen(n) => status.unseen = n,
                StatusAttribute::HighestModSeq(n) => status.highest_mod_seq = Some(n),
                StatusAttribute::Extension(..) => {}
            }
        }
        status
    }
}

impl<T: Transport> Session<T> {
    fn list_raw(
        &mut self,
        command: ListCommand,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<RawListEntry>, ImapError> {
        match self.transport_mut().list(command, reference, pattern) {
            Ok(entries) => Ok(entries),
            Err(e) => Err(self.fail(e, RejectionKind::List)),
        }
    }

    /// Hierarchy delimiter from `LIST "" ""`, cached once known. `None` when
    /// the server reports none (an empty directory or a flat namespace).
    pub fn hierarchy_delimiter(&mut self) -> Result<Option<char>, ImapError> {
        self.ensure_logged_in()?;
        if self.delimiter.is_none() {
            let entries = self.list_raw(ListCommand::List, "", "")?;
            self.delimiter = entries.first().and_then(|e| e.delimiter);
            debug!("hierarchy delimiter: {:?}", self.delimiter);
        }
        Ok(self.delimiter)
    }

    /// Subscribed folders (LSUB).
    pub fn list_subscribed(&mut self) -> Result<Vec<FolderListing>, ImapError> {
        let delimiter = self.hierarchy_delimiter()?;
        let raw = self.list_raw(ListCommand::Lsub, "", "*")?;
        Ok(decode_entries(&raw, delimiter))
    }

    /// Every folder. Uses XLIST on servers that offer it without SPECIAL-USE.
    /// INBOX is always present, first if the server did not list it.
    pub fn list_all(&mut self) -> Result<Vec<FolderListing>, ImapError> {
        let delimiter = self.hierarchy_delimiter()?;
        let command = if self.transport().has_capability("XLIST")
            && !self.transport().has_capability("SPECIAL-USE")
        {
            ListCommand::Xlist
        } else {
            ListCommand::List
        };
        let raw = self.list_raw(command, "", "*")?;
        let mut folders = decode_entries(&raw, delimiter);
        if !folders.iter().any(FolderListing::is_inbox) {
            debug!("server did not list INBOX, adding it");
            folders.insert(
                0,
                FolderListing {
                    path: INBOX.to_string(),
                    delimiter,
                    flags: FolderFlags::INBOX,
                },
            );
        }
        Ok(folders)
    }

    /// STATUS of `folder`; needs a logged-in session but no selection.
    pub fn status(&mut self, folder: &str) -> Result<FolderStatus, ImapError> {
        self.ensure_logged_in()?;
        let mut items = vec![
            StatusItem::Unseen,
            StatusItem::Messages,
            StatusItem::Recent,
            StatusItem::UidNext,
            StatusItem::UidValidity,
        ];
        if self.transport().has_capability("CONDSTORE") {
            items.push(StatusItem::HighestModSeq);
        }
        match self.transport_mut().status(folder, &items) {
            Ok(attributes) => Ok(FolderStatus::from_attributes(&attributes)),
            Err(e) => Err(self.fail(e, RejectionKind::NonExistentFolder)),
        }
    }

    pub fn create_folder(&mut self, folder: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        match self.transport_mut().create(folder) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, RejectionKind::Create)),
        }
    }

    /// Deleting the selected folder leaves the session logged in without a selection.
    pub fn delete_folder(&mut self, folder: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        match self.transport_mut().delete(folder) {
            Ok(()) => {
                self.deselect_if(folder);
                Ok(())
            }
            Err(e) => Err(self.fail(e, RejectionKind::Delete)),
        }
    }

    /// Renaming the selected folder leaves the session logged in without a selection.
    pub fn rename_folder(&mut self, from: &str, to: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        match self.transport_mut().rename(from, to) {
            Ok(()) => {
                self.deselect_if(from);
                Ok(())
            }
            Err(e) => Err(self.fail(e, RejectionKind::Rename)),
        }
    }

    pub fn subscribe_folder(&mut self, folder: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        match self.transport_mut().subscribe(folder) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, RejectionKind::Subscribe)),
        }
    }

    pub fn unsubscribe_folder(&mut self, folder: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        match self.transport_mut().unsubscribe(folder) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, RejectionKind::Subscribe)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, sel: Option<Selectability>, flags: &[&str]) -> RawListEntry {
        RawListEntry {
            name: name.to_string(),
            delimiter: Some('/'),
            selectability: sel,
            flags: flags
                .iter()
                .map(|f| {
                    if f.eq_ignore_ascii_case("\\Noinferiors") {
                        ListFlag::NoInferiors
                    } else {
                        ListFlag::Extension(f.to_string())
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn inbox_name_is_normalized() {
        let l = decode_entry(&raw("inbox", None, &[]), None);
        assert_eq!(l.path, "INBOX");
        assert_eq!(l.flags, FolderFlags::NONE);
        let l = decode_entry(&raw("Inbox.Sub", None, &[]), None);
        assert_eq!(l.path, "Inbox.Sub");
        let l = decode_entry(&raw("Sent Items", None, &[]), None);
        assert_eq!(l.path, "Sent Items");
    }

    #[test]
    fn keywords_are_case_insensitive_with_aliases() {
        assert_eq!(keyword_flag("\\TRASH"), Some(FolderFlags::TRASH));
        assert_eq!(keyword_flag("\\Junk"), Some(FolderFlags::SPAM));
        assert_eq!(keyword_flag("\\All"), Some(FolderFlags::ALL_MAIL));
        assert_eq!(keyword_flag("\\Flagged"), Some(FolderFlags::STARRED));
        assert_eq!(keyword_flag("\\Sent"), Some(FolderFlags::SENT_MAIL));
        assert_eq!(keyword_flag("\\HasNoChildren"), None);
    }

    #[test]
    fn selectability_and_keywords_combine() {
        let l = decode_entry(
            &raw("[Gmail]/Spam", Some(Selectability::Marked), &["\\HasNoChildren", "\\Spam", "\\Noinferiors"]),
            None,
        );
        assert_eq!(l.flags, FolderFlags::MARKED | FolderFlags::SPAM | FolderFlags::NO_INFERIORS);
        let l = decode_entry(&raw("[Gmail]", Some(Selectability::NoSelect), &[]), None);
        assert!(!l.is_selectable());
    }

    #[test]
    fn only_first_inbox_alias_kept() {
        let entries = vec![raw("INBOX", None, &[]), raw("Drafts", None, &[]), raw("inbox", None, &[])];
        let folders = decode_entries(&entries, None);
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].path, "INBOX");
        assert_eq!(folders[1].path, "Drafts");
    }

    #[test]
    fn status_ignores_extensions() {
        let s = FolderStatus::from_attributes(&[
            StatusAttribute::Messages(10),
            StatusAttribute::Unseen(2),
            StatusAttribute::Extension("X-SIZE".to_string(), 99),
        ]);
        assert_eq!(s.messages, 10);
        assert_eq!(s.unseen, 2);
        assert_eq!(s.highest_mod_seq, None);
    }

    #[test]
    fn flags_debug_lists_names() {
        assert_eq!(format!("{:?}", FolderFlags::NONE), "None");
        assert_eq!(format!("{:?}", FolderFlags::INBOX | FolderFlags::MARKED), "Marked | Inbox");
    }
}
