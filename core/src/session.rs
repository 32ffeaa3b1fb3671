/*
 * session.rs
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

//! One connection's lifecycle: connect, authenticate, select.
//!
//! Every operation goes through the lazy guards ([`Session::ensure_connected`],
//! [`Session::ensure_logged_in`], [`Session::ensure_selected`]), which advance
//! the state only as far as needed. Nothing is retried: a connection error
//! drops the state to `Disconnected` and the next call starts over.

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{ImapError, RejectionKind};
use crate::fetch::TransferDecoders;
use crate::protocol::imap::{ConnectOptions, Greeting, Transport, TransportError};

/// Connection state. Only the guards move it forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    LoggedIn,
    /// Logged in with the named folder selected.
    Selected(String),
}

impl SessionState {
    fn rank(&self) -> u8 {
        match self {
            SessionState::Disconnected => 0,
            SessionState::Connected => 1,
            SessionState::LoggedIn => 2,
            SessionState::Selected(_) => 3,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.rank() >= 2
    }
}

/// An IMAP session over a transport it owns exclusively. Not for concurrent use;
/// run one session per worker.
pub struct Session<T: Transport> {
    config: SessionConfig,
    transport: T,
    state: SessionState,
    pub(crate) delimiter: Option<char>,
    pub(crate) decoders: TransferDecoders,
}

impl<T: Transport> Session<T> {
    /// New disconnected session with the standard transfer decoders.
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            state: SessionState::Disconnected,
            delimiter: None,
            decoders: TransferDecoders::standard(),
        }
    }

    /// Replace the transfer decoders used by attachment fetches.
    pub fn with_decoders(mut self, decoders: TransferDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Folder currently selected, if any.
    pub fn current_folder(&self) -> Option<&str> {
        match &self.state {
            SessionState::Selected(f) => Some(f),
            _ => None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Map a transport failure and drop to Disconnected if the connection is gone.
    pub(crate) fn fail(&mut self, err: TransportError, kind: RejectionKind) -> ImapError {
        let err = ImapError::from_transport(err, kind);
        if err.is_connection() {
            debug!("connection lost: {}", err);
            self.state = SessionState::Disconnected;
            self.delimiter = None;
        }
        err
    }

    /// Open the connection if there is none.
    pub fn ensure_connected(&mut self) -> Result<(), ImapError> {
        if self.state != SessionState::Disconnected {
            return Ok(());
        }
        let options = ConnectOptions {
            host: self.config.host.clone(),
            port: self.config.port,
            timeout: self.config.timeout,
            mode: self.config.mode,
            voip: self.config.voip,
        };
        debug!("connecting to {}:{}", options.host, options.port);
        let greeting = self.transport.connect(&options).map_err(|e| match e {
            TransportError::Parse(m) => ImapError::Parse(m),
            other => ImapError::Connection(other.to_string()),
        })?;
        self.state = match greeting {
            Greeting::NotAuthenticated => SessionState::Connected,
            Greeting::Authenticated => {
                info!("{} pre-authenticated the connection", self.config.host);
                SessionState::LoggedIn
            }
        };
        Ok(())
    }

    /// Connect if needed, then authenticate if not yet authenticated.
    pub fn ensure_logged_in(&mut self) -> Result<(), ImapError> {
        self.ensure_connected()?;
        if self.state != SessionState::Connected {
            return Ok(());
        }
        if let Err(e) = self.transport.login(&self.config.user, &self.config.password) {
            return Err(self.fail(e, RejectionKind::Authentication));
        }
        info!("logged in to {} as {}", self.config.host, self.config.user);
        self.state = SessionState::LoggedIn;
        Ok(())
    }

    /// Log in if needed, then SELECT `folder` unless it is already selected.
    /// A rejected SELECT leaves the session logged in with nothing selected.
    pub fn ensure_selected(&mut self, folder: &str) -> Result<(), ImapError> {
        self.ensure_logged_in()?;
        if matches!(&self.state, SessionState::Selected(current) if current == folder) {
            return Ok(());
        }
        debug!("selecting {}", folder);
        if let Err(e) = self.transport.select(folder) {
            if self.state.is_logged_in() {
                self.state = SessionState::LoggedIn;
            }
            return Err(self.fail(e, RejectionKind::NonExistentFolder));
        }
        self.state = SessionState::Selected(folder.to_string());
        Ok(())
    }

    /// Log out (best effort) and return to Disconnected. Use after a connection error.
    pub fn reset(&mut self) {
        if self.state != SessionState::Disconnected {
            if let Err(e) = self.transport.logout() {
                debug!("logout during reset failed: {}", e);
            }
        }
        self.state = SessionState::Disconnected;
        self.delimiter = None;
    }

    /// Leave a Selected state after the selected folder disappeared or changed name.
    pub(crate) fn deselect_if(&mut self, folder: &str) {
        if matches!(&self.state, SessionState::Selected(current) if current == folder) {
            self.state = SessionState::LoggedIn;
        }
    }
}
