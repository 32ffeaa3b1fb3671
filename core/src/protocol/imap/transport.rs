/*
 * transport.rs
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

//! Blocking [`Transport`] over the async client, driven on a private
//! current-thread runtime.

use std::io;

use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{
    ConnectOptions, FetchRequest, FetchResponse, Greeting, ImapClient, ListCommand, RawListEntry,
    StatusAttribute, StatusItem, Transport, TransportError,
};

/// Network transport. A stream failure drops the connection; the next
/// `connect` opens a fresh one.
pub struct NetTransport {
    runtime: Runtime,
    client: Option<ImapClient>,
}

impl NetTransport {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            client: None,
        })
    }

    fn parts(&mut self) -> Result<(&Runtime, &mut ImapClient), TransportError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| TransportError::Stream("not connected".to_string()))?;
        Ok((&self.runtime, client))
    }

    /// Drop the connection if `result` is a stream failure.
    fn settle<T>(&mut self, result: Result<T, TransportError>) -> Result<T, TransportError> {
        if let Err(TransportError::Stream(ref e)) = result {
            debug!("dropping connection after stream error: {}", e);
            self.client = None;
        }
        result
    }
}

impl Transport for NetTransport {
    fn connect(&mut self, options: &ConnectOptions) -> Result<Greeting, TransportError> {
        self.client = None;
        let connect = ImapClient::connect(&options.host, options.port, options.mode, options.voip);
        let (client, greeting) = self
            .runtime
            .block_on(async { tokio::time::timeout(options.timeout, connect).await })
            .map_err(|_| {
                TransportError::Stream(format!(
                    "connection to {}:{} timed out after {:?}",
                    options.host, options.port, options.timeout
                ))
            })??;
        self.client = Some(client);
        Ok(greeting)
    }

    fn login(&mut self, user: &str, password: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.login(user, password));
        self.settle(result)
    }

    fn select(&mut self, mailbox: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.select(mailbox));
        self.settle(result)
    }

    fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<FetchResponse>, TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.fetch(request));
        self.settle(result)
    }

    fn list(
        &mut self,
        command: ListCommand,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<RawListEntry>, TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.list(command, reference, pattern));
        self.settle(result)
    }

    fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusItem],
    ) -> Result<Vec<StatusAttribute>, TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.status(mailbox, items));
        self.settle(result)
    }

    fn create(&mut self, mailbox: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.create(mailbox));
        self.settle(result)
    }

    fn delete(&mut self, mailbox: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.delete(mailbox));
        self.settle(result)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.rename(from, to));
        self.settle(result)
    }

    fn subscribe(&mut self, mailbox: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.subscribe(mailbox));
        self.settle(result)
    }

    fn unsubscribe(&mut self, mailbox: &str) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.unsubscribe(mailbox));
        self.settle(result)
    }

    fn has_capability(&self, name: &str) -> bool {
        self.client.as_ref().is_some_and(|c| c.has_capability(name))
    }

    fn logout(&mut self) -> Result<(), TransportError> {
        let (rt, client) = self.parts()?;
        let result = rt.block_on(client.logout());
        self.client = None;
        result
    }
}
