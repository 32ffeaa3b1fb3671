/*
 * config.rs
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

//! Session configuration: server, credentials and connection parameters.
//!
//! An account can be described in an XML file read with quick_xml:
//!
//! ```xml
//! <account>
//!   <server>imap.example.com</server>
//!   <port>993</port>
//!   <user>alice</user>
//!   <password>secret</password>
//!   <timeout>10</timeout>
//!   <connection>tls</connection>
//!   <voip>true</voip>
//! </account>
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

/// Default connect timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const IMAPS_PORT: u16 = 993;
pub const IMAP_PORT: u16 = 143;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("missing <{0}> element")]
    Missing(&'static str),
    #[error("invalid value for <{element}>: {value}")]
    Invalid { element: &'static str, value: String },
}

/// How the connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    Plain,
    /// Plain connect, then STARTTLS before authenticating.
    StartTls,
    /// TLS from the first byte.
    Tls,
}

impl ConnectionMode {
    /// Tls on the IMAPS port, StartTls elsewhere.
    pub fn default_for_port(port: u16) -> Self {
        if port == IMAPS_PORT {
            ConnectionMode::Tls
        } else {
            ConnectionMode::StartTls
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "none" => Ok(ConnectionMode::Plain),
            "starttls" => Ok(ConnectionMode::StartTls),
            "tls" | "ssl" | "imaps" => Ok(ConnectionMode::Tls),
            other => Err(format!("unknown connection mode: {}", other)),
        }
    }
}

/// Everything a [`Session`](crate::Session) needs to reach and log in to a server.
#[derive(Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
    pub voip: bool,
    pub mode: ConnectionMode,
    /// Set once a mode is chosen with [`SessionConfig::mode`]; `port` then leaves it alone.
    explicit_mode: bool,
}

impl SessionConfig {
    /// Config for `host` on the IMAPS port with default timeout and voip mode.
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: IMAPS_PORT,
            user: user.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            voip: true,
            mode: ConnectionMode::Tls,
            explicit_mode: false,
        }
    }

    /// Set the port. Unless a mode was set explicitly, the mode follows the
    /// port's default.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        if !self.explicit_mode {
            self.mode = ConnectionMode::default_for_port(port);
        }
        self
    }

    pub fn mode(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self.explicit_mode = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn voip(mut self, voip: bool) -> Self {
        self.voip = voip;
        self
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .field("voip", &self.voip)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Default account file: ~/.recvmail/account.xml.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|h| h.join(".recvmail").join("account.xml"))
}

/// Read an account file.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

fn parse_value<T: FromStr>(element: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        element,
        value: value.to_string(),
    })
}

/// Parse the `<account>` document. `server` and `user` are required.
pub fn parse_config(content: &str) -> Result<SessionConfig, ConfigError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut element_name = Vec::<u8>::new();
    let mut server = None;
    let mut user = None;
    let mut password = String::new();
    let mut port = None;
    let mut timeout = None;
    let mut mode = None;
    let mut voip = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(ConfigError::Xml(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                element_name.clear();
                element_name.extend_from_slice(e.name().as_ref());
            }
            Ok(Event::Text(e)) => {
                if element_name.is_empty() {
                    continue;
                }
                let text = e
                    .unescape()
                    .map_err(|e| ConfigError::Xml(e.to_string()))?
                    .trim()
                    .to_string();
                match element_name.as_slice() {
                    b"server" => server = Some(text),
                    b"user" => user = Some(text),
                    b"password" => password = text,
                    b"port" => port = Some(parse_value::<u16>("port", &text)?),
                    b"timeout" => timeout = Some(parse_value::<u64>("timeout", &text)?),
                    b"connection" => mode = Some(parse_value::<ConnectionMode>("connection", &text)?),
                    b"voip" => voip = Some(parse_value::<bool>("voip", &text)?),
                    _ => {}
                }
                element_name.clear();
            }
            Ok(Event::End(_)) => element_name.clear(),
            _ => {}
        }
        buf.clear();
    }

    let server = server.filter(|s| !s.is_empty()).ok_or(ConfigError::Missing("server"))?;
    let user = user.filter(|s| !s.is_empty()).ok_or(ConfigError::Missing("user"))?;
    let mut config = SessionConfig::new(server, user, password).port(port.unwrap_or(IMAPS_PORT));
    if let Some(mode) = mode {
        config = config.mode(mode);
    }
    if let Some(secs) = timeout {
        config = config.timeout(Duration::from_secs(secs));
    }
    if let Some(voip) = voip {
        config = config.voip(voip);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_port() {
        let c = SessionConfig::new("imap.example.com", "alice", "pw");
        assert_eq!(c.port, 993);
        assert_eq!(c.mode, ConnectionMode::Tls);
        assert_eq!(c.timeout, Duration::from_secs(10));
        assert!(c.voip);
        let c = c.port(143);
        assert_eq!(c.mode, ConnectionMode::StartTls);
    }

    #[test]
    fn parse_full_account() {
        let xml = r#"<?xml version="1.0"?>
            <account>
              <server>mail.example.org</server>
              <port>143</port>
              <user>bob</user>
              <password>a&amp;b</password>
              <timeout>30</timeout>
              <connection>plain</connection>
              <voip>false</voip>
            </account>"#;
        let c = parse_config(xml).unwrap();
        assert_eq!(c.host, "mail.example.org");
        assert_eq!(c.port, 143);
        assert_eq!(c.user, "bob");
        assert_eq!(c.password, "a&b");
        assert_eq!(c.timeout, Duration::from_secs(30));
        assert_eq!(c.mode, ConnectionMode::Plain);
        assert!(!c.voip);
    }

    #[test]
    fn port_override_keeps_configured_mode() {
        let xml = "<account><server>s</server><user>u</user><connection>plain</connection></account>";
        let c = parse_config(xml).unwrap().port(1143);
        assert_eq!(c.port, 1143);
        assert_eq!(c.mode, ConnectionMode::Plain);

        let c = parse_config("<account><server>s</server><user>u</user></account>")
            .unwrap()
            .port(143);
        assert_eq!(c.mode, ConnectionMode::StartTls);
    }

    #[test]
    fn missing_and_invalid_elements() {
        let err = parse_config("<account><user>x</user></account>").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("server")));
        let err = parse_config("<account><server>s</server><user>u</user><port>abc</port></account>")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { element: "port", .. }));
    }

    #[test]
    fn debug_hides_password() {
        let c = SessionConfig::new("h", "u", "hunter2");
        assert!(!format!("{:?}", c).contains("hunter2"));
    }
}
