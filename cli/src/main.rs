/*
 * main.rs
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

//! recvmail: list folders, show folder status, fetch and render messages.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use recvmail_core::config::{default_config_path, load_config, ConnectionMode, SessionConfig};
use recvmail_core::mime::{MimeNode, MimeRenderer, PartSource, SessionPartSource};
use recvmail_core::{Encoding, FetchRange, MessageRef, NetTransport, Session};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Account file (XML); defaults to ~/.recvmail/account.xml
    #[clap(long, env = "RECVMAIL_CONFIG")]
    config: Option<PathBuf>,

    /// IMAP server; overrides the account file
    #[clap(short, long)]
    server: Option<String>,

    #[clap(short, long)]
    port: Option<u16>,

    #[clap(short, long)]
    user: Option<String>,

    #[clap(short = 'v', long, env = "RECVMAIL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// plain, starttls or tls
    #[clap(long)]
    connection: Option<ConnectionMode>,

    /// Connect timeout in seconds
    #[clap(long)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List folders with their flags
    Folders {
        /// Only subscribed folders
        #[clap(long)]
        subscribed: bool,
    },
    /// Show message counters of a folder
    Status { folder: String },
    /// Fetch a message or one of its parts
    Fetch {
        folder: String,
        /// UID, or sequence number with --number
        id: u32,
        #[clap(long)]
        number: bool,
        /// Dotted section path of a part, e.g. 2.1
        #[clap(long)]
        section: Option<String>,
        /// Transfer encoding of the part (base64, quoted-printable, ...)
        #[clap(long, requires = "section")]
        encoding: Option<Encoding>,
        /// Byte window of the part as offset:length
        #[clap(long, requires = "section", parse(try_from_str = parse_partial))]
        partial: Option<FetchRange>,
        /// Render the message as text instead of writing it raw
        #[clap(long, conflicts_with = "section")]
        render: bool,
        /// With --render, fetch each text part from the server again
        #[clap(long, requires = "render")]
        refetch: bool,
    },
}

fn parse_partial(s: &str) -> Result<FetchRange, String> {
    let (offset, length) = s
        .split_once(':')
        .ok_or_else(|| format!("expected offset:length, got {}", s))?;
    let offset = offset.trim().parse().map_err(|_| format!("bad offset {}", offset))?;
    let length = length.trim().parse().map_err(|_| format!("bad length {}", length))?;
    Ok(FetchRange::Partial { offset, length })
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.server {
        Some(server) => {
            let user = args
                .user
                .clone()
                .ok_or_else(|| anyhow!("--user is required with --server"))?;
            SessionConfig::new(server.clone(), user, String::new())
        }
        None => {
            let path = match &args.config {
                Some(p) => p.clone(),
                None => default_config_path().ok_or_else(|| anyhow!("no --server and no home directory"))?,
            };
            load_config(&path).with_context(|| format!("reading {}", path.display()))?
        }
    };
    if let Some(user) = &args.user {
        config.user = user.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(port) = args.port {
        config = config.port(port);
    }
    if let Some(mode) = args.connection {
        config = config.mode(mode);
    }
    if let Some(secs) = args.timeout {
        config = config.timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn run(args: Args, session: &mut Session<NetTransport>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Folders { subscribed } => {
            let folders = if subscribed {
                session.list_subscribed()?
            } else {
                session.list_all()?
            };
            for folder in folders {
                writeln!(out, "{:<40} {}", folder.path, folder.flags)?;
            }
        }
        Command::Status { folder } => {
            let status = session.status(&folder)?;
            writeln!(out, "messages:    {}", status.messages)?;
            writeln!(out, "recent:      {}", status.recent)?;
            writeln!(out, "unseen:      {}", status.unseen)?;
            writeln!(out, "uidnext:     {}", status.uid_next)?;
            writeln!(out, "uidvalidity: {}", status.uid_validity)?;
            if let Some(modseq) = status.highest_mod_seq {
                writeln!(out, "modseq:      {}", modseq)?;
            }
        }
        Command::Fetch {
            folder,
            id,
            number,
            section,
            encoding,
            partial,
            render,
            refetch,
        } => {
            let message = if number {
                MessageRef::Number(id)
            } else {
                MessageRef::Uid(id)
            };
            let range = partial.unwrap_or(FetchRange::Whole);
            if let Some(section) = section {
                let data = match encoding {
                    Some(encoding) => {
                        session.fetch_attachment(&folder, message, &section, encoding, range)?
                    }
                    None => session.fetch_attachment_undecoded(&folder, message, &section, range)?,
                };
                out.write_all(&data)?;
            } else {
                let raw = session.fetch_message(&folder, message)?;
                if !render {
                    out.write_all(&raw)?;
                } else {
                    let tree = MimeNode::parse(&raw);
                    let renderer = MimeRenderer::new();
                    if refetch {
                        let mut source = SessionPartSource::new(session, folder, message);
                        renderer.render(&mut out, &tree, Some(&mut source as &mut dyn PartSource))?;
                    } else {
                        renderer.render(&mut out, &tree, None)?;
                    }
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = session_config(&args)?;
    if config.password.is_empty() {
        bail!("no password: use --password, RECVMAIL_PASSWORD or the account file");
    }
    debug!("{:?}", config);

    let transport = NetTransport::new().context("starting I/O runtime")?;
    let mut session = Session::new(config, transport);
    let result = run(args, &mut session);
    session.reset();
    result
}
