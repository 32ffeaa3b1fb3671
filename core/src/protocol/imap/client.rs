/*
 * client.rs
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

//! Async IMAP client: connect, greeting, CAPABILITY, STARTTLS, LOGIN, SELECT,
//! FETCH, LIST/LSUB/XLIST, STATUS, mailbox management, LOGOUT.
//!
//! One command at a time: write the tagged command, collect untagged responses
//! (with any literals they carry) until the matching tagged completion.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufStream};
use tracing::{debug, trace, warn};

use super::{
    BodySection, FetchRequest, FetchResponse, Greeting, ListCommand, ListFlag, RawListEntry,
    Selectability, StatusAttribute, StatusItem, TransportError,
};
use crate::config::ConnectionMode;
use crate::net::MailStream;

/// One logical response: the line text (continuations appended, `{N}` markers
/// left in place) plus the literals in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ResponseLine {
    pub text: String,
    pub literals: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImapStatus {
    Ok,
    No,
    Bad,
    PreAuth,
    Bye,
}

/// Classification of a response line (untagged `*`, continuation `+` or tagged).
#[derive(Debug, Clone)]
struct ImapLine {
    tag: Option<String>,
    untagged: bool,
    status: Option<ImapStatus>,
    /// Text after the status word.
    rest: String,
}

fn parse_status_word(word: &str) -> Option<ImapStatus> {
    match word.to_ascii_uppercase().as_str() {
        "OK" => Some(ImapStatus::Ok),
        "NO" => Some(ImapStatus::No),
        "BAD" => Some(ImapStatus::Bad),
        "PREAUTH" => Some(ImapStatus::PreAuth),
        "BYE" => Some(ImapStatus::Bye),
        _ => None,
    }
}

fn parse_line(s: &str) -> ImapLine {
    let (untagged, tag, rest) = if let Some(rest) = s.strip_prefix('*') {
        (true, None, rest.trim_start())
    } else if s.starts_with('+') {
        (false, None, "")
    } else {
        let mut sp = s.splitn(2, ' ');
        let t = sp.next().unwrap_or("").to_string();
        (false, Some(t).filter(|t| !t.is_empty()), sp.next().unwrap_or(""))
    };
    let mut sp = rest.splitn(2, ' ');
    let status = sp.next().and_then(parse_status_word);
    let rest = if status.is_some() {
        sp.next().unwrap_or("").to_string()
    } else {
        rest.to_string()
    };
    ImapLine {
        tag,
        untagged,
        status,
        rest,
    }
}

const LITERAL_CHUNK: usize = 64 * 1024;

/// If the line ends with `{N}`, the size of the literal that follows.
fn literal_size(line: &str) -> Option<usize> {
    let open = line.rfind('{')?;
    line[open + 1..].strip_suffix('}')?.trim().parse().ok()
}

/// Read one logical response, pulling in every literal and the line text after it.
async fn read_response<S>(stream: &mut S, buf: &mut Vec<u8>) -> io::Result<ResponseLine>
where
    S: AsyncBufRead + Unpin,
{
    let mut response = ResponseLine::default();
    loop {
        buf.clear();
        let n = stream.read_until(b'\n', buf).await?;
        if n == 0 || !buf.ends_with(b"\n") {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        let mut end = buf.len() - 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
        let part = String::from_utf8_lossy(&buf[..end]);
        response.text.push_str(&part);
        match literal_size(&part) {
            Some(size) => {
                // The buffer grows with the bytes actually received, not with the announced size.
                let mut literal = Vec::with_capacity(size.min(LITERAL_CHUNK));
                (&mut *stream).take(size as u64).read_to_end(&mut literal).await?;
                if literal.len() < size {
                    return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed in literal"));
                }
                response.literals.push(literal);
            }
            None => return Ok(response),
        }
    }
}

/// Write a line (no CRLF) then CRLF.
async fn write_line<S>(stream: &mut S, line: &[u8]) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(line).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await?;
    Ok(())
}

fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Parse capability list from "* CAPABILITY IMAP4rev1 STARTTLS ..." or from a [CAPABILITY ...] response code.
fn parse_capabilities(line: &str) -> Vec<String> {
    let s = line
        .strip_prefix("* CAPABILITY ")
        .or_else(|| {
            line.find("[CAPABILITY ")
                .map(|i| &line[i + 12..])
                .and_then(|t| t.split(']').next())
        })
        .unwrap_or("");
    s.split_whitespace().map(|w| w.to_ascii_uppercase()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(String),
    Quoted(String),
    Literal(Vec<u8>),
    Open,
    Close,
}

impl Token {
    /// astring value (atom, quoted string or literal).
    fn astring(&self) -> Option<String> {
        match self {
            Token::Atom(s) | Token::Quoted(s) => Some(s.clone()),
            Token::Literal(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }

    fn is_nil(&self) -> bool {
        matches!(self, Token::Atom(s) if s.eq_ignore_ascii_case("NIL"))
    }

    fn number<T: std::str::FromStr>(&self) -> Option<T> {
        match self {
            Token::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Split response text into tokens, substituting `{N}` markers with the literals.
/// Brackets inside an atom (`BODY[1.2]<0>`) are kept with the atom.
fn tokenize(text: &str, literals: &[Vec<u8>]) -> Result<Vec<Token>, TransportError> {
    let mut tokens = Vec::new();
    let mut literals = literals.iter();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(e) = chars.next() {
                                s.push(e);
                            }
                        }
                        Some('"') => break,
                        Some(ch) => s.push(ch),
                        None => {
                            return Err(TransportError::Parse(format!("unterminated string: {}", text)))
                        }
                    }
                }
                tokens.push(Token::Quoted(s));
            }
            '{' => {
                chars.next();
                let mut digits = String::new();
                for ch in chars.by_ref() {
                    if ch == '}' {
                        break;
                    }
                    digits.push(ch);
                }
                let size: usize = digits
                    .trim_end_matches('+')
                    .parse()
                    .map_err(|_| TransportError::Parse(format!("bad literal size: {}", text)))?;
                let literal = literals
                    .next()
                    .ok_or_else(|| TransportError::Parse(format!("missing literal: {}", text)))?;
                if literal.len() != size {
                    return Err(TransportError::Parse(format!("literal length mismatch: {}", text)));
                }
                tokens.push(Token::Literal(literal.clone()));
            }
            _ => {
                let mut atom = String::new();
                let mut depth = 0usize;
                while let Some(&ch) = chars.peek() {
                    if depth == 0 && (ch == ' ' || ch == '(' || ch == ')') {
                        break;
                    }
                    match ch {
                        '[' => depth += 1,
                        ']' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    atom.push(ch);
                    chars.next();
                }
                tokens.push(Token::Atom(atom));
            }
        }
    }
    Ok(tokens)
}

fn is_keyword(token: Option<&Token>, keyword: &str) -> bool {
    matches!(token, Some(Token::Atom(s)) if s.eq_ignore_ascii_case(keyword))
}

/// Index just past the group opened at `start` (which must be an Open token).
fn skip_group(tokens: &[Token], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < tokens.len() {
        match tokens[i] {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    tokens.len()
}

/// Parse "* n FETCH (...)". Returns None for other untagged responses.
fn parse_fetch(line: &ResponseLine) -> Result<Option<FetchResponse>, TransportError> {
    let tokens = tokenize(&line.text, &line.literals)?;
    if !is_keyword(tokens.first(), "*") || !is_keyword(tokens.get(2), "FETCH") {
        return Ok(None);
    }
    let seq = tokens[1]
        .number()
        .ok_or_else(|| TransportError::Parse(format!("bad FETCH sequence number: {}", line.text)))?;
    if tokens.get(3) != Some(&Token::Open) {
        return Err(TransportError::Parse(format!("FETCH without item list: {}", line.text)));
    }
    let mut response = FetchResponse {
        seq,
        uid: None,
        body_sections: Vec::new(),
    };
    let mut i = 4;
    while i < tokens.len() && tokens[i] != Token::Close {
        let name = match &tokens[i] {
            Token::Atom(a) => a.to_ascii_uppercase(),
            _ => return Err(TransportError::Parse(format!("bad FETCH item: {}", line.text))),
        };
        let value = tokens
            .get(i + 1)
            .ok_or_else(|| TransportError::Parse(format!("FETCH item without value: {}", line.text)))?;
        if name == "UID" {
            response.uid = Some(
                value
                    .number()
                    .ok_or_else(|| TransportError::Parse(format!("bad UID: {}", line.text)))?,
            );
            i += 2;
        } else if let Some(after) = name.strip_prefix("BODY[") {
            let section = after.split(']').next().unwrap_or("").to_string();
            let data = match value {
                Token::Quoted(s) => Some(s.clone().into_bytes()),
                Token::Literal(b) => Some(b.clone()),
                t if t.is_nil() => None,
                _ => return Err(TransportError::Parse(format!("bad body section value: {}", line.text))),
            };
            response.body_sections.push(BodySection { section, data });
            i += 2;
        } else if *value == Token::Open {
            i = skip_group(&tokens, i + 1);
        } else {
            i += 2;
        }
    }
    Ok(Some(response))
}

/// Parse "* LIST (attrs) delim name" (or LSUB / XLIST).
fn parse_list(line: &ResponseLine, verb: &str) -> Result<Option<RawListEntry>, TransportError> {
    let tokens = tokenize(&line.text, &line.literals)?;
    if !is_keyword(tokens.first(), "*") || !is_keyword(tokens.get(1), verb) {
        return Ok(None);
    }
    let bad = || TransportError::Parse(format!("bad {} response: {}", verb, line.text));
    if tokens.get(2) != Some(&Token::Open) {
        return Err(bad());
    }
    let mut selectability = None;
    let mut flags = Vec::new();
    let mut i = 3;
    loop {
        match tokens.get(i) {
            Some(Token::Close) => break,
            Some(Token::Atom(attr)) => {
                let sel = match attr.to_ascii_lowercase().as_str() {
                    "\\marked" => Some(Selectability::Marked),
                    "\\unmarked" => Some(Selectability::Unmarked),
                    "\\noselect" | "\\nonexistent" => Some(Selectability::NoSelect),
                    "\\noinferiors" => {
                        flags.push(ListFlag::NoInferiors);
                        None
                    }
                    _ => {
                        flags.push(ListFlag::Extension(attr.clone()));
                        None
                    }
                };
                if selectability.is_none() {
                    selectability = sel;
                }
            }
            _ => return Err(bad()),
        }
        i += 1;
    }
    let delimiter = match tokens.get(i + 1) {
        Some(t) if t.is_nil() => None,
        Some(Token::Quoted(d)) => d.chars().next(),
        _ => return Err(bad()),
    };
    let name = tokens.get(i + 2).and_then(Token::astring).ok_or_else(bad)?;
    Ok(Some(RawListEntry {
        name,
        delimiter,
        selectability,
        flags,
    }))
}

/// Parse "* STATUS name (KEY value ...)".
fn parse_status(line: &ResponseLine) -> Result<Option<Vec<StatusAttribute>>, TransportError> {
    let tokens = tokenize(&line.text, &line.literals)?;
    if !is_keyword(tokens.first(), "*") || !is_keyword(tokens.get(1), "STATUS") {
        return Ok(None);
    }
    let bad = || TransportError::Parse(format!("bad STATUS response: {}", line.text));
    if tokens.get(3) != Some(&Token::Open) {
        return Err(bad());
    }
    let mut attributes = Vec::new();
    let mut i = 4;
    while let Some(Token::Atom(key)) = tokens.get(i) {
        let value = tokens.get(i + 1).ok_or_else(bad)?;
        let attr = match key.to_ascii_uppercase().as_str() {
            "MESSAGES" => StatusAttribute::Messages(value.number().ok_or_else(bad)?),
            "RECENT" => StatusAttribute::Recent(value.number().ok_or_else(bad)?),
            "UIDNEXT" => StatusAttribute::UidNext(value.number().ok_or_else(bad)?),
            "UIDVALIDITY" => StatusAttribute::UidValidity(value.number().ok_or_else(bad)?),
            "UNSEEN" => StatusAttribute::Unseen(value.number().ok_or_else(bad)?),
            "HIGHESTMODSEQ" => StatusAttribute::HighestModSeq(value.number().ok_or_else(bad)?),
            _ => match value.number() {
                Some(n) => StatusAttribute::Extension(key.clone(), n),
                None => {
                    trace!("skipping non-numeric STATUS item {}", key);
                    i += 2;
                    continue;
                }
            },
        };
        attributes.push(attr);
        i += 2;
    }
    if tokens.get(i) != Some(&Token::Close) {
        return Err(bad());
    }
    Ok(Some(attributes))
}

/// Connected IMAP client. Not authenticated until [`ImapClient::login`] succeeds
/// unless the greeting was PREAUTH.
pub struct ImapClient {
    stream: BufStream<MailStream>,
    read_buf: Vec<u8>,
    capabilities: Vec<String>,
    tag_counter: u32,
}

impl ImapClient {
    /// Open the connection, read the greeting and learn capabilities.
    /// In STARTTLS mode the upgrade happens here, before anything else is sent.
    pub async fn connect(
        host: &str,
        port: u16,
        mode: ConnectionMode,
        nodelay: bool,
    ) -> Result<(Self, Greeting), TransportError> {
        let stream = match mode {
            ConnectionMode::Tls => MailStream::connect_implicit_tls(host, port, nodelay).await?,
            ConnectionMode::Plain | ConnectionMode::StartTls => {
                MailStream::connect_plain(host, port, nodelay).await?
            }
        };
        debug!("connected to {}:{} ({:?})", host, port, mode);
        let mut client = ImapClient {
            stream: BufStream::new(stream),
            read_buf: Vec::with_capacity(4096),
            capabilities: Vec::new(),
            tag_counter: 0,
        };
        let greeting = client.read_greeting().await?;
        if client.capabilities.is_empty() {
            client.refresh_capabilities().await?;
        }
        if mode == ConnectionMode::StartTls {
            if greeting == Greeting::Authenticated {
                warn!("server sent PREAUTH; STARTTLS is not permitted, continuing in plain text");
            } else {
                if !client.has_capability("STARTTLS") {
                    return Err(TransportError::Stream(
                        "server does not advertise STARTTLS".to_string(),
                    ));
                }
                client.run_command("STARTTLS").await?;
                client = client.upgrade_to_tls(host).await?;
                client.refresh_capabilities().await?;
            }
        }
        Ok((client, greeting))
    }

    async fn read_greeting(&mut self) -> Result<Greeting, TransportError> {
        let line = read_response(&mut self.stream, &mut self.read_buf).await?;
        trace!("S: {}", line.text);
        let parsed = parse_line(&line.text);
        let greeting = match (parsed.untagged, parsed.status) {
            (true, Some(ImapStatus::Ok)) => Greeting::NotAuthenticated,
            (true, Some(ImapStatus::PreAuth)) => Greeting::Authenticated,
            (true, Some(ImapStatus::Bye)) => {
                return Err(TransportError::Stream(format!("server refused connection: {}", parsed.rest)))
            }
            _ => {
                return Err(TransportError::Parse(format!("expected greeting, got: {}", line.text)))
            }
        };
        self.capabilities = parse_capabilities(&parsed.rest);
        Ok(greeting)
    }

    async fn upgrade_to_tls(self, host: &str) -> Result<Self, TransportError> {
        let ImapClient {
            stream,
            read_buf,
            tag_counter,
            ..
        } = self;
        let tls = stream.into_inner().upgrade_to_tls(host).await?;
        debug!("STARTTLS negotiated with {}", host);
        Ok(ImapClient {
            stream: BufStream::new(tls),
            read_buf,
            capabilities: Vec::new(),
            tag_counter,
        })
    }

    /// Generate next tag (A0001, A0002, ...).
    fn next_tag(&mut self) -> String {
        self.tag_counter = self.tag_counter % 9999 + 1;
        format!("A{:04}", self.tag_counter)
    }

    /// Send a command and collect untagged responses until the tagged completion.
    /// NO and BAD completions become errors carrying the server text.
    async fn run_command(&mut self, command: &str) -> Result<Vec<ResponseLine>, TransportError> {
        let tag = self.next_tag();
        if command.starts_with("LOGIN ") {
            debug!("C: {} LOGIN ***", tag);
        } else {
            debug!("C: {} {}", tag, command);
        }
        write_line(&mut self.stream, format!("{} {}", tag, command).as_bytes()).await?;
        let mut untagged = Vec::new();
        loop {
            let line = read_response(&mut self.stream, &mut self.read_buf).await?;
            trace!("S: {}", line.text);
            let parsed = parse_line(&line.text);
            if parsed.tag.as_deref() == Some(tag.as_str()) {
                return match parsed.status {
                    Some(ImapStatus::Ok) => {
                        let caps = parse_capabilities(&parsed.rest);
                        if !caps.is_empty() {
                            self.capabilities = caps;
                        }
                        Ok(untagged)
                    }
                    Some(ImapStatus::No) => Err(TransportError::No(parsed.rest)),
                    Some(ImapStatus::Bad) => Err(TransportError::Bad(parsed.rest)),
                    _ => Err(TransportError::Parse(format!("unexpected completion: {}", line.text))),
                };
            }
            if parsed.untagged {
                if parsed.status == Some(ImapStatus::Bye) {
                    debug!("server closing connection: {}", parsed.rest);
                }
                if line.text.starts_with("* CAPABILITY ") {
                    self.capabilities = parse_capabilities(&line.text);
                }
                untagged.push(line);
            }
        }
    }

    async fn refresh_capabilities(&mut self) -> Result<(), TransportError> {
        self.run_command("CAPABILITY").await?;
        Ok(())
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub async fn login(&mut self, user: &str, password: &str) -> Result<(), TransportError> {
        if !self.stream.get_ref().is_tls() {
            warn!("sending credentials without TLS");
        }
        let cmd = format!("LOGIN {} {}", quote_string(user), quote_string(password));
        let before = self.capabilities.clone();
        self.run_command(&cmd).await?;
        // Capabilities usually change after authentication.
        if self.capabilities == before {
            self.refresh_capabilities().await?;
        }
        Ok(())
    }

    pub async fn select(&mut self, mailbox: &str) -> Result<(), TransportError> {
        self.run_command(&format!("SELECT {}", quote_string(mailbox))).await?;
        Ok(())
    }

    pub async fn fetch(&mut self, request: &FetchRequest) -> Result<Vec<FetchResponse>, TransportError> {
        let untagged = self.run_command(&request.command()).await?;
        let mut responses = Vec::new();
        for line in &untagged {
            if let Some(r) = parse_fetch(line)? {
                responses.push(r);
            }
        }
        Ok(responses)
    }

    pub async fn list(
        &mut self,
        command: ListCommand,
        reference: &str,
        pattern: &str,
    ) -> Result<Vec<RawListEntry>, TransportError> {
        let verb = command.verb();
        let cmd = format!("{} {} {}", verb, quote_string(reference), quote_string(pattern));
        let untagged = self.run_command(&cmd).await?;
        let mut entries = Vec::new();
        for line in &untagged {
            if let Some(entry) = parse_list(line, verb)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub async fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusItem],
    ) -> Result<Vec<StatusAttribute>, TransportError> {
        let atoms: Vec<&str> = items.iter().map(|i| i.atom()).collect();
        let cmd = format!("STATUS {} ({})", quote_string(mailbox), atoms.join(" "));
        let untagged = self.run_command(&cmd).await?;
        let mut attributes = Vec::new();
        for line in &untagged {
            if let Some(attrs) = parse_status(line)? {
                attributes.extend(attrs);
            }
        }
        Ok(attributes)
    }

    pub async fn create(&mut self, mailbox: &str) -> Result<(), TransportError> {
        self.run_command(&format!("CREATE {}", quote_string(mailbox))).await?;
        Ok(())
    }

    pub async fn delete(&mut self, mailbox: &str) -> Result<(), TransportError> {
        self.run_command(&format!("DELETE {}", quote_string(mailbox))).await?;
        Ok(())
    }

    pub async fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        let cmd = format!("RENAME {} {}", quote_string(from), quote_string(to));
        self.run_command(&cmd).await?;
        Ok(())
    }

    pub async fn subscribe(&mut self, mailbox: &str) -> Result<(), TransportError> {
        self.run_command(&format!("SUBSCRIBE {}", quote_string(mailbox))).await?;
        Ok(())
    }

    pub async fn unsubscribe(&mut self, mailbox: &str) -> Result<(), TransportError> {
        self.run_command(&format!("UNSUBSCRIBE {}", quote_string(mailbox))).await?;
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), TransportError> {
        self.run_command("LOGOUT").await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    fn line(text: &str) -> ResponseLine {
        ResponseLine {
            text: text.to_string(),
            literals: Vec::new(),
        }
    }

    #[test]
    fn classify_lines() {
        let l = parse_line("A0003 NO [NONEXISTENT] Unknown mailbox");
        assert_eq!(l.tag.as_deref(), Some("A0003"));
        assert_eq!(l.status, Some(ImapStatus::No));
        assert_eq!(l.rest, "[NONEXISTENT] Unknown mailbox");

        let l = parse_line("* PREAUTH IMAP4rev1 server ready");
        assert!(l.untagged);
        assert_eq!(l.status, Some(ImapStatus::PreAuth));

        let l = parse_line("* 3 EXISTS");
        assert!(l.untagged);
        assert_eq!(l.status, None);
    }

    #[test]
    fn capabilities_from_response_code() {
        let caps = parse_capabilities("[CAPABILITY IMAP4rev1 STARTTLS LOGINDISABLED] ready");
        assert_eq!(caps, vec!["IMAP4REV1", "STARTTLS", "LOGINDISABLED"]);
        let caps = parse_capabilities("* CAPABILITY IMAP4rev1 XLIST condstore");
        assert_eq!(caps, vec!["IMAP4REV1", "XLIST", "CONDSTORE"]);
    }

    #[tokio::test]
    async fn read_response_collects_literals() {
        let data: &[u8] = b"* 1 FETCH (UID 9 BODY[1] {5}\r\nhello BODY[2] {3}\r\nabc)\r\nA0001 OK done\r\n";
        let mut reader = BufReader::new(data);
        let mut buf = Vec::new();
        let first = read_response(&mut reader, &mut buf).await.unwrap();
        assert_eq!(first.literals, vec![b"hello".to_vec(), b"abc".to_vec()]);
        let second = read_response(&mut reader, &mut buf).await.unwrap();
        assert_eq!(second.text, "A0001 OK done");
        assert!(read_response(&mut reader, &mut buf).await.is_err());
    }

    #[tokio::test]
    async fn read_response_oversized_literal_is_eof() {
        let data: &[u8] = b"* 1 FETCH (BODY[1] {4000000000}\r\nshort";
        let mut reader = BufReader::new(data);
        let mut buf = Vec::new();
        let err = read_response(&mut reader, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn read_response_empty_literal() {
        let data: &[u8] = b"* 1 FETCH (UID 3 BODY[1] {0}\r\n)\r\n";
        let mut reader = BufReader::new(data);
        let mut buf = Vec::new();
        let r = read_response(&mut reader, &mut buf).await.unwrap();
        assert_eq!(r.literals, vec![Vec::<u8>::new()]);
        let f = parse_fetch(&r).unwrap().unwrap();
        assert_eq!(f.body_sections[0].data.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn fetch_with_literal_and_partial() {
        let resp = ResponseLine {
            text: "* 4 FETCH (UID 17 FLAGS (\\Seen) BODY[2.1]<0> {4})".to_string(),
            literals: vec![b"QUJD".to_vec()],
        };
        let r = parse_fetch(&resp).unwrap().unwrap();
        assert_eq!(r.seq, 4);
        assert_eq!(r.uid, Some(17));
        assert_eq!(r.body_sections.len(), 1);
        assert_eq!(r.body_sections[0].section, "2.1");
        assert_eq!(r.body_sections[0].data.as_deref(), Some(&b"QUJD"[..]));
    }

    #[test]
    fn fetch_nil_and_quoted_bodies() {
        let r = parse_fetch(&line("* 1 FETCH (BODY[] NIL)")).unwrap().unwrap();
        assert_eq!(r.body_sections[0].data, None);
        let r = parse_fetch(&line("* 1 FETCH (BODY[1] \"hi\")")).unwrap().unwrap();
        assert_eq!(r.body_sections[0].data.as_deref(), Some(&b"hi"[..]));
        assert!(parse_fetch(&line("* 1 EXISTS")).unwrap().is_none());
    }

    #[test]
    fn list_entries() {
        let e = parse_list(&line(r#"* LIST (\HasNoChildren \Trash) "/" "Deleted Items""#), "LIST")
            .unwrap()
            .unwrap();
        assert_eq!(e.name, "Deleted Items");
        assert_eq!(e.delimiter, Some('/'));
        assert_eq!(e.selectability, None);
        assert_eq!(
            e.flags,
            vec![
                ListFlag::Extension("\\HasNoChildren".to_string()),
                ListFlag::Extension("\\Trash".to_string())
            ]
        );

        let e = parse_list(&line(r#"* LSUB (\Noselect \NoInferiors) NIL inbox"#), "LSUB")
            .unwrap()
            .unwrap();
        assert_eq!(e.name, "inbox");
        assert_eq!(e.delimiter, None);
        assert_eq!(e.selectability, Some(Selectability::NoSelect));
        assert_eq!(e.flags, vec![ListFlag::NoInferiors]);
    }

    #[test]
    fn list_name_as_literal() {
        let resp = ResponseLine {
            text: r#"* LIST () "." {8}"#.to_string(),
            literals: vec![b"Caf\xc3\xa9 \"x".to_vec()],
        };
        let e = parse_list(&resp, "LIST").unwrap().unwrap();
        assert_eq!(e.name, "Café \"x");
        assert_eq!(e.delimiter, Some('.'));
    }

    #[test]
    fn status_attributes() {
        let attrs = parse_status(&line(
            "* STATUS INBOX (MESSAGES 12 UNSEEN 3 UIDNEXT 44 HIGHESTMODSEQ 90000000001 X-GM-FOO 7)",
        ))
        .unwrap()
        .unwrap();
        assert_eq!(
            attrs,
            vec![
                StatusAttribute::Messages(12),
                StatusAttribute::Unseen(3),
                StatusAttribute::UidNext(44),
                StatusAttribute::HighestModSeq(90000000001),
                StatusAttribute::Extension("X-GM-FOO".to_string(), 7),
            ]
        );
        assert!(parse_status(&line("* STATUS INBOX (MESSAGES x)")).is_err());
    }
}
