//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream, TlsVerification};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use std::collections::HashSet;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

/// Hostname announced in EHLO until [`Client::ehlo`] sets another one.
const DEFAULT_HELLO_NAME: &str = "localhost";

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
///
/// The client owns the connection. Dropping it, including when a step
/// returns an error, closes the socket.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    hello_name: String,
    io_timeout: Option<Duration>,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns true if the session runs over TLS.
    fn is_tls(&self) -> bool;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn is_tls(&self) -> bool {
        self.stream.is_tls()
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(stream: SmtpStream) -> Result<Self> {
        Self::from_stream_with_timeout(stream, None).await
    }

    /// Like [`Client::from_stream`], bounding every server reply by `io_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails, times out, or if the
    /// server returns an error.
    pub async fn from_stream_with_timeout(
        stream: SmtpStream,
        io_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut client = Self {
            stream,
            server_info: ServerInfo::default(),
            hello_name: DEFAULT_HELLO_NAME.to_string(),
            io_timeout,
            _state: PhantomData,
        };

        let greeting = client.read_reply().await?;
        if !greeting.is_success() {
            return Err(greeting.into_error());
        }

        // Extract hostname from greeting (first word after code)
        client.server_info.hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(client)
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        client_hostname.clone_into(&mut self.hello_name);
        self.refresh_extensions().await?;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS, then repeats EHLO.
    ///
    /// `hostname` is the name the certificate is checked against when
    /// `verification` is [`TlsVerification::WebPki`].
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(
        mut self,
        hostname: &str,
        verification: TlsVerification,
    ) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.expect_success(Command::StartTls).await?;

        let upgrade = self.stream.upgrade_to_tls(hostname, verification);
        self.stream = with_deadline(self.io_timeout, upgrade).await?;
        tracing::debug!(hostname, ?verification, "TLS established");

        // Capabilities learned before the handshake must be discarded.
        self.refresh_extensions().await?;
        Ok(self)
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if the server did not advertise AUTH or rejects the
    /// credentials.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        if !self.server_info.supports_auth() {
            return Err(Error::NotSupported("AUTH".into()));
        }

        // Build PLAIN response: \0username\0password
        let credentials = format!("\0{username}\0{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        self.expect_success(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(encoded),
        })
        .await?;

        Ok(self.into_state())
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// `size` behaves as for an authenticated client.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is too large or the MAIL FROM command fails.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }

    async fn refresh_extensions(&mut self) -> Result<()> {
        let reply = self
            .expect_success(Command::Ehlo {
                hostname: self.hello_name.clone(),
            })
            .await?;

        self.server_info.extensions = Extension::parse_ehlo(&reply.message)
            .into_iter()
            .collect::<HashSet<_>>();
        Ok(())
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// When `size` is given and the server advertised a SIZE limit, a
    /// message over the limit is refused locally and the size is declared
    /// with the `SIZE=` parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is too large or the MAIL FROM command fails.
    pub async fn mail_from(
        self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        self.start_transaction(from, size).await
    }
}

impl Client<MailTransaction> {
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.expect_success(Command::RcptTo { to }).await?;
        Ok(self.into_state())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        self.expect_success(Command::RcptTo { to }).await?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.send_command(Command::Data).await?;

        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }

        Ok(self.into_state())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// byte-stuffed and the terminating `.` line is added.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let payload = dot_stuff(message);
        self.stream.write_all(&payload).await?;

        let reply = self.read_reply().await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }

        Ok(self.into_state())
    }
}

// Common implementation for all states
impl<S> Client<S> {
    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            hello_name: self.hello_name,
            io_timeout: self.io_timeout,
            _state: PhantomData,
        }
    }

    async fn start_transaction(
        mut self,
        from: Address,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        let limit = self.server_info.max_message_size();
        if let (Some(size), Some(limit)) = (size, limit) {
            if size > limit {
                return Err(Error::MessageTooLarge { size, limit });
            }
        }

        // SIZE= is only legal when the server advertised the extension.
        let advertised = self
            .server_info
            .extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)));
        let size = size.filter(|_| advertised);

        self.expect_success(Command::MailFrom { from, size }).await?;
        Ok(self.into_state())
    }

    async fn expect_success(&mut self, cmd: Command) -> Result<Reply> {
        let reply = self.send_command(cmd).await?;
        if !reply.is_success() {
            return Err(reply.into_error());
        }
        Ok(reply)
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        tracing::trace!(verb = cmd.verb(), "sending command");
        self.stream.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let reply = with_deadline(self.io_timeout, read_reply_lines(&mut self.stream)).await?;
        tracing::trace!(code = reply.code.as_u16(), "reply");
        Ok(reply)
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error());
        }

        Ok(())
    }
}

async fn read_reply_lines(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

async fn with_deadline<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => fut.await,
    }
}

/// Prepares a message for the DATA phase.
///
/// Normalizes bare LF to CRLF, doubles a leading `.` on any line, makes
/// sure the content ends with CRLF and appends the `.` terminator line.
#[must_use]
pub fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);

    let body = message.strip_suffix(b"\n").unwrap_or(message);
    if !message.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
