//! Low-level SMTP stream handling.

use super::tls::{TlsVerification, connector};
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::time::Duration;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;

/// Longest reply line accepted from a server (RFC 5321 allows 512).
const MAX_REPLY_LINE: u64 = 4096;

/// Byte stream an SMTP session can run over.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

type BoxedIo = Box<dyn AsyncStream>;

/// SMTP stream (plain or TLS).
pub enum SmtpStream {
    /// Unencrypted connection.
    Plain(BufReader<BoxedIo>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<BoxedIo>>>),
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("SmtpStream::Plain"),
            Self::Tls(_) => f.write_str("SmtpStream::Tls"),
        }
    }
}

impl SmtpStream {
    /// Wraps an already-connected byte stream.
    pub fn from_io(io: impl AsyncStream + 'static) -> Self {
        Self::Plain(BufReader::new(Box::new(io)))
    }

    /// Returns true once the stream has been upgraded to TLS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads a line from the stream, without its line ending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or an error if
    /// the read fails or the line is unreasonably long.
    pub async fn read_line(&mut self) -> Result<String> {
        match self {
            Self::Plain(reader) => read_bounded_line(reader).await,
            Self::Tls(reader) => read_bounded_line(&mut **reader).await,
        }
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a plain stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// not a valid server name, or the TLS handshake fails.
    pub async fn upgrade_to_tls(
        self,
        hostname: &str,
        verification: TlsVerification,
    ) -> Result<Self> {
        let io = match self {
            Self::Plain(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

        let tls_stream = connector(verification)
            .connect(server_name, io)
            .await
            .map_err(Error::Tls)?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

async fn read_bounded_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = reader.take(MAX_REPLY_LINE).read_line(&mut line).await?;
    if n == 0 {
        return Err(Error::ConnectionClosed);
    }
    if !line.ends_with('\n') && n as u64 == MAX_REPLY_LINE {
        return Err(Error::Protocol(format!(
            "Reply line longer than {MAX_REPLY_LINE} bytes"
        )));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Connects to an SMTP server over plain TCP.
///
/// `hostname` may be a DNS name or an IPv4/IPv6 literal.
///
/// # Errors
///
/// Returns an error if the connection fails or does not complete in time.
pub async fn connect(hostname: &str, port: u16, timeout: Option<Duration>) -> Result<SmtpStream> {
    let connecting = TcpStream::connect((hostname, port));
    let stream = match timeout {
        Some(limit) => tokio::time::timeout(limit, connecting)
            .await
            .map_err(|_| Error::Timeout(limit))??,
        None => connecting.await?,
    };
    tracing::debug!(hostname, port, "connected");
    Ok(SmtpStream::from_io(stream))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn reads_crlf_lines() {
        let mock = Builder::new().read(b"220 ready\r\n250 OK\r\n").build();
        let mut stream = SmtpStream::from_io(mock);
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
        assert_eq!(stream.read_line().await.unwrap(), "250 OK");
        assert!(!stream.is_tls());
    }

    #[tokio::test]
    async fn writes_through_buffer() {
        let mock = Builder::new().write(b"QUIT\r\n").build();
        let mut stream = SmtpStream::from_io(mock);
        stream.write_all(b"QUIT\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_overlong_line() {
        let long = vec![b'x'; usize::try_from(MAX_REPLY_LINE).unwrap() + 10];
        let mock = Builder::new().read(&long).build();
        let mut stream = SmtpStream::from_io(mock);
        assert!(matches!(stream.read_line().await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn connect_refused_is_io_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port, Some(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
