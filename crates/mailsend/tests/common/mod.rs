//! Scripted SMTP server on the loopback interface.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// Self-signed P-256 certificate for `localhost` and `127.0.0.1`.
const CERT_PEM: &[u8] = include_bytes!("fixtures/cert.pem");
const KEY_PEM: &[u8] = include_bytes!("fixtures/key.pem");

trait Io: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

type Conn = BufReader<Box<dyn Io>>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("mailsend=debug,mailsend_smtp=trace")
        .try_init();
}

/// What the server advertises and refuses.
#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    pub starttls: bool,
    pub auth: bool,
    pub reject: Vec<&'static str>,
}

/// Everything the server saw during one session.
#[derive(Debug, Default)]
pub struct Transcript {
    /// Command lines, without the DATA content.
    pub commands: Vec<String>,
    /// Message content after un-stuffing, without the final `.` line.
    pub data: Option<Vec<u8>>,
    pub tls: bool,
    pub handshake_failed: bool,
    pub quit: bool,
    /// The client closed the connection.
    pub eof: bool,
}

pub struct Server {
    addr: SocketAddr,
    handle: JoinHandle<Transcript>,
}

impl Server {
    /// Listens on an ephemeral port and serves a single session.
    pub async fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let io: Box<dyn Io> = Box::new(socket);
            converse(BufReader::new(io), &behaviour).await
        });
        Self { addr, handle }
    }

    /// `host:port` of the server.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Waits for the session to end. Fails if the client keeps the
    /// connection open.
    pub async fn finish(self) -> Transcript {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("client did not release the connection")
            .unwrap()
    }
}

pub fn tls_acceptor() -> TlsAcceptor {
    let certs = CertificateDer::pem_slice_iter(CERT_PEM)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let key = PrivateKeyDer::from_pem_slice(KEY_PEM).unwrap();
    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

async fn reply(conn: &mut Conn, text: &str) {
    let io = conn.get_mut();
    let _ = io.write_all(text.as_bytes()).await;
    let _ = io.flush().await;
}

async fn read_line(conn: &mut Conn) -> Option<String> {
    let mut line = String::new();
    match conn.read_line(&mut line).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}

async fn converse(mut conn: Conn, behaviour: &Behaviour) -> Transcript {
    let mut transcript = Transcript::default();
    reply(&mut conn, "220 test.local ESMTP\r\n").await;

    loop {
        let Some(line) = read_line(&mut conn).await else {
            transcript.eof = true;
            return transcript;
        };
        transcript.commands.push(line.clone());
        let verb = line
            .split([' ', ':'])
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        match verb.as_str() {
            "EHLO" => {
                let mut text = String::from("250-test.local\r\n");
                if behaviour.starttls && !transcript.tls {
                    text.push_str("250-STARTTLS\r\n");
                }
                if behaviour.auth {
                    text.push_str("250-AUTH PLAIN LOGIN\r\n");
                }
                text.push_str("250 8BITMIME\r\n");
                reply(&mut conn, &text).await;
            }
            "STARTTLS" => {
                reply(&mut conn, "220 Ready to start TLS\r\n").await;
                match tls_acceptor().accept(conn.into_inner()).await {
                    Ok(tls) => {
                        let io: Box<dyn Io> = Box::new(tls);
                        conn = BufReader::new(io);
                        transcript.tls = true;
                    }
                    Err(_) => {
                        transcript.handshake_failed = true;
                        return transcript;
                    }
                }
            }
            "AUTH" => reply(&mut conn, "235 2.7.0 Authentication successful\r\n").await,
            "MAIL" => reply(&mut conn, "250 2.1.0 OK\r\n").await,
            "RCPT" => {
                let path = line
                    .split_once('<')
                    .and_then(|(_, rest)| rest.split_once('>'))
                    .map_or("", |(path, _)| path);
                if behaviour.reject.iter().any(|r| *r == path) {
                    reply(&mut conn, "550 5.1.1 No such user\r\n").await;
                } else {
                    reply(&mut conn, "250 2.1.5 OK\r\n").await;
                }
            }
            "DATA" => {
                reply(&mut conn, "354 End data with <CR><LF>.<CR><LF>\r\n").await;
                let mut data = Vec::new();
                loop {
                    let Some(line) = read_line(&mut conn).await else {
                        transcript.eof = true;
                        return transcript;
                    };
                    if line == "." {
                        break;
                    }
                    let line = line
                        .strip_prefix('.')
                        .filter(|rest| rest.starts_with('.'))
                        .unwrap_or(line.as_str());
                    data.extend_from_slice(line.as_bytes());
                    data.extend_from_slice(b"\r\n");
                }
                transcript.data = Some(data);
                reply(&mut conn, "250 2.0.0 Queued\r\n").await;
            }
            "QUIT" => {
                transcript.quit = true;
                reply(&mut conn, "221 2.0.0 Bye\r\n").await;
            }
            _ => reply(&mut conn, "500 5.5.2 Unrecognized command\r\n").await,
        }
    }
}
