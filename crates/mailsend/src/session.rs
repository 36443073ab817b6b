//! The SMTP session behind both send operations.

use crate::config::Config;
use crate::error::{Error, Result, Stage, at};
use crate::mail::Mail;
use mailsend_smtp::connection::{SmtpStream, connect};
use mailsend_smtp::{Address, Client, SmtpConnection, TlsVerification};

/// How the session uses STARTTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsMode {
    /// Upgrade with full verification when the server offers STARTTLS.
    Opportunistic,
    /// Always upgrade, accepting any certificate.
    RequiredSkipVerify,
}

/// Sends mail through one configured SMTP server.
///
/// Each call opens its own connection and closes it before returning,
/// whether delivery succeeded or not.
#[derive(Debug, Clone)]
pub struct Mailer {
    config: Config,
}

impl Mailer {
    /// Creates a mailer for the given server.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// The server configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sends `mail`, upgrading to verified TLS when the server offers it and
    /// authenticating with AUTH PLAIN when `password` is not empty.
    ///
    /// # Errors
    ///
    /// Returns a precondition error before connecting if the mail has no
    /// sender, no `To` recipient or an unparsable address. Otherwise returns
    /// the first failure of the session; nothing is retried.
    pub async fn send(&self, password: &str, mail: &Mail) -> Result<()> {
        self.deliver(password, mail, TlsMode::Opportunistic).await
    }

    /// Sends `mail` over STARTTLS **without verifying the server certificate**.
    ///
    /// Only for relays on a trusted network, such as a local MTA with a
    /// self-signed certificate. Anyone able to intercept the connection can
    /// read the message and the password.
    ///
    /// # Errors
    ///
    /// As for [`Mailer::send`]; also fails if the server does not offer
    /// STARTTLS.
    pub async fn send_skip_cert_verify(&self, password: &str, mail: &Mail) -> Result<()> {
        self.deliver(password, mail, TlsMode::RequiredSkipVerify)
            .await
    }

    async fn deliver(&self, password: &str, mail: &Mail, mode: TlsMode) -> Result<()> {
        let envelope = mail.envelope()?;
        let payload = mail.render(&envelope)?.to_bytes();
        let reverse_path = Address::new(envelope.from().address()).map_err(Error::Smtp)?;
        let forward_paths = envelope
            .recipients()
            .into_iter()
            .map(|mailbox| Address::new(mailbox.address()))
            .collect::<mailsend_smtp::Result<Vec<_>>>()
            .map_err(Error::Smtp)?;

        let config = &self.config;
        tracing::debug!(
            host = %config.host,
            port = config.port,
            recipients = forward_paths.len(),
            ?mode,
            "sending mail"
        );

        let stream = connect(&config.host, config.port, Some(config.connect_timeout))
            .await
            .map_err(at(Stage::Dial))?;

        let login = config
            .username
            .as_deref()
            .unwrap_or_else(|| envelope.from().address());
        let transaction = Transaction {
            config,
            mode,
            login,
            password,
            reverse_path,
            forward_paths,
            payload: &payload,
        };
        transaction.run(stream).await?;

        tracing::debug!(host = %config.host, "mail sent");
        Ok(())
    }
}

/// Everything one session needs once the connection is open.
struct Transaction<'a> {
    config: &'a Config,
    mode: TlsMode,
    login: &'a str,
    password: &'a str,
    reverse_path: Address,
    forward_paths: Vec<Address>,
    payload: &'a [u8],
}

impl Transaction<'_> {
    /// Drives the session from greeting to QUIT.
    ///
    /// The client owns the stream; any early return drops it and closes the
    /// connection.
    async fn run(self, stream: SmtpStream) -> Result<()> {
        let config = self.config;

        let client = Client::from_stream_with_timeout(stream, Some(config.io_timeout))
            .await
            .map_err(at(Stage::Dial))?;
        let client = client
            .ehlo(&config.hello_name)
            .await
            .map_err(at(Stage::Dial))?;

        let client = match self.mode {
            TlsMode::Opportunistic if client.server_info().supports_starttls() => client
                .starttls(&config.host, TlsVerification::WebPki)
                .await
                .map_err(at(Stage::StartTls))?,
            TlsMode::Opportunistic => client,
            TlsMode::RequiredSkipVerify => client
                .starttls(&config.host, TlsVerification::Disabled)
                .await
                .map_err(at(Stage::StartTls))?,
        };
        tracing::debug!(tls = client.is_tls(), "session ready");

        let size = Some(self.payload.len());
        let client = if self.password.is_empty() {
            client
                .mail_from(self.reverse_path, size)
                .await
                .map_err(at(Stage::Mail))?
        } else {
            if !client.is_tls() && !is_loopback_host(&config.host) {
                return Err(Error::InsecureAuth {
                    host: config.host.clone(),
                });
            }
            let client = client
                .auth_plain(self.login, self.password)
                .await
                .map_err(at(Stage::Auth))?;
            tracing::debug!(login = self.login, "authenticated");
            client
                .mail_from(self.reverse_path, size)
                .await
                .map_err(at(Stage::Mail))?
        };

        let mut forward_paths = self.forward_paths.into_iter();
        let first = forward_paths.next().ok_or(Error::NoTo)?;
        let mut client = client.rcpt_to(first).await.map_err(at(Stage::Rcpt))?;
        for path in forward_paths {
            client = client.rcpt_to(path).await.map_err(at(Stage::Rcpt))?;
        }

        let client = client.data().await.map_err(at(Stage::Data))?;
        let client = client
            .send_message(self.payload)
            .await
            .map_err(at(Stage::Data))?;

        client.quit().await.map_err(at(Stage::Quit))
    }
}

/// Hosts PLAIN credentials may be sent to without TLS.
fn is_loopback_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;

    const EHLO_AUTH: &[u8] = b"250-mx.example.com\r\n250-AUTH PLAIN\r\n250 8BITMIME\r\n";

    fn mail() -> Mail {
        Mail::new("me@x.com")
            .to("a@x.com")
            .cc("c@x.com")
            .subject("Hi")
            .body("<p>x</p>")
    }

    async fn run(config: &Config, password: &str, mock: tokio_test::io::Mock) -> Result<()> {
        let mail = mail();
        let envelope = mail.envelope().unwrap();
        let payload = mail.render(&envelope).unwrap().to_bytes();
        Transaction {
            config,
            mode: TlsMode::Opportunistic,
            login: "me@x.com",
            password,
            reverse_path: Address::new("me@x.com").unwrap(),
            forward_paths: envelope
                .recipients()
                .iter()
                .map(|m| Address::new(m.address()).unwrap())
                .collect(),
            payload: &payload,
        }
        .run(SmtpStream::from_io(mock))
        .await
    }

    #[tokio::test]
    async fn test_unusable_envelope_path_fails_before_connecting() {
        // A tab is legal in a quoted local part but not on a command line.
        let mail = Mail::new("me@x.com").to("\"a\tb\"@x.com");
        assert!(mail.envelope().is_ok());

        let mailer = Mailer::new(Config::new("mail.invalid", 25));
        let err = mailer.send("", &mail).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Smtp(mailsend_smtp::Error::InvalidAddress(_))
        ));
        assert!(err.is_precondition());
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_loopback_hosts() {
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("::1"));
        assert!(!is_loopback_host("mail.example.com"));
        assert!(!is_loopback_host("127.0.0.2"));
    }

    #[tokio::test]
    async fn test_plain_session_with_auth_on_localhost() {
        let config = Config::new("localhost", 25);
        let mut payload = mail().render(&mail().envelope().unwrap()).unwrap().to_bytes();
        payload.extend_from_slice(b".\r\n");

        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(EHLO_AUTH)
            .write(b"AUTH PLAIN AG1lQHguY29tAHNlY3JldA==\r\n")
            .read(b"235 Authenticated\r\n")
            .write(b"MAIL FROM:<me@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<a@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<c@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(&payload)
            .read(b"250 Queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        run(&config, "secret", mock).await.unwrap();
    }

    #[tokio::test]
    async fn test_credentials_withheld_from_remote_plaintext_server() {
        let config = Config::new("mail.example.com", 25);
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(EHLO_AUTH)
            .build();

        let err = run(&config, "secret", mock).await.unwrap_err();
        assert!(matches!(err, Error::InsecureAuth { ref host } if host == "mail.example.com"));
    }

    #[tokio::test]
    async fn test_rejected_recipient_stops_before_data() {
        let config = Config::new("mail.example.com", 25);
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250 mx.example.com\r\n")
            .write(b"MAIL FROM:<me@x.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<a@x.com>\r\n")
            .read(b"550 No such user\r\n")
            .build();

        let err = run(&config, "", mock).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Rcpt));
        assert_eq!(err.reply_code(), Some(550));
    }

    #[tokio::test]
    async fn test_greeting_rejection_is_a_dial_failure() {
        let config = Config::new("mail.example.com", 25);
        let mock = Builder::new()
            .read(b"554 No service\r\n")
            .build();

        let err = run(&config, "", mock).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Dial));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_server_times_out() {
        let config = Config::builder("mail.example.com")
            .io_timeout(Duration::from_secs(5))
            .build();
        let mock = Builder::new().wait(Duration::from_secs(10)).build();

        let err = run(&config, "", mock).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session {
                stage: Stage::Dial,
                source: mailsend_smtp::Error::Timeout(_),
            }
        ));
    }
}
