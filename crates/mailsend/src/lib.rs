//! # mailsend
//!
//! Compose an HTML email and deliver it over SMTP.
//!
//! ## Features
//!
//! - **Direct send**: opportunistic STARTTLS with full certificate
//!   verification, optional AUTH PLAIN
//! - **Skip-verify send**: mandatory STARTTLS that accepts any certificate,
//!   for trusted relays only
//! - **Message rendering**: base64 HTML body with an encoded subject
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailsend::Mail;
//!
//! # async fn example() -> mailsend::Result<()> {
//! let mail = Mail::new("Sender <sender@example.com>")
//!     .to("recipient@example.com")
//!     .cc("team@example.com")
//!     .subject("Report")
//!     .body("<h1>Done</h1>");
//!
//! mailsend::send("smtp.example.com:587", "app-password", &mail).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Use [`Mailer`] with a [`Config`] to change the EHLO name, timeouts or
//! login name.
//!
//! ## Skipping certificate verification
//!
//! [`send_skip_cert_verify`] exists for one situation: a relay on a
//! **trusted network** (usually `localhost` or the LAN) whose certificate
//! cannot be verified. The session is encrypted but not authenticated, so
//! anyone who can intercept the connection can read the message and the
//! password. Never point it at a server across the internet.
//!
//! ## Errors
//!
//! Empty sender, missing `To` recipients and unparsable addresses are
//! reported before any connection is made. Session failures carry the
//! [`Stage`] they happened in. Nothing is retried.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod mail;
mod session;

pub use config::{Config, ConfigBuilder, DEFAULT_HELLO_NAME, DEFAULT_PORT};
pub use error::{Error, Result, Stage};
pub use mail::{Envelope, Mail};
pub use mailsend_mime::Mailbox;
pub use session::Mailer;

/// Sends `mail` through the SMTP server at `addr` (`host:port`).
///
/// STARTTLS is used with certificate verification whenever the server
/// offers it. A non-empty `password` authenticates as the sender address
/// with AUTH PLAIN, which is refused over an unencrypted connection unless
/// the host is `localhost`, `127.0.0.1` or `::1`.
///
/// Recipients are every `to`, `cc` and `bcc` address, in that order.
///
/// # Errors
///
/// Returns [`Error::InvalidAddr`], [`Error::NoFrom`], [`Error::NoTo`] or
/// [`Error::Address`] before connecting, otherwise the first session
/// failure.
pub async fn send(addr: &str, password: &str, mail: &Mail) -> Result<()> {
    Mailer::new(Config::from_addr(addr)?).send(password, mail).await
}

/// Sends `mail` like [`send`], but always upgrades with STARTTLS and
/// **accepts any server certificate**.
///
/// Only for trusted relays; see the [crate documentation](crate).
///
/// # Errors
///
/// As for [`send`]; also fails if the server does not offer STARTTLS.
pub async fn send_skip_cert_verify(addr: &str, password: &str, mail: &Mail) -> Result<()> {
    Mailer::new(Config::from_addr(addr)?)
        .send_skip_cert_verify(password, mail)
        .await
}
