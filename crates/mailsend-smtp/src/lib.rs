//! # mailsend-smtp
//!
//! A small async SMTP client implementing the subset of RFC 5321 needed to
//! submit a single message: EHLO, STARTTLS, AUTH PLAIN, MAIL FROM, RCPT TO,
//! DATA and QUIT.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsend_smtp::{Address, Client, TlsVerification};
//! use mailsend_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailsend_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587, None).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let client = client.ehlo("client.example.com").await?;
//!     let client = client
//!         .starttls("smtp.example.com", TlsVerification::WebPki)
//!         .await?;
//!     let client = client.auth_plain("user@example.com", "password").await?;
//!
//!     let client = client.mail_from(Address::new("sender@example.com")?, None).await?;
//!     let client = client.rcpt_to(Address::new("recipient@example.com")?).await?;
//!     let client = client.data().await?;
//!
//!     let client = client.send_message(b"Subject: Test\r\n\r\nHello\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! Every step consumes the client and hands back the next state, so a failed
//! step drops the connection:
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_plain() ───→ Authenticated
//! └──────────────┘
//!        │
//!        └─── mail_from() ───→ MailTransaction ───→ RecipientAdded ───→ Data
//! ```
//!
//! ## Certificate verification
//!
//! [`TlsVerification::Disabled`] accepts any server certificate. It exists
//! for relays on trusted networks that present self-signed certificates and
//! must not be used across the public internet.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpConnection, TlsVerification,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
