//! # mailsend-mime
//!
//! Mailbox parsing and single-part HTML message rendering.
//!
//! ## Features
//!
//! - **Mailbox parsing**: `Name <user@host>`, quoted names, bare addresses
//! - **Message rendering**: ordered headers, base64 HTML body, CRLF endings
//! - **Encoding**: Base64 and RFC 2047 "B" encoded words
//!
//! ## Quick Start
//!
//! ```
//! use mailsend_mime::{Mailbox, MessageBuilder};
//!
//! let message = MessageBuilder::new(Mailbox::parse("Sender <sender@example.com>")?)
//!     .to([Mailbox::parse("recipient@example.com")?])
//!     .subject("Test Message")
//!     .html_body("<h1>Hello</h1>")
//!     .build()?;
//!
//! let payload: Vec<u8> = message.to_bytes();
//! assert!(payload.starts_with(b"Subject: =?UTF-8?B?"));
//! # Ok::<(), mailsend_mime::Error>(())
//! ```
//!
//! ### Encoding/Decoding
//!
//! ```
//! use mailsend_mime::encoding::{decode_base64, encode_base64, encode_rfc2047};
//!
//! let encoded = encode_base64(b"Hello, World!");
//! assert_eq!(decode_base64(&encoded)?, b"Hello, World!");
//!
//! assert_eq!(encode_rfc2047("Héllo"), "=?UTF-8?B?SMOpbGxv?=");
//! # Ok::<(), mailsend_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::Mailbox;
pub use error::{Error, Result};
pub use header::{Headers, MAX_LINE_LENGTH};
pub use message::{HTML_CONTENT_TYPE, Message, MessageBuilder, TRANSFER_ENCODING};
