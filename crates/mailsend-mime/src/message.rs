//! Single-part HTML message composition.

use crate::address::Mailbox;
use crate::encoding::{decode_base64, encode_base64_lines, encode_words};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Content type of every message body.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Transfer encoding of every message body.
pub const TRANSFER_ENCODING: &str = "base64";

/// A composed message: ordered headers plus the raw (unencoded) HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    headers: Headers,
    body: Vec<u8>,
}

impl Message {
    /// Header fields in rendering order.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The HTML body before transfer encoding.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Renders the DATA payload: headers, a blank line, the base64 body and
    /// a trailing CRLF.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.headers.to_string().into_bytes();
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(encode_base64_lines(&self.body).as_bytes());
        out.extend_from_slice(b"\r\n");
        out
    }

    /// Parses a rendered message back into headers and decoded body.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is missing or malformed, or if a
    /// base64 body does not decode.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .ok_or_else(|| Error::InvalidHeader("missing header terminator".to_string()))?;

        let head = String::from_utf8(raw[..split + 2].to_vec())?;
        let headers = Headers::parse(&head)?;
        let content = &raw[split + 4..];

        let body = match headers.get("Content-Transfer-Encoding") {
            Some(encoding) if encoding.eq_ignore_ascii_case(TRANSFER_ENCODING) => {
                decode_base64(&String::from_utf8(content.to_vec())?)?
            }
            _ => content.to_vec(),
        };

        Ok(Self { headers, body })
    }
}

/// Builder for HTML messages.
///
/// Header order is fixed: `Subject`, `From`, `To`, `Cc`, `Bcc`,
/// `Content-Type`, `Content-Transfer-Encoding`. `Cc` and `Bcc` are left out
/// when they have no mailboxes.
///
/// # Example
///
/// ```
/// use mailsend_mime::{Mailbox, MessageBuilder};
///
/// let message = MessageBuilder::new(Mailbox::parse("me@x.com")?)
///     .to([Mailbox::parse("a@x.com")?])
///     .subject("Hi")
///     .html_body("<p>x</p>")
///     .build()?;
///
/// let rendered = String::from_utf8(message.to_bytes()).unwrap();
/// assert!(rendered.contains("\r\nTo: a@x.com\r\n"));
/// assert!(!rendered.contains("Cc:"));
/// # Ok::<(), mailsend_mime::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    from: Mailbox,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    subject: Vec<u8>,
    body: Vec<u8>,
}

impl MessageBuilder {
    /// Starts a message from the given sender.
    #[must_use]
    pub const fn new(from: Mailbox) -> Self {
        Self {
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Adds `To` recipients.
    #[must_use]
    pub fn to(mut self, mailboxes: impl IntoIterator<Item = Mailbox>) -> Self {
        self.to.extend(mailboxes);
        self
    }

    /// Adds `Cc` recipients.
    #[must_use]
    pub fn cc(mut self, mailboxes: impl IntoIterator<Item = Mailbox>) -> Self {
        self.cc.extend(mailboxes);
        self
    }

    /// Adds `Bcc` recipients.
    #[must_use]
    pub fn bcc(mut self, mailboxes: impl IntoIterator<Item = Mailbox>) -> Self {
        self.bcc.extend(mailboxes);
        self
    }

    /// Sets the subject. Any bytes are accepted; they are always sent as a
    /// UTF-8 "B" encoded word.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Vec<u8>>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value cannot be represented on one line.
    pub fn build(self) -> Result<Message> {
        let mut headers = Headers::new();
        headers.push("Subject", encode_words(&self.subject))?;
        headers.push("From", self.from.to_string())?;
        headers.push("To", join(&self.to))?;
        if !self.cc.is_empty() {
            headers.push("Cc", join(&self.cc))?;
        }
        if !self.bcc.is_empty() {
            headers.push("Bcc", join(&self.bcc))?;
        }
        headers.push("Content-Type", HTML_CONTENT_TYPE)?;
        headers.push("Content-Transfer-Encoding", TRANSFER_ENCODING)?;

        Ok(Message {
            headers,
            body: self.body,
        })
    }
}

fn join(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
