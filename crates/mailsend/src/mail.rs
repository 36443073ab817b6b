//! Mail to send and the envelope derived from it.

use crate::error::{Error, Result};
use mailsend_mime::{Mailbox, Message, MessageBuilder};

/// An HTML email to send.
///
/// Addresses are kept as text until sending, where each one is parsed as a
/// mailbox (`user@host` or `Name <user@host>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mail {
    /// Sender mailbox.
    pub from: String,
    /// `To` recipients. At least one is required.
    pub to: Vec<String>,
    /// `Cc` recipients.
    pub cc: Vec<String>,
    /// `Bcc` recipients.
    pub bcc: Vec<String>,
    /// Subject, sent as a UTF-8 encoded word.
    pub subject: Vec<u8>,
    /// HTML body.
    pub body: Vec<u8>,
}

impl Mail {
    /// Creates a mail from the given sender.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Vec<u8>>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Checks the preconditions and parses every address.
    ///
    /// # Errors
    ///
    /// See [`Envelope::new`].
    pub fn envelope(&self) -> Result<Envelope> {
        Envelope::new(&self.from, &self.to, &self.cc, &self.bcc)
    }

    /// Renders the message for `envelope`.
    ///
    /// # Errors
    ///
    /// Returns an error if a header cannot be rendered.
    pub fn render(&self, envelope: &Envelope) -> Result<Message> {
        MessageBuilder::new(envelope.from.clone())
            .to(envelope.to.iter().cloned())
            .cc(envelope.cc.iter().cloned())
            .bcc(envelope.bcc.iter().cloned())
            .subject(self.subject.as_slice())
            .html_body(self.body.as_slice())
            .build()
            .map_err(Into::into)
    }
}

/// Sender and recipients of one SMTP transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: Mailbox,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
}

impl Envelope {
    /// Builds an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFrom`] if `from` is blank, [`Error::NoTo`] if `to`
    /// is empty, or [`Error::Address`] for the first address (from, then to,
    /// cc and bcc) that does not parse.
    pub fn new<S: AsRef<str>>(from: &str, to: &[S], cc: &[S], bcc: &[S]) -> Result<Self> {
        if from.trim().is_empty() {
            return Err(Error::NoFrom);
        }
        if to.is_empty() {
            return Err(Error::NoTo);
        }

        Ok(Self {
            from: Mailbox::parse(from)?,
            to: parse_all(to)?,
            cc: parse_all(cc)?,
            bcc: parse_all(bcc)?,
        })
    }

    /// The sender.
    #[must_use]
    pub const fn from(&self) -> &Mailbox {
        &self.from
    }

    /// Every recipient in delivery order: to, then cc, then bcc.
    #[must_use]
    pub fn recipients(&self) -> Vec<&Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc).collect()
    }
}

fn parse_all<S: AsRef<str>>(addresses: &[S]) -> Result<Vec<Mailbox>> {
    addresses
        .iter()
        .map(|a| Mailbox::parse(a.as_ref()).map_err(Error::from))
        .collect()
}
