//! Error types for sending mail.

use std::fmt;

/// Result type alias for send operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Step of the SMTP session that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Connecting, reading the greeting and the first EHLO.
    Dial,
    /// STARTTLS and the TLS handshake.
    StartTls,
    /// AUTH PLAIN.
    Auth,
    /// MAIL FROM.
    Mail,
    /// RCPT TO, for any recipient.
    Rcpt,
    /// DATA and the message transfer.
    Data,
    /// QUIT.
    Quit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dial => "dial",
            Self::StartTls => "starttls",
            Self::Auth => "auth",
            Self::Mail => "mail",
            Self::Rcpt => "rcpt",
            Self::Data => "data",
            Self::Quit => "quit",
        })
    }
}

/// Errors returned by [`send`](crate::send) and
/// [`send_skip_cert_verify`](crate::send_skip_cert_verify).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The sender address is empty.
    #[error("from field is empty")]
    NoFrom,

    /// No `To` recipient was given.
    #[error("to field is empty")]
    NoTo,

    /// The server address is not `host:port`.
    #[error("Invalid server address {addr:?}: {reason}")]
    InvalidAddr {
        /// The rejected address.
        addr: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A mailbox did not parse.
    #[error(transparent)]
    Address(#[from] mailsend_mime::Error),

    /// A mailbox parsed but cannot be used as an SMTP path.
    #[error(transparent)]
    Smtp(mailsend_smtp::Error),

    /// Credentials would have gone over an unencrypted connection to a
    /// remote host.
    #[error("Refusing to send credentials to {host} over an unencrypted connection")]
    InsecureAuth {
        /// The server host.
        host: String,
    },

    /// A step of the SMTP session failed.
    #[error("SMTP {stage} failed: {source}")]
    Session {
        /// The failed step.
        stage: Stage,
        /// What went wrong.
        #[source]
        source: mailsend_smtp::Error,
    },
}

impl Error {
    pub(crate) fn invalid_addr(addr: &str, reason: &'static str) -> Self {
        Self::InvalidAddr {
            addr: addr.to_string(),
            reason,
        }
    }

    /// Returns true if the error was raised before any network I/O.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoFrom | Self::NoTo | Self::InvalidAddr { .. } | Self::Address(_) | Self::Smtp(_)
        )
    }

    /// Returns the session step that failed, if any.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Session { stage, .. } => Some(*stage),
            Self::InsecureAuth { .. } => Some(Stage::Auth),
            _ => None,
        }
    }

    /// Returns the server reply code behind the error, if any.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Session { source, .. } => source.code(),
            _ => None,
        }
    }
}

/// Wraps a client error with the step it happened in.
pub(crate) fn at(stage: Stage) -> impl FnOnce(mailsend_smtp::Error) -> Error {
    move |source| Error::Session { stage, source }
}
