//! SMTP commands sent by the client.

use crate::types::{Address, AuthMechanism};
use std::fmt;

/// A command line of the submission dialogue.
///
/// [`fmt::Display`] renders the line without its CRLF terminator;
/// [`Command::serialize`] adds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `EHLO <hostname>`
    Ehlo {
        /// Name the client announces.
        hostname: String,
    },
    /// `STARTTLS`
    StartTls,
    /// `AUTH <mechanism> [initial-response]`
    Auth {
        /// SASL mechanism.
        mechanism: AuthMechanism,
        /// Base64 initial response (RFC 4954 §4).
        initial_response: Option<String>,
    },
    /// `MAIL FROM:<reverse-path> [SIZE=n]`
    MailFrom {
        /// Reverse path.
        from: Address,
        /// Declared message size (RFC 1870).
        size: Option<usize>,
    },
    /// `RCPT TO:<forward-path>`
    RcptTo {
        /// Forward path.
        to: Address,
    },
    /// `DATA`
    Data,
    /// `QUIT`
    Quit,
}

impl Command {
    /// Returns the command verb. Unlike the full line it never carries
    /// credentials, so it is what gets logged.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Ehlo { .. } => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Quit => "QUIT",
        }
    }

    /// The wire form of the command, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                write!(f, "AUTH {}", mechanism.as_str())?;
                match initial_response {
                    Some(response) => write!(f, " {response}"),
                    None => Ok(()),
                }
            }
            Self::MailFrom { from, size } => {
                write!(f, "MAIL FROM:<{from}>")?;
                match size {
                    Some(size) => write!(f, " SIZE={size}"),
                    None => Ok(()),
                }
            }
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::StartTls | Self::Data | Self::Quit => f.write_str(self.verb()),
        }
    }
}
