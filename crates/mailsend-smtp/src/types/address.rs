//! Envelope address type.

use crate::error::{Error, Result};

/// Bare `local@domain` path used in `MAIL FROM` and `RCPT TO`.
///
/// Display names belong in message headers, never in the envelope, so this
/// type only accepts the address itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        // Anything here ends up verbatim on a command line.
        if let Some(c) = addr
            .chars()
            .find(|c| c.is_control() || matches!(c, '<' | '>'))
        {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden character {c:?}: {addr}"
            )));
        }

        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress(format!("Address must contain @: {addr}")));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "Local and domain parts cannot be empty: {addr}"
            )));
        }

        // '@' and spaces are only legal inside a quoted local part.
        let quoted = local.len() >= 2 && local.starts_with('"') && local.ends_with('"');
        if !quoted && (local.contains('@') || local.contains(char::is_whitespace)) {
            return Err(Error::InvalidAddress(format!(
                "Unquoted local part must not contain '@' or spaces: {addr}"
            )));
        }
        if domain.contains(char::is_whitespace) {
            return Err(Error::InvalidAddress(format!(
                "Domain must not contain spaces: {addr}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
