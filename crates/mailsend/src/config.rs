//! Mailer configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Port used when a builder is given none (SMTP relay).
pub const DEFAULT_PORT: u16 = 25;

/// Name announced in EHLO unless configured otherwise.
pub const DEFAULT_HELLO_NAME: &str = "localhost";

/// SMTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server hostname or IP literal (without brackets).
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Name announced in EHLO.
    pub hello_name: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Deadline for each server reply.
    pub io_timeout: Duration,
    /// Login name for AUTH; the sender address when unset.
    pub username: Option<String>,
}

impl Config {
    /// Creates a configuration for `host:port` with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ConfigBuilder::new(host).port(port).build()
    }

    /// Parses a `host:port` server address.
    ///
    /// IPv6 literals must be bracketed: `[::1]:25`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddr`] if the address has no port, an empty
    /// host, a non-numeric port, or an unbracketed IPv6 literal.
    pub fn from_addr(addr: &str) -> Result<Self> {
        let (host, port) = split_host_port(addr)?;
        Ok(Self::new(host, port))
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: u16,
    hello_name: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    username: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            hello_name: DEFAULT_HELLO_NAME.to_string(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            username: None,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.hello_name = name.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-reply timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Logs in as `username` instead of the sender address.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port,
            hello_name: self.hello_name,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            username: self.username,
        }
    }
}

fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| Error::invalid_addr(addr, "missing ']'"))?;
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| Error::invalid_addr(addr, "missing port"))?;
        (host, port)
    } else {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_addr(addr, "missing port"))?;
        if host.contains(':') {
            return Err(Error::invalid_addr(addr, "too many colons"));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(Error::invalid_addr(addr, "missing host"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| Error::invalid_addr(addr, "invalid port"))?;

    Ok((host, port))
}
