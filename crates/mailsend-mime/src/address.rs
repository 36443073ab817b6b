//! Mailbox parsing (RFC 5322 §3.4).

use crate::encoding::{decode_rfc2047, encode_rfc2047};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A mailbox: an addr-spec with an optional display name.
///
/// # Example
///
/// ```
/// use mailsend_mime::Mailbox;
///
/// let mailbox = Mailbox::parse("Alice Example <alice@example.com>").unwrap();
/// assert_eq!(mailbox.name(), Some("Alice Example"));
/// assert_eq!(mailbox.address(), "alice@example.com");
/// assert_eq!(mailbox.to_string(), "Alice Example <alice@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox {
    name: Option<String>,
    address: String,
}

impl Mailbox {
    /// Creates a mailbox from a bare addr-spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `address` is not a valid addr-spec.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        validate_addr_spec(&address)?;
        Ok(Self {
            name: None,
            address,
        })
    }

    /// Creates a mailbox with a display name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `address` is not a valid addr-spec
    /// or the name contains a line break.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.contains(['\r', '\n']) {
            return Err(Error::invalid_address(&name, "display name contains a line break"));
        }
        let mut mailbox = Self::new(address)?;
        mailbox.name = Some(name).filter(|n| !n.trim().is_empty());
        Ok(mailbox)
    }

    /// Parses mailbox text such as `alice@example.com`,
    /// `<alice@example.com>`, `Alice <alice@example.com>` or
    /// `"Example, Alice" <alice@example.com>`.
    ///
    /// Encoded-word display names are decoded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the text is not a single mailbox.
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains(['\r', '\n', '\0']) {
            return Err(Error::invalid_address(input, "contains a line break"));
        }

        let text = input.trim();
        if text.is_empty() {
            return Err(Error::invalid_address(input, "empty"));
        }

        let Some(open) = find_unquoted(text, b'<') else {
            if text.contains(['<', '>']) {
                return Err(Error::invalid_address(input, "unbalanced angle brackets"));
            }
            validate_addr_spec(text).map_err(|e| rebind(e, input))?;
            return Ok(Self {
                name: None,
                address: text.to_string(),
            });
        };

        let rest = &text[open + 1..];
        let close = rest
            .find('>')
            .ok_or_else(|| Error::invalid_address(input, "unbalanced angle brackets"))?;
        if !rest[close + 1..].trim().is_empty() {
            return Err(Error::invalid_address(input, "trailing text after address"));
        }

        let address = &rest[..close];
        if address.contains('<') {
            return Err(Error::invalid_address(input, "unbalanced angle brackets"));
        }
        validate_addr_spec(address).map_err(|e| rebind(e, input))?;

        let name = parse_display_name(text[..open].trim()).map_err(|e| rebind(e, input))?;

        Ok(Self {
            name,
            address: address.to_string(),
        })
    }

    /// Display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The bare `local@domain` address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl FromStr for Mailbox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(name) = &self.name else {
            return f.write_str(&self.address);
        };

        if !name.is_ascii() {
            write!(f, "{} ", encode_rfc2047(name))?;
        } else if !name.contains("=?") && name.chars().all(|c| is_atext(c) || c == ' ') {
            write!(f, "{name} ")?;
        } else {
            f.write_str("\"")?;
            for c in name.chars() {
                if c == '"' || c == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{c}")?;
            }
            f.write_str("\" ")?;
        }
        write!(f, "<{}>", self.address)
    }
}

/// RFC 5322 atext, extended with non-ASCII per RFC 6532.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

fn is_dot_atom(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

/// Byte offset of the first `needle` outside a quoted string.
fn find_unquoted(text: &str, needle: u8) -> Option<usize> {
    let mut quoted = false;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        match b {
            _ if escaped => escaped = false,
            b'\\' if quoted => escaped = true,
            b'"' => quoted = !quoted,
            _ if b == needle && !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

/// Strips the surrounding quotes of a quoted-string and resolves escapes.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c if c.is_control() && c != '\t' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

fn parse_display_name(text: &str) -> Result<Option<String>> {
    if text.is_empty() {
        return Ok(None);
    }

    if text.starts_with('"') {
        let name = unquote(text)
            .ok_or_else(|| Error::invalid_address(text, "malformed quoted display name"))?;
        return Ok(Some(name).filter(|n| !n.is_empty()));
    }

    let mut name = String::with_capacity(text.len());
    let mut after_encoded = false;
    for word in text.split_whitespace() {
        let encoded = word.starts_with("=?") && word.ends_with("?=");
        if !encoded && !word.chars().all(|c| is_atext(c) || c == '.') {
            return Err(Error::invalid_address(text, "invalid character in display name"));
        }
        // Whitespace between adjacent encoded words is not part of the name.
        if !name.is_empty() && !(encoded && after_encoded) {
            name.push(' ');
        }
        if encoded {
            let decoded = decode_rfc2047(word)
                .map_err(|_| Error::invalid_address(text, "malformed encoded-word display name"))?;
            name.push_str(&decoded);
        } else {
            name.push_str(word);
        }
        after_encoded = encoded;
    }
    Ok(Some(name))
}

fn validate_addr_spec(address: &str) -> Result<()> {
    let (local, domain) = match find_unquoted(address, b'@') {
        Some(at) => {
            let (local, domain) = (&address[..at], &address[at + 1..]);
            if find_unquoted(domain, b'@').is_some() {
                return Err(Error::invalid_address(address, "more than one '@'"));
            }
            (local, domain)
        }
        None => return Err(Error::invalid_address(address, "missing '@'")),
    };

    if local.is_empty() {
        return Err(Error::invalid_address(address, "empty local part"));
    }
    if domain.is_empty() {
        return Err(Error::invalid_address(address, "empty domain"));
    }

    let local_ok = if local.starts_with('"') {
        unquote(local).is_some()
    } else {
        is_dot_atom(local)
    };
    if !local_ok {
        return Err(Error::invalid_address(address, "invalid local part"));
    }

    let domain_ok = match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => literal
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '[' | ']' | '\\')),
        None => is_dot_atom(domain),
    };
    if !domain_ok {
        return Err(Error::invalid_address(address, "invalid domain"));
    }

    Ok(())
}

/// Reports an inner parse error against the full input.
fn rebind(err: Error, input: &str) -> Error {
    match err {
        Error::InvalidAddress { reason, .. } => Error::invalid_address(input, reason),
        other => other,
    }
}
