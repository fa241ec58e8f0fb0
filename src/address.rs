//! Mailbox addresses.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MailError;

/// An email address with an optional display name.
///
/// ```
/// use courier::Address;
///
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.to_string(), "Alice <alice@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name
    pub name: Option<String>,
    /// Email address
    pub email: String,
}

impl Address {
    /// Create an address without a display name.
    ///
    /// No validation happens here; the transport rejects bad addresses at
    /// send time. Use [`Address::parse`] to validate up front.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create an address with a display name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
            email: email.into(),
        }
    }

    /// Parse and validate an address (RFC 5321/5322).
    ///
    /// ```
    /// use courier::Address;
    ///
    /// assert!(Address::parse("user@example.com").is_ok());
    /// assert!(Address::parse("not-an-email").is_err());
    /// ```
    pub fn parse(email: &str) -> Result<Self, MailError> {
        if !EmailAddress::is_valid(email) {
            return Err(MailError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        Ok(Self::new(email))
    }

    /// The address with its domain converted to ASCII (Punycode).
    ///
    /// SMTP servers without SMTPUTF8 need this for international domains.
    ///
    /// ```
    /// use courier::Address;
    ///
    /// let addr = Address::new("user@例え.jp");
    /// assert_eq!(addr.to_ascii().unwrap(), "user@xn--r8jz45g.jp");
    /// ```
    pub fn to_ascii(&self) -> Result<String, MailError> {
        let (local, domain) = self.email.split_once('@').ok_or_else(|| {
            MailError::InvalidAddress(format!("'{}' is missing @ symbol", self.email))
        })?;

        let domain = idna::domain_to_ascii(domain).map_err(|e| {
            MailError::InvalidAddress(format!("cannot convert domain '{}': {:?}", domain, e))
        })?;

        Ok(format!("{}@{}", local, domain))
    }

    /// Format as "Name <email>" or just "email" if no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}

/// Types usable directly in the [`Email`](crate::Email) builder.
pub trait ToAddress {
    fn to_address(&self) -> Address;
}

impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Address {
        (*self).to_address()
    }
}

impl ToAddress for Address {
    fn to_address(&self) -> Address {
        self.clone()
    }
}

impl ToAddress for str {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Address {
        Address::new(self.as_str())
    }
}

impl<N: AsRef<str>, E: AsRef<str>> ToAddress for (N, E) {
    fn to_address(&self) -> Address {
        Address::with_name(self.0.as_ref(), self.1.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted() {
        assert_eq!(Address::new("a@example.com").formatted(), "a@example.com");
        assert_eq!(
            Address::with_name("Alice", "alice@example.com").formatted(),
            "Alice <alice@example.com>"
        );
    }

    #[test]
    fn test_empty_name_is_dropped() {
        let addr = Address::with_name("", "a@example.com");
        assert_eq!(addr.name, None);
    }

    #[test]
    fn test_parse() {
        assert!(Address::parse("").is_err());
        let addr = Address::parse("bob@example.com").unwrap();
        assert_eq!(addr.email, "bob@example.com");
    }

    #[test]
    fn test_to_ascii_rejects_missing_at() {
        assert!(Address::new("nobody").to_ascii().is_err());
        assert_eq!(
            Address::new("a@example.com").to_ascii().unwrap(),
            "a@example.com"
        );
    }
}
