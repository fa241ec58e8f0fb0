//! Error types for courier.

#[cfg(feature = "smtp")]
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while configuring the provider or sending email.
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// No provider has been installed with [`init`](crate::init).
    #[error("Email provider not configured")]
    NotConfigured,

    /// The provider is switched off by the host configuration.
    #[error("Email provider is disabled")]
    Disabled,

    /// Configuration error (missing host, malformed value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing required field (e.g., from address).
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid email address format.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Attachment file not found.
    #[error("Attachment file not found: {0}")]
    AttachmentFileNotFound(String),

    /// Failed to read attachment file.
    #[error("Failed to read attachment: {0}")]
    AttachmentReadError(String),

    /// Error building the email message.
    #[error("Build error: {0}")]
    BuildError(String),

    /// Send failure from a transport without its own error type (the mock).
    #[error("Send error: {0}")]
    SendError(String),

    /// The SMTP client's own error, kept intact as the source.
    #[cfg(feature = "smtp")]
    #[error("Transport error: {0}")]
    Transport(#[source] Arc<lettre::transport::smtp::Error>),
}

impl MailError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error should abort startup.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The SMTP client error behind a failed send, for checks like
    /// `is_permanent()` or `status()`.
    #[cfg(feature = "smtp")]
    pub fn transport_error(&self) -> Option<&lettre::transport::smtp::Error> {
        match self {
            Self::Transport(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<figment::Error> for MailError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::BuildError(err.to_string())
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Transport(Arc::new(err))
    }
}

#[cfg(feature = "smtp")]
impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}
