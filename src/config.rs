//! Mail transport configuration.
//!
//! Settings live under the `smtp.` prefix of the host application's
//! configuration and are read through [`figment`], so a host can hand over
//! the `Figment` it already builds or let [`MailConfig::load`] assemble one
//! from a TOML file and the environment.
//!
//! ```toml
//! apachecommonsmailerplugin = "enabled"
//!
//! [smtp]
//! host = "smtp.example.com"
//! port = 587
//! tls = true
//! user = "mailer"
//! password = "secret"
//! timeout = 10000
//! connectiontimeout = 5000
//! ```
//!
//! | Key | Default | Env var |
//! |-----|---------|---------|
//! | `smtp.mock` | `false` | `SMTP_MOCK` |
//! | `smtp.host` | required unless mock | `SMTP_HOST` |
//! | `smtp.port` | `25` | `SMTP_PORT` |
//! | `smtp.ssl` | `false` | `SMTP_SSL` |
//! | `smtp.tls` | `false` | `SMTP_TLS` |
//! | `smtp.user` | none | `SMTP_USER` |
//! | `smtp.password` | none | `SMTP_PASSWORD` |
//! | `smtp.debug` | `false` | `SMTP_DEBUG` |
//! | `smtp.timeout` | none (ms) | `SMTP_TIMEOUT` |
//! | `smtp.connectiontimeout` | none (ms) | `SMTP_CONNECTIONTIMEOUT` |
//! | `apachecommonsmailerplugin` | none; `"disabled"` turns the provider off | `APACHECOMMONSMAILERPLUGIN` |

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::MailError;

/// Default SMTP port when `smtp.port` is not set.
pub const DEFAULT_PORT: u16 = 25;

/// Key of the flag that switches the provider off.
pub const DISABLE_KEY: &str = "apachecommonsmailerplugin";

/// Value of [`DISABLE_KEY`] that disables the provider.
pub const DISABLED_SENTINEL: &str = "disabled";

/// Resolved mail transport settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP server host. Required unless `mock` is set.
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS from the first byte (SMTPS).
    pub use_ssl: bool,
    /// Upgrade with STARTTLS.
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Log transport settings and server responses.
    pub debug: bool,
    /// Socket read timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Use the no-network mock transport.
    pub mock: bool,
    /// False when the disable flag carries its sentinel value.
    pub enabled: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            use_ssl: false,
            use_tls: false,
            username: None,
            password: None,
            debug: false,
            timeout_ms: None,
            connect_timeout_ms: None,
            mock: false,
            enabled: true,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_tls", &self.use_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("timeout_ms", &self.timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("mock", &self.mock)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl MailConfig {
    /// Settings for a real SMTP server, everything else at defaults.
    pub fn smtp(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    /// Settings for the mock transport.
    pub fn mock() -> Self {
        Self {
            mock: true,
            ..Self::default()
        }
    }

    /// Assemble the host configuration from a TOML file and the environment,
    /// then read the mail settings from it.
    ///
    /// A missing file is not an error. `SMTP_*` variables override the file
    /// (`SMTP_HOST` becomes `smtp.host`), as does `APACHECOMMONSMAILERPLUGIN`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MailError> {
        Self::from_figment(&Self::figment(path))
    }

    /// The figment used by [`MailConfig::load`].
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SMTP_").map(|key| format!("smtp.{}", key).into()))
            .merge(Env::raw().only(&[DISABLE_KEY]))
    }

    /// Read the mail settings out of an existing host configuration.
    ///
    /// Missing keys fall back to their defaults. A key that is present but
    /// malformed (`smtp.port = "abc"`) is a configuration error. The host
    /// requirement is checked by [`MailConfig::validate`], not here, so a
    /// disabled provider may leave it unset.
    pub fn from_figment(figment: &Figment) -> Result<Self, MailError> {
        let defaults = Self::default();

        let disable_flag: Option<String> = optional(figment, DISABLE_KEY)?;
        let enabled = disable_flag.as_deref() != Some(DISABLED_SENTINEL);

        let config = Self {
            mock: optional(figment, "smtp.mock")?.unwrap_or(defaults.mock),
            host: optional(figment, "smtp.host")?,
            port: optional(figment, "smtp.port")?.unwrap_or(defaults.port),
            use_ssl: optional(figment, "smtp.ssl")?.unwrap_or(defaults.use_ssl),
            use_tls: optional(figment, "smtp.tls")?.unwrap_or(defaults.use_tls),
            username: optional(figment, "smtp.user")?,
            password: optional(figment, "smtp.password")?,
            debug: optional(figment, "smtp.debug")?.unwrap_or(defaults.debug),
            timeout_ms: optional(figment, "smtp.timeout")?,
            connect_timeout_ms: optional(figment, "smtp.connectiontimeout")?,
            enabled,
        };

        tracing::debug!(config = ?config, "Loaded mail configuration");
        Ok(config)
    }

    /// Check the settings needed to build a transport.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.mock {
            return Ok(());
        }
        match self.host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(MailError::config(
                "smtp.host needs to be set in the application configuration \
                 (or set smtp.mock to true)",
            )),
        }
    }

    /// The single socket timeout handed to the transport.
    ///
    /// The transport has one timeout covering connect and I/O, so the
    /// tighter of the two configured values wins.
    pub fn effective_timeout(&self) -> Option<Duration> {
        let ms = match (self.timeout_ms, self.connect_timeout_ms) {
            (Some(read), Some(connect)) => Some(read.min(connect)),
            (read, connect) => read.or(connect),
        };
        ms.map(Duration::from_millis)
    }
}

/// Extract an optional key: absent is `None`, malformed is an error.
fn optional<T: DeserializeOwned>(figment: &Figment, key: &str) -> Result<Option<T>, MailError> {
    match figment.extract_inner::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.missing() => Ok(None),
        Err(err) => Err(MailError::Configuration(format!(
            "invalid value for `{}`: {}",
            key, err
        ))),
    }
}
