//! # Courier
//!
//! Configuration-driven mailer provider for web applications. Courier reads
//! the `smtp.*` settings from the host's configuration, builds one shared
//! transport (real SMTP via lettre, or an in-memory mock), and hands it to
//! the rest of the application.
//!
//! ## Quick Start
//!
//! ```toml
//! # config.toml
//! [smtp]
//! host = "smtp.example.com"
//! port = 587
//! tls = true
//! user = "mailer"
//! password = "secret"
//! ```
//!
//! Wire it into startup, then send from anywhere:
//!
//! ```rust,ignore
//! use courier::{Email, MailConfig};
//!
//! // At startup: fails fast on a missing smtp.host
//! courier::init(&MailConfig::figment("config.toml"))?;
//!
//! let email = Email::new()
//!     .from("noreply@example.com")
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .text_body("Hello");
//!
//! courier::deliver(&email).await?;
//! ```
//!
//! Hosts that prefer passing state around skip the process-wide entry points
//! and keep a [`MailerProvider`] in their own application state.
//!
//! ## Tests
//!
//! Set `smtp.mock = true` (or `SMTP_MOCK=true`) and sends are recorded by
//! [`providers::MockMailer`] instead of leaving the process.
//!
//! ## Feature Flags
//!
//! - `smtp` (default) - SMTP transport via lettre
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//!
//! ## Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `courier_emails_total` | Counter | provider, status | Total emails sent |
//! | `courier_delivery_duration_seconds` | Histogram | provider | Delivery duration |

/// The version of the courier crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod config;
mod email;
mod error;
mod mailer;
mod provider;

pub mod providers;

use figment::Figment;
use std::sync::{Arc, OnceLock};
use tracing::Instrument;

#[cfg(feature = "metrics")]
use std::time::Instant;

// Re-exports
pub use address::{Address, ToAddress};
pub use attachment::{Attachment, AttachmentType};
pub use config::{MailConfig, DEFAULT_PORT, DISABLED_SENTINEL, DISABLE_KEY};
pub use email::Email;
pub use error::MailError;
pub use mailer::{DeliveryResult, Mailer, MailerExt};
pub use provider::{build_mailer, MailerFactory, MailerProvider};

/// Process-wide provider, installed once at startup.
static PROVIDER: OnceLock<MailerProvider> = OnceLock::new();

/// Build a provider from the host configuration and install it.
///
/// Runs the startup hook, so a missing `smtp.host` or unusable TLS settings
/// come back as [`MailError::Configuration`] here rather than on the first
/// send. A disabled provider is installed but never builds a transport.
pub fn init(figment: &Figment) -> Result<&'static MailerProvider, MailError> {
    install(MailerProvider::from_figment(figment)?)
}

/// Install an already-built provider as the process-wide one.
///
/// The startup hook runs first and the provider is only stored if it
/// succeeds, so a failed install can be retried. Only the first successful
/// call installs; later calls fail with a configuration error and leave the
/// installed provider untouched.
pub fn install(provider: MailerProvider) -> Result<&'static MailerProvider, MailError> {
    if PROVIDER.get().is_some() {
        return Err(MailError::config("mailer provider is already initialized"));
    }

    provider.on_start()?;
    PROVIDER
        .set(provider)
        .map_err(|_| MailError::config("mailer provider is already initialized"))?;

    PROVIDER.get().ok_or(MailError::NotConfigured)
}

/// The installed provider, if [`init`] or [`install`] has run.
pub fn provider() -> Option<&'static MailerProvider> {
    PROVIDER.get()
}

/// The shared transport of the installed provider.
pub fn mailer() -> Result<Arc<dyn Mailer>, MailError> {
    PROVIDER.get().ok_or(MailError::NotConfigured)?.mailer()
}

/// Check if a provider is installed and enabled.
pub fn is_configured() -> bool {
    PROVIDER.get().is_some_and(MailerProvider::is_enabled)
}

/// Deliver an email through the installed provider.
///
/// Transport errors are returned unchanged; nothing is retried.
///
/// ```rust,ignore
/// use courier::{Email, deliver};
///
/// let email = Email::new()
///     .from("noreply@example.com")
///     .to("user@example.com")
///     .subject("Hello!")
///     .text_body("Hi there");
///
/// deliver(&email).await?;
/// ```
pub async fn deliver(email: &Email) -> Result<DeliveryResult, MailError> {
    let mailer = mailer()?;
    deliver_with(email, mailer.as_ref()).await
}

/// Deliver an email through a specific mailer, with the same tracing and
/// metrics as [`deliver`].
pub async fn deliver_with<M: Mailer + ?Sized>(
    email: &Email,
    mailer: &M,
) -> Result<DeliveryResult, MailError> {
    let provider = mailer.provider_name();

    let span = tracing::info_span!(
        "courier.deliver",
        provider = provider,
        to = ?email.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
        subject = %email.subject,
    );

    async move {
        tracing::debug!("Delivering email");

        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = mailer.deliver(email).await;

        #[cfg(feature = "metrics")]
        {
            let duration = start.elapsed().as_secs_f64();
            let status = if result.is_ok() { "success" } else { "error" };
            metrics::counter!("courier_emails_total", "provider" => provider, "status" => status)
                .increment(1);
            metrics::histogram!("courier_delivery_duration_seconds", "provider" => provider)
                .record(duration);
        }

        match &result {
            Ok(r) => tracing::info!(message_id = %r.message_id, "Email delivered"),
            Err(e) => tracing::error!(error = %e, "Email delivery failed"),
        }

        result
    }
    .instrument(span)
    .await
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Address;
    pub use crate::Attachment;
    pub use crate::DeliveryResult;
    pub use crate::Email;
    pub use crate::MailConfig;
    pub use crate::MailError;
    pub use crate::Mailer;
    pub use crate::MailerProvider;
    pub use crate::{deliver, deliver_with, is_configured};
}
