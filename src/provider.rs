//! The mailer provider: configuration in, one shared transport out.
//!
//! A [`MailerProvider`] starts out without a transport and builds it the
//! first time [`MailerProvider::mailer`] (or [`MailerProvider::on_start`])
//! runs. From then on every caller gets the same `Arc<dyn Mailer>`; the
//! instance is never rebuilt.
//!
//! ```rust,ignore
//! use courier::{MailConfig, MailerProvider};
//!
//! let provider = MailerProvider::from_figment(&host_config)?;
//! if provider.is_enabled() {
//!     provider.on_start()?;
//! }
//!
//! let mailer = provider.mailer()?;
//! mailer.deliver(&email).await?;
//! ```

use figment::Figment;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::config::MailConfig;
use crate::error::MailError;
use crate::mailer::Mailer;
use crate::providers::MockMailer;

/// Constructor invoked once to build the transport.
pub type MailerFactory = dyn Fn(&MailConfig) -> Result<Arc<dyn Mailer>, MailError> + Send + Sync;

/// Holds the mail configuration and the lazily built transport.
pub struct MailerProvider {
    config: MailConfig,
    factory: Box<MailerFactory>,
    instance: RwLock<Option<Arc<dyn Mailer>>>,
}

impl fmt::Debug for MailerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerProvider")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl MailerProvider {
    /// Create a provider using the built-in SMTP/mock selection.
    ///
    /// An enabled provider without `smtp.host` (and not in mock mode) is
    /// rejected here, before anything tries to send.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        Self::with_factory(config, build_mailer)
    }

    /// Read the configuration from the host's figment and create a provider.
    pub fn from_figment(figment: &Figment) -> Result<Self, MailError> {
        Self::new(MailConfig::from_figment(figment)?)
    }

    /// Create a provider with a custom transport constructor.
    pub fn with_factory<F>(config: MailConfig, factory: F) -> Result<Self, MailError>
    where
        F: Fn(&MailConfig) -> Result<Arc<dyn Mailer>, MailError> + Send + Sync + 'static,
    {
        if config.enabled {
            config.validate()?;
        }

        Ok(Self {
            config,
            factory: Box::new(factory),
            instance: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &MailConfig {
        &self.config
    }

    /// False when the host configuration carries the disable flag.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether the transport has been built.
    pub fn is_ready(&self) -> bool {
        self.instance.read().is_some()
    }

    /// Startup hook: build the transport now so errors stop the host early.
    ///
    /// Does nothing for a disabled provider.
    pub fn on_start(&self) -> Result<(), MailError> {
        if !self.is_enabled() {
            tracing::info!("Mailer provider disabled by configuration; skipping startup");
            return Ok(());
        }
        self.mailer().map(|_| ())
    }

    /// Get the shared transport, building it on first use.
    ///
    /// Concurrent first callers build it exactly once. A failed build leaves
    /// the provider uninitialized and the error is returned to the caller.
    pub fn mailer(&self) -> Result<Arc<dyn Mailer>, MailError> {
        if !self.is_enabled() {
            return Err(MailError::Disabled);
        }

        // Fast path: already built
        if let Some(mailer) = self.instance.read().as_ref() {
            return Ok(Arc::clone(mailer));
        }

        let mut slot = self.instance.write();

        // Another caller may have built it while we waited for the lock
        if let Some(mailer) = slot.as_ref() {
            return Ok(Arc::clone(mailer));
        }

        let mailer = (self.factory)(&self.config).inspect_err(|err| {
            tracing::error!(error = %err, "Failed to build mailer");
        })?;

        tracing::info!(
            provider = mailer.provider_name(),
            host = ?self.config.host,
            port = self.config.port,
            "Mailer initialized"
        );

        *slot = Some(Arc::clone(&mailer));
        Ok(mailer)
    }
}

/// Default factory: the mock in mock mode, SMTP otherwise.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if config.mock {
        return Ok(Arc::new(MockMailer::new()));
    }
    smtp_mailer(config)
}

#[cfg(feature = "smtp")]
fn smtp_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    Ok(Arc::new(crate::providers::SmtpMailer::from_config(config)?))
}

#[cfg(not(feature = "smtp"))]
fn smtp_mailer(_config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    Err(MailError::config(
        "smtp.mock is false but the 'smtp' feature is not enabled. \
        Add `features = [\"smtp\"]` to Cargo.toml",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::Email;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn counting_factory(
        counter: Arc<AtomicUsize>,
    ) -> impl Fn(&MailConfig) -> Result<Arc<dyn Mailer>, MailError> + Send + Sync + 'static {
        move |_config| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockMailer::new()) as Arc<dyn Mailer>)
        }
    }

    #[test]
    fn test_missing_host_fails_at_construction() {
        let err = MailerProvider::new(MailConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("smtp.host"));
    }

    #[test]
    fn test_disabled_provider_skips_validation_and_startup() {
        let counter = Arc::new(AtomicUsize::new(0));
        let config = MailConfig {
            enabled: false,
            ..MailConfig::default()
        };
        let provider = MailerProvider::with_factory(config, counting_factory(counter.clone()))
            .expect("disabled provider needs no host");

        assert!(!provider.is_enabled());
        provider.on_start().unwrap();
        assert!(!provider.is_ready());
        assert!(matches!(provider.mailer(), Err(MailError::Disabled)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lazy_singleton() {
        let counter = Arc::new(AtomicUsize::new(0));
        let provider =
            MailerProvider::with_factory(MailConfig::mock(), counting_factory(counter.clone()))
                .unwrap();

        assert!(!provider.is_ready());
        let first = provider.mailer().unwrap();
        let second = provider.mailer().unwrap();

        assert!(provider.is_ready());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_start_builds_eagerly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let provider =
            MailerProvider::with_factory(MailConfig::mock(), counting_factory(counter.clone()))
                .unwrap();

        provider.on_start().unwrap();
        assert!(provider.is_ready());
        provider.mailer().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        const THREADS: usize = 16;

        let counter = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(
            MailerProvider::with_factory(MailConfig::mock(), counting_factory(counter.clone()))
                .unwrap(),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    provider.mailer().unwrap()
                })
            })
            .collect();

        let mailers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(mailers.iter().all(|m| Arc::ptr_eq(m, &mailers[0])));
    }

    #[test]
    fn test_failed_build_stays_uninitialized() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let provider = MailerProvider::with_factory(MailConfig::mock(), move |_config| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MailError::config("transient"))
            } else {
                Ok(Arc::new(MockMailer::new()) as Arc<dyn Mailer>)
            }
        })
        .unwrap();

        assert!(provider.on_start().is_err());
        assert!(!provider.is_ready());
        assert!(provider.mailer().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mock_mode_delivers_without_network() {
        let provider = MailerProvider::new(MailConfig::mock()).unwrap();
        let mailer = provider.mailer().unwrap();
        assert_eq!(mailer.provider_name(), "mock");

        let result = mailer
            .deliver(&Email::new().from("a@example.com").to("b@example.com"))
            .await
            .unwrap();
        assert!(!result.message_id.is_empty());
    }

    #[cfg(feature = "smtp")]
    #[test]
    fn test_smtp_mode_builds_smtp_transport() {
        let config = MailConfig {
            port: 2525,
            ..MailConfig::smtp("localhost")
        };
        let provider = MailerProvider::new(config).unwrap();
        let mailer = provider.mailer().unwrap();
        assert_eq!(mailer.provider_name(), "smtp");
        assert!(Arc::ptr_eq(&mailer, &provider.mailer().unwrap()));
    }
}
