//! Mock transport for tests and development.
//!
//! Nothing leaves the process: each message is recorded in memory, logged
//! through `tracing`, and answered with a synthetic message id.
//!
//! ```rust,ignore
//! use courier::providers::MockMailer;
//!
//! let mailer = MockMailer::new();
//! send_welcome_email(&mailer, "user@example.com").await;
//!
//! assert!(mailer.sent_to("user@example.com"));
//! assert!(mailer.sent_with_subject("Welcome"));
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer};

/// A message captured by [`MockMailer`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Synthetic message id returned to the caller.
    pub id: String,
    pub email: Email,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Outbox {
    sent: RwLock<Vec<SentEmail>>,
    fail_with: RwLock<Option<String>>,
}

/// Mailer that records messages instead of sending them.
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct MockMailer {
    outbox: Arc<Outbox>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail with `message`.
    ///
    /// ```rust,ignore
    /// mailer.set_failure("SMTP connection refused");
    /// assert!(mailer.deliver(&email).await.is_err());
    /// ```
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.outbox.fail_with.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.outbox.fail_with.write() = None;
    }

    /// All captured emails, oldest first.
    pub fn emails(&self) -> Vec<SentEmail> {
        self.outbox.sent.read().clone()
    }

    pub fn last_email(&self) -> Option<SentEmail> {
        self.outbox.sent.read().last().cloned()
    }

    pub fn email_count(&self) -> usize {
        self.outbox.sent.read().len()
    }

    pub fn has_emails(&self) -> bool {
        self.email_count() > 0
    }

    pub fn clear(&self) {
        self.outbox.sent.write().clear();
    }

    /// Remove and return all captured emails.
    pub fn flush(&self) -> Vec<SentEmail> {
        std::mem::take(&mut *self.outbox.sent.write())
    }

    /// Check if an email was sent to a specific address (case-insensitive).
    pub fn sent_to(&self, address: &str) -> bool {
        self.outbox.sent.read().iter().any(|sent| {
            sent.email
                .all_recipients()
                .iter()
                .any(|addr| addr.email.eq_ignore_ascii_case(address))
        })
    }

    pub fn sent_with_subject(&self, subject: &str) -> bool {
        self.outbox
            .sent
            .read()
            .iter()
            .any(|sent| sent.email.subject == subject)
    }

    /// Find emails matching a predicate.
    pub fn find_emails<F>(&self, predicate: F) -> Vec<SentEmail>
    where
        F: Fn(&Email) -> bool,
    {
        self.outbox
            .sent
            .read()
            .iter()
            .filter(|sent| predicate(&sent.email))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        if let Some(message) = self.outbox.fail_with.read().clone() {
            return Err(MailError::SendError(message));
        }

        let id = format!("<{}@mock>", uuid::Uuid::new_v4());

        tracing::info!(
            message_id = %id,
            from = ?email.from.as_ref().map(|a| a.formatted()),
            to = ?email.to.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
            cc = ?email.cc.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
            bcc = ?email.bcc.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Mock mailer captured email"
        );
        if let Some(text) = &email.text_body {
            tracing::debug!(message_id = %id, body = %text, "Text body");
        }
        if let Some(html) = &email.html_body {
            tracing::debug!(message_id = %id, body = %html, "HTML body");
        }

        self.outbox.sent.write().push(SentEmail {
            id: id.clone(),
            email: email.clone(),
            sent_at: Utc::now(),
        });

        Ok(DeliveryResult::new(id))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
