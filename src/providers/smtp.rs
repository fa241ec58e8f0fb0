//! SMTP transport using lettre.
//!
//! ```rust,ignore
//! use courier::providers::{SmtpMailer, TlsMode};
//!
//! let mailer = SmtpMailer::new("smtp.example.com", 587)
//!     .tls(TlsMode::StartTls)
//!     .credentials("username", "password")
//!     .build()?;
//! ```

use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentType, HeaderName, HeaderValue},
        Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::address::Address;
use crate::attachment::AttachmentType;
use crate::config::MailConfig;
use crate::email::Email;
use crate::error::MailError;
use crate::mailer::{DeliveryResult, Mailer, MailerExt};

/// SMTP email transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    debug: bool,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Start building a plaintext SMTP mailer for `host:port`.
    pub fn new(host: &str, port: u16) -> SmtpBuilder {
        SmtpBuilder {
            host: host.to_string(),
            port,
            credentials: None,
            tls: TlsMode::None,
            timeout: None,
            debug: false,
        }
    }

    /// Build a mailer from resolved configuration.
    ///
    /// `ssl` selects implicit TLS and takes precedence over `tls`
    /// (STARTTLS). Credentials are only sent when both user and password
    /// are configured.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        config.validate()?;
        let host = config
            .host
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| MailError::config("smtp.host is not set"))?;

        if config.use_ssl && config.use_tls {
            tracing::warn!(
                host = %host,
                "Both smtp.ssl and smtp.tls are set; using implicit TLS"
            );
        }

        let mut builder = Self::new(host, config.port)
            .tls(tls_mode(config.use_ssl, config.use_tls))
            .timeout(config.effective_timeout())
            .debug(config.debug);

        if let Some((username, password)) = auth_credentials(config) {
            builder = builder.credentials(username, password);
        } else if config.username.is_some() {
            tracing::warn!(host = %host, "smtp.user is set without smtp.password; not authenticating");
        }

        builder.build()
    }

    /// Build a lettre Message from our Email struct.
    fn build_message(&self, email: &Email, message_id: &str) -> Result<Message, MailError> {
        self.validate(email)?;
        let from = email
            .from
            .as_ref()
            .ok_or(MailError::MissingField("from"))?;

        let mut builder = Message::builder()
            .from(address_to_mailbox(from)?)
            .subject(email.subject.as_str())
            .message_id(Some(message_id.to_string()));

        for to in &email.to {
            builder = builder.to(address_to_mailbox(to)?);
        }
        for cc in &email.cc {
            builder = builder.cc(address_to_mailbox(cc)?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(address_to_mailbox(bcc)?);
        }
        if let Some(reply_to) = email.reply_to.first() {
            builder = builder.reply_to(address_to_mailbox(reply_to)?);
        }

        for (name, value) in &email.headers {
            let name = HeaderName::new_from_ascii(name.clone())
                .map_err(|_| MailError::BuildError(format!("invalid header name '{}'", name)))?;
            builder = builder.raw_header(HeaderValue::new(name, value.clone()));
        }

        let message = if email.attachments.is_empty() {
            match (&email.html_body, &email.text_body) {
                (Some(html), Some(text)) => builder
                    .multipart(MultiPart::alternative_plain_html(text.clone(), html.clone()))?,
                (Some(html), None) => builder.header(ContentType::TEXT_HTML).body(html.clone())?,
                (None, text) => builder
                    .header(ContentType::TEXT_PLAIN)
                    .body(text.clone().unwrap_or_default())?,
            }
        } else {
            let mut mixed = match (&email.html_body, &email.text_body) {
                (Some(html), Some(text)) => MultiPart::mixed()
                    .multipart(MultiPart::alternative_plain_html(text.clone(), html.clone())),
                (Some(html), None) => MultiPart::mixed().singlepart(SinglePart::html(html.clone())),
                (None, text) => MultiPart::mixed()
                    .singlepart(SinglePart::plain(text.clone().unwrap_or_default())),
            };

            for attachment in &email.attachments {
                let content_type: ContentType = attachment
                    .content_type
                    .parse()
                    .unwrap_or(ContentType::TEXT_PLAIN);

                let part = match attachment.disposition {
                    AttachmentType::Inline => {
                        let cid = attachment
                            .content_id
                            .clone()
                            .unwrap_or_else(|| attachment.filename.clone());
                        LettreAttachment::new_inline(cid)
                            .body(attachment.data.clone(), content_type)
                    }
                    AttachmentType::Attachment => LettreAttachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                };
                mixed = mixed.singlepart(part);
            }

            builder.multipart(mixed)?
        };

        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, email: &Email) -> Result<DeliveryResult, MailError> {
        let message_id = generate_message_id(email);
        let message = self.build_message(email, &message_id)?;

        let response = self.transport.send(message).await?;

        let lines: Vec<String> = response.message().map(str::to_string).collect();
        if self.debug {
            tracing::info!(
                message_id = %message_id,
                code = %response.code(),
                response = ?lines,
                "SMTP server accepted message"
            );
        }

        Ok(DeliveryResult::with_response(
            message_id,
            serde_json::json!({
                "code": response.code().to_string(),
                "message": lines,
            }),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

/// TLS mode for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plaintext connection
    None,
    /// STARTTLS - upgrade to TLS after connecting
    StartTls,
    /// Implicit TLS - connect with TLS from start (SMTPS)
    Tls,
}

/// `ssl` (implicit TLS) wins over `tls` (STARTTLS).
fn tls_mode(use_ssl: bool, use_tls: bool) -> TlsMode {
    match (use_ssl, use_tls) {
        (true, _) => TlsMode::Tls,
        (false, true) => TlsMode::StartTls,
        (false, false) => TlsMode::None,
    }
}

/// AUTH needs both a user and a password.
fn auth_credentials(config: &MailConfig) -> Option<(&str, &str)> {
    Some((config.username.as_deref()?, config.password.as_deref()?))
}

/// Builder for SmtpMailer.
pub struct SmtpBuilder {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    tls: TlsMode,
    timeout: Option<Duration>,
    debug: bool,
}

impl SmtpBuilder {
    /// Set SMTP credentials.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username.to_string(), password.to_string()));
        self
    }

    /// Set TLS mode.
    pub fn tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    /// Socket timeout for connect and I/O. `None` keeps lettre's default.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Log transport settings and server responses.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the SmtpMailer.
    ///
    /// Fails if TLS parameters cannot be derived from the host name.
    pub fn build(self) -> Result<SmtpMailer, MailError> {
        let relay = match self.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                .map_err(|e| {
                    MailError::config(format!("STARTTLS setup for '{}' failed: {}", self.host, e))
                })?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host).map_err(|e| {
                MailError::config(format!("TLS setup for '{}' failed: {}", self.host, e))
            })?,
        };

        let mut relay = relay.port(self.port);
        if let Some(timeout) = self.timeout {
            relay = relay.timeout(Some(timeout));
        }
        if let Some(credentials) = self.credentials {
            relay = relay.credentials(credentials);
        }

        if self.debug {
            tracing::info!(
                host = %self.host,
                port = self.port,
                tls = ?self.tls,
                timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
                "SMTP transport configured"
            );
        }

        Ok(SmtpMailer {
            transport: relay.build(),
            debug: self.debug,
        })
    }
}

/// Convert our Address to lettre's Mailbox, punycoding the domain.
fn address_to_mailbox(addr: &Address) -> Result<Mailbox, MailError> {
    let email = addr.to_ascii()?.parse::<lettre::Address>()?;
    Ok(Mailbox::new(addr.name.clone(), email))
}

/// `<uuid@sender-domain>`, falling back to `localhost`.
fn generate_message_id(email: &Email) -> String {
    let domain = email
        .from
        .as_ref()
        .and_then(|from| from.email.rsplit_once('@'))
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}
