//! Email attachments.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MailError;

/// How an attachment is presented to the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttachmentType {
    /// Downloadable file
    #[default]
    Attachment,
    /// Embedded in the HTML body via `cid:`
    Inline,
}

/// An email attachment.
///
/// ```
/// use courier::Attachment;
///
/// let report = Attachment::from_bytes("report.pdf", b"%PDF".to_vec());
/// assert_eq!(report.content_type, "application/pdf");
///
/// let logo = Attachment::from_bytes("logo.png", vec![0x89, 0x50]).inline();
/// assert_eq!(logo.content_id.as_deref(), Some("logo.png"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    /// MIME content type, guessed from the filename unless set explicitly
    pub content_type: String,
    pub data: Vec<u8>,
    pub disposition: AttachmentType,
    /// Content-ID for inline attachments
    pub content_id: Option<String>,
}

impl Attachment {
    /// Create an attachment from raw bytes.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();

        Self {
            filename,
            content_type,
            data,
            disposition: AttachmentType::Attachment,
            content_id: None,
        }
    }

    /// Read an attachment from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MailError::AttachmentFileNotFound(path.display().to_string())
            } else {
                MailError::AttachmentReadError(format!("{}: {}", path.display(), e))
            }
        })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment");

        Ok(Self::from_bytes(filename, data))
    }

    /// Override the guessed content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Mark as inline. The content id defaults to the filename.
    pub fn inline(mut self) -> Self {
        self.disposition = AttachmentType::Inline;
        if self.content_id.is_none() {
            self.content_id = Some(self.filename.clone());
        }
        self
    }

    /// Set the Content-ID referenced as `cid:<id>` from HTML.
    pub fn content_id(mut self, cid: impl Into<String>) -> Self {
        self.content_id = Some(cid.into());
        self
    }

    pub fn is_inline(&self) -> bool {
        self.disposition == AttachmentType::Inline
    }
}
