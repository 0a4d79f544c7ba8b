//! Optimistic chat session.
//!
//! The transcript is a local echo: a message enters it before the remote send
//! is attempted and stays there whatever the outcome. Delivery failures are
//! surfaced as an error notice only; the transcript is never reconciled
//! against the server-side message history and failed sends are not retried.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::domain::blob::ExternalBlob;
use crate::domain::entities::MessageId;
use crate::domain::error::DomainError;
use crate::domain::forms::{AttachmentUpload, ChatDraft};
use crate::domain::types::MessageOrigin;

use super::mutations::MutationExecutor;
use super::notices::NoticeSink;

/// Delivery outcome of a locally echoed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The remote send is still in flight.
    Sending,
    /// The backend acknowledged the message.
    Confirmed(MessageId),
    /// The remote send failed; the message remains in the transcript.
    Failed,
}

/// One transcript entry. Identified by a client-side id, never by the
/// backend's.
#[derive(Debug, Clone)]
pub struct LocalMessage {
    pub id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub preview: Option<Url>,
    pub timestamp: OffsetDateTime,
    pub origin: MessageOrigin,
    pub delivery: Delivery,
}

/// What `send` tells the caller about the attempt it just made.
#[derive(Debug, Clone, Copy)]
pub struct SendReceipt {
    pub local_id: Uuid,
    pub delivery: Delivery,
}

struct StagedAttachment {
    upload: AttachmentUpload,
    preview: Url,
}

/// Per-user chat state: sender identity, one staged attachment, and the
/// optimistic transcript.
pub struct ChatSession {
    mutations: MutationExecutor,
    notices: Arc<dyn NoticeSink>,
    sender_name: Option<String>,
    transcript: Vec<LocalMessage>,
    attachment: Option<StagedAttachment>,
}

impl ChatSession {
    pub fn new(mutations: MutationExecutor, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            mutations,
            notices,
            sender_name: None,
            transcript: Vec::new(),
            attachment: None,
        }
    }

    pub fn set_sender_name(&mut self, name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("sender name is required"));
        }
        self.sender_name = Some(trimmed.to_string());
        Ok(())
    }

    pub fn sender_name(&self) -> Option<&str> {
        self.sender_name.as_deref()
    }

    pub fn transcript(&self) -> &[LocalMessage] {
        &self.transcript
    }

    /// Stage an attachment for the next send, replacing any previous one.
    /// Returns the transient preview reference for display while composing.
    pub fn stage_attachment(
        &mut self,
        file_name: &str,
        bytes: impl Into<bytes::Bytes>,
    ) -> Result<Url, DomainError> {
        let upload = AttachmentUpload::new(file_name, bytes)?;
        let preview = upload.preview_url();
        self.attachment = Some(StagedAttachment {
            upload,
            preview: preview.clone(),
        });
        Ok(preview)
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Send a message: echo it into the transcript, then attempt the remote
    /// call exactly once.
    ///
    /// Validation failures return an error and leave the transcript and the
    /// staged attachment untouched. A delivery failure is not an error from
    /// the caller's point of view: the message stays in the transcript marked
    /// [`Delivery::Failed`] and an error notice is raised.
    pub async fn send(&mut self, text: &str) -> Result<SendReceipt, DomainError> {
        let Some(sender_name) = self.sender_name.clone() else {
            return Err(DomainError::validation("sender name is required"));
        };
        let text = text.trim();
        if text.is_empty() && self.attachment.is_none() {
            return Err(DomainError::validation(
                "message text or attachment is required",
            ));
        }

        // Past this point the input is known good; the staged attachment is
        // consumed and the message is echoed before the remote call.
        let staged = self.attachment.take();
        let (image, preview) = match staged {
            Some(staged) => (
                Some(ExternalBlob::from_bytes(staged.upload.into_bytes())),
                Some(staged.preview),
            ),
            None => (None, None),
        };
        let draft = ChatDraft::new(&sender_name, text, image)?;

        let local_id = Uuid::new_v4();
        self.transcript.push(LocalMessage {
            id: local_id,
            sender_name,
            text: text.to_string(),
            preview,
            timestamp: OffsetDateTime::now_utc(),
            origin: MessageOrigin::Own,
            delivery: Delivery::Sending,
        });

        let delivery = match self.mutations.send_message(draft).await {
            Ok(message_id) => {
                debug!(%local_id, %message_id, "message delivered");
                Delivery::Confirmed(message_id)
            }
            Err(error) => {
                debug!(%local_id, %error, "message delivery failed");
                self.notices
                    .error("Failed to send message. Please try again.");
                Delivery::Failed
            }
        };
        if let Some(message) = self.transcript.iter_mut().find(|m| m.id == local_id) {
            message.delivery = delivery;
        }
        Ok(SendReceipt { local_id, delivery })
    }
}
