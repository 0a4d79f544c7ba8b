//! Caller-side validation for every write path.
//!
//! Drafts are validated at construction, so a value of one of these types is
//! proof that no remote round-trip will be wasted on bad input. Rejections
//! never reach the mutation executor.

use bytes::Bytes;
use mime_guess::mime;
use url::Url;
use uuid::Uuid;

use super::blob::ExternalBlob;
use super::entities::{MessageId, WatchId};
use super::error::DomainError;
use super::price::Price;

/// Upload size ceiling for attachment images.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Validated input for creating a catalog watch.
#[derive(Debug, Clone)]
pub struct WatchDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: ExternalBlob,
}

impl WatchDraft {
    pub fn new(
        name: &str,
        description: &str,
        price_input: &str,
        image: ExternalBlob,
    ) -> Result<Self, DomainError> {
        let name = required(name, "watch name")?;
        let price = Price::parse(price_input)?;
        Ok(Self {
            name,
            description: description.trim().to_string(),
            price,
            image,
        })
    }
}

/// Validated input for updating a catalog watch.
#[derive(Debug, Clone)]
pub struct WatchPatch {
    pub id: WatchId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub published: bool,
}

impl WatchPatch {
    pub fn new(
        id: WatchId,
        name: &str,
        description: &str,
        price_input: &str,
        published: bool,
    ) -> Result<Self, DomainError> {
        let name = required(name, "watch name")?;
        let price = Price::parse(price_input)?;
        Ok(Self {
            id,
            name,
            description: description.trim().to_string(),
            price,
            published,
        })
    }
}

/// Validated input for placing an order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub contact_info: String,
    pub watch_id: WatchId,
    pub note: String,
}

impl OrderDraft {
    pub fn new(
        customer_name: &str,
        contact_info: &str,
        watch_id: WatchId,
        note: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            customer_name: required(customer_name, "customer name")?,
            contact_info: required(contact_info, "contact info")?,
            watch_id,
            note: note.trim().to_string(),
        })
    }
}

/// Validated input for sending a chat message.
#[derive(Debug, Clone)]
pub struct ChatDraft {
    pub sender_name: String,
    pub text: String,
    pub image: Option<ExternalBlob>,
}

impl ChatDraft {
    pub fn new(
        sender_name: &str,
        text: &str,
        image: Option<ExternalBlob>,
    ) -> Result<Self, DomainError> {
        let sender_name = required(sender_name, "sender name")?;
        let text = text.trim().to_string();
        if text.is_empty() && image.is_none() {
            return Err(DomainError::validation(
                "message text or attachment is required",
            ));
        }
        Ok(Self {
            sender_name,
            text,
            image,
        })
    }
}

/// Validated input for replying to a chat message.
#[derive(Debug, Clone)]
pub struct ReplyDraft {
    pub message_id: MessageId,
    pub text: String,
}

impl ReplyDraft {
    pub fn new(message_id: MessageId, text: &str) -> Result<Self, DomainError> {
        Ok(Self {
            message_id,
            text: required(text, "reply text")?,
        })
    }
}

/// Validated input for saving the caller's profile.
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub name: String,
}

impl ProfileDraft {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            name: required(name, "profile name")?,
        })
    }
}

/// An image file staged for upload, read into memory once.
///
/// Construction enforces the file-type and size ceiling checks, so a value of
/// this type is always an acceptable image.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

impl AttachmentUpload {
    pub fn new(file_name: &str, bytes: impl Into<Bytes>) -> Result<Self, DomainError> {
        let bytes = bytes.into();
        let guessed = mime_guess::from_path(file_name).first_or_octet_stream();
        if guessed.type_() != mime::IMAGE {
            return Err(DomainError::validation("attachment must be an image file"));
        }
        if bytes.is_empty() {
            return Err(DomainError::validation("attachment is empty"));
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(DomainError::validation(
                "attachment must be smaller than 10 MB",
            ));
        }
        Ok(Self {
            file_name: file_name.to_string(),
            content_type: guessed.essence_str().to_string(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the staged bytes; they are handed to the remote call exactly once.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Mint a transient client-side preview reference.
    ///
    /// Distinct from the server-side reference the backend eventually returns;
    /// it only identifies locally staged data for display.
    pub fn preview_url(&self) -> Url {
        Url::parse(&format!("blob:{}", Uuid::new_v4())).expect("preview url is well formed")
    }
}

fn required(input: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ExternalBlob {
        ExternalBlob::from_bytes(vec![0u8; 16])
    }

    #[test]
    fn watch_draft_requires_name_and_positive_price() {
        assert!(WatchDraft::new("  ", "desc", "10.00", image()).is_err());
        assert!(WatchDraft::new("Royal", "desc", "0", image()).is_err());
        assert!(WatchDraft::new("Royal", "desc", "oops", image()).is_err());

        let draft = WatchDraft::new(" Royal Tourbillon ", " Hand wound. ", "1299.00", image())
            .expect("valid draft");
        assert_eq!(draft.name, "Royal Tourbillon");
        assert_eq!(draft.description, "Hand wound.");
        assert_eq!(draft.price.minor_units(), 129_900);
    }

    #[test]
    fn order_draft_requires_name_and_contact() {
        assert!(OrderDraft::new("", "a@b.c", WatchId(1), "").is_err());
        assert!(OrderDraft::new("James", "  ", WatchId(1), "").is_err());
        let draft = OrderDraft::new("James", "a@b.c", WatchId(1), " gift wrap ").expect("valid");
        assert_eq!(draft.note, "gift wrap");
    }

    #[test]
    fn chat_draft_needs_text_or_attachment() {
        assert!(ChatDraft::new("Ada", "   ", None).is_err());
        assert!(ChatDraft::new("", "hi", None).is_err());
        assert!(ChatDraft::new("Ada", "", Some(image())).is_ok());
        assert!(ChatDraft::new("Ada", "hi", None).is_ok());
    }

    #[test]
    fn attachment_rejects_non_images() {
        assert!(AttachmentUpload::new("notes.txt", vec![1u8, 2]).is_err());
        assert!(AttachmentUpload::new("archive.zip", vec![1u8, 2]).is_err());
        assert!(AttachmentUpload::new("photo.png", vec![1u8, 2]).is_ok());
        assert!(AttachmentUpload::new("photo.webp", vec![1u8, 2]).is_ok());
    }

    #[test]
    fn attachment_enforces_size_ceiling() {
        assert!(AttachmentUpload::new("photo.png", vec![0u8; MAX_ATTACHMENT_BYTES]).is_ok());
        assert!(AttachmentUpload::new("photo.png", vec![0u8; MAX_ATTACHMENT_BYTES + 1]).is_err());
        assert!(AttachmentUpload::new("photo.png", Vec::new()).is_err());
    }

    #[test]
    fn preview_urls_are_unique_per_call() {
        let upload = AttachmentUpload::new("photo.jpg", vec![1u8]).expect("valid upload");
        assert_ne!(upload.preview_url(), upload.preview_url());
        assert_eq!(upload.content_type(), "image/jpeg");
    }
}
