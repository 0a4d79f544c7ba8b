//! Caller profile picture, kept entirely on the client.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::error::DomainError;
use crate::domain::forms::AttachmentUpload;

use super::notices::NoticeSink;

/// Holds the caller's locally stored profile picture.
///
/// The picture never leaves the client; it shares the image-only and
/// size-ceiling rules with chat attachments.
pub struct AvatarManager {
    notices: Arc<dyn NoticeSink>,
    picture: Option<AttachmentUpload>,
}

impl AvatarManager {
    pub fn new(notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            notices,
            picture: None,
        }
    }

    /// Validate and store a new picture, replacing any previous one.
    pub fn set_picture(&mut self, file_name: &str, bytes: impl Into<Bytes>) -> Result<(), DomainError> {
        self.picture = Some(AttachmentUpload::new(file_name, bytes)?);
        self.notices.success("Profile picture updated!");
        Ok(())
    }

    pub fn remove(&mut self) {
        if self.picture.take().is_some() {
            self.notices.info("Profile picture removed.");
        }
    }

    pub fn picture(&self) -> Option<&AttachmentUpload> {
        self.picture.as_ref()
    }

    /// The stored picture as `(file name, bytes)`, for download or display.
    pub fn export(&self) -> Option<(String, Bytes)> {
        self.picture
            .as_ref()
            .map(|upload| (upload.file_name().to_string(), upload.clone().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notices::{NoticeLevel, NoticeLog};

    #[test]
    fn picture_round_trip_with_notices() {
        let log = Arc::new(NoticeLog::new());
        let mut avatar = AvatarManager::new(log.clone());

        assert!(avatar.set_picture("me.txt", vec![1u8]).is_err());
        assert!(avatar.picture().is_none());
        assert!(log.is_empty());

        avatar.set_picture("me.png", vec![1u8, 2]).expect("valid image");
        let (name, bytes) = avatar.export().expect("stored");
        assert_eq!(name, "me.png");
        assert_eq!(bytes.len(), 2);

        avatar.remove();
        assert!(avatar.picture().is_none());
        avatar.remove(); // no picture, no second notice

        let notices = log.drain();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[1].level, NoticeLevel::Info);
    }
}
