//! Core data types for chirp

use crate::error::PostError;

/// Longest message accepted, in Unicode scalar values
pub const MAX_MESSAGE_CHARS: usize = 280;

/// An image attached to a message
#[derive(Clone, PartialEq, Eq)]
pub struct Media {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Media {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/png")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name sent with the multipart upload
    pub fn file_name(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "image.jpg",
            "image/gif" => "image.gif",
            "image/webp" => "image.webp",
            _ => "image.png",
        }
    }
}

impl std::fmt::Debug for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A message the service accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostReceipt {
    /// Remote message id; empty if the response did not carry one
    pub id: String,
    pub text: String,
}

/// Account identity reported by the identity endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// Result of one submission attempt
pub type PostOutcome = Result<PostReceipt, PostError>;

/// Count of Unicode scalar values, the unit of [`MAX_MESSAGE_CHARS`]
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Check a message body before it leaves the process
pub fn validate_message(text: &str) -> Result<(), PostError> {
    if text.is_empty() {
        return Err(PostError::Validation("Message cannot be empty".to_string()));
    }

    let count = char_count(text);
    if count > MAX_MESSAGE_CHARS {
        return Err(PostError::Validation(format!(
            "Message is {} characters, limit is {}",
            count, MAX_MESSAGE_CHARS
        )));
    }

    Ok(())
}
