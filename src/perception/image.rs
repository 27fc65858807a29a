use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};

#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("invalid base64 image: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encoded image bytes of one frame (JPEG/PNG as sent by the client).
/// Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    bytes: Arc<[u8]>,
}

impl FrameImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Decodes a base64 payload, with or without a `data:image/...;base64,` prefix.
    pub fn decode(payload: &str) -> Result<Self, ImageDecodeError> {
        let encoded: String = strip_data_uri(payload)
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        if encoded.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        let bytes = general_purpose::STANDARD.decode(encoded)?;
        if bytes.is_empty() {
            return Err(ImageDecodeError::Empty);
        }
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

pub fn strip_data_uri(payload: &str) -> &str {
    let trimmed = payload.trim();
    match trimmed.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    }
}
