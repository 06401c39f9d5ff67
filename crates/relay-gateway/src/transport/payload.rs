//! Relayed message payloads

use std::sync::Arc;

/// An opaque message relayed between peers
///
/// The hub never looks inside a payload. The frame kind is kept so a peer that
/// sent text gets text frames back. Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    Text(Arc<str>),
    Binary(Arc<[u8]>),
}

impl Payload {
    /// Create a text payload
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Create a binary payload
    pub fn binary(data: impl Into<Arc<[u8]>>) -> Self {
        Self::Binary(data.into())
    }

    /// Raw bytes of the payload
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::binary(data)
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Self::binary(data)
    }
}
