//! Content handed to the artifact writer

use tokio::io::AsyncRead;

/// Artifact content: already materialized, or a byte stream to drain
pub enum Contents {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Byte source drained straight into the destination file
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl Contents {
    /// Wrap any async reader as stream content
    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Contents::Stream(Box::new(reader))
    }

    /// Empty text
    pub fn empty() -> Self {
        Contents::Text(String::new())
    }

    /// Whether materialized content is empty; `None` for streams, which are
    /// only known after draining
    pub fn is_empty(&self) -> Option<bool> {
        match self {
            Contents::Text(text) => Some(text.is_empty()),
            Contents::Bytes(bytes) => Some(bytes.is_empty()),
            Contents::Stream(_) => None,
        }
    }
}

impl std::fmt::Debug for Contents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Contents::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Contents::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Contents::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Contents {
    fn from(text: String) -> Self {
        Contents::Text(text)
    }
}

impl From<&str> for Contents {
    fn from(text: &str) -> Self {
        Contents::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Contents {
    fn from(bytes: Vec<u8>) -> Self {
        Contents::Bytes(bytes)
    }
}

impl From<&[u8]> for Contents {
    fn from(bytes: &[u8]) -> Self {
        Contents::Bytes(bytes.to_vec())
    }
}

/// Absent content writes an empty file
impl<T: Into<Contents>> From<Option<T>> for Contents {
    fn from(contents: Option<T>) -> Self {
        contents.map_or_else(Contents::empty, Into::into)
    }
}
