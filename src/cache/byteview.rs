//! Value Module
//!
//! The capability the bounded cache needs from stored values, and the
//! immutable byte view used for everything the node serves.

use std::fmt;

use bytes::Bytes;

// == Value Capability ==
/// Anything the cache can store: it reports its byte length, and `Clone`
/// is the copy handed out on a hit.
pub trait Value: Clone + Send + Sync {
    /// Number of bytes charged against the cache capacity.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Value for String {
    fn len(&self) -> usize {
        String::len(self)
    }
}

impl Value for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

// == Byte View ==
/// An immutable view over cached bytes.
///
/// Cloning only bumps a reference count; nobody can mutate the bytes through
/// a view, so a hit never exposes the cache's own storage to writes.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Wraps existing bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Returns an owned copy of the bytes.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Returns the underlying shared buffer.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl Value for ByteView {
    fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<Bytes> for ByteView {
    fn from(value: Bytes) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ByteView {
    fn from(value: &str) -> Self {
        Self::new(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for ByteView {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteView({:?})", String::from_utf8_lossy(&self.bytes))
    }
}
