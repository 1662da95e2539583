use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest over the exact bytes of an image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        let mut hex = self.to_string();
        hex.truncate(8);
        hex
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

/// Downloaded image bytes with their content hash.
///
/// Two values are equal iff their hashes are equal.
#[derive(Debug, Clone)]
pub struct ImageContent {
    bytes: Vec<u8>,
    hash: ContentHash,
}

impl ImageContent {
    pub fn new(bytes: Vec<u8>) -> Self {
        let hash = ContentHash::of(&bytes);
        Self { bytes, hash }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for ImageContent {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ImageContent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    /// No reference yet; everything is new.
    FirstRun,
    Changed { previous: ContentHash },
    Unchanged,
}

impl ChangeDecision {
    pub fn is_new(&self) -> bool {
        !matches!(self, ChangeDecision::Unchanged)
    }
}

pub fn decide_change(existing: Option<ContentHash>, incoming: ContentHash) -> ChangeDecision {
    match existing {
        None => ChangeDecision::FirstRun,
        Some(previous) if previous == incoming => ChangeDecision::Unchanged,
        Some(previous) => ChangeDecision::Changed { previous },
    }
}
