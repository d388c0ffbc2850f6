//! Record identifiers.
//!
//! Every record and embedded frequency is keyed by a 24-digit lowercase hex
//! id laid out like a document-database object id: 4 bytes of creation
//! seconds, 5 bytes of per-process randomness and a 3-byte counter. Ids are
//! always generated by the server; anything parsed from a client must be
//! well-formed or it is rejected as a cast error.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Number of raw bytes in an id.
const ID_BYTES: usize = 12;

/// Length of the hex representation.
pub const ID_HEX_LEN: usize = ID_BYTES * 2;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_NONCE: OnceLock<[u8; 5]> = OnceLock::new();

/// A malformed id supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cast to ObjectId failed for value \"{0}\"")]
pub struct InvalidRecordId(pub String);

/// Server-generated identifier of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        let secs = chrono::Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(PROCESS_NONCE.get_or_init(rand::random::<[u8; 5]>));
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        let mut hex = String::with_capacity(ID_HEX_LEN);
        for b in bytes {
            hex.push_str(&format!("{b:02x}"));
        }
        Self(hex)
    }

    /// Parse a client-supplied id. Upper-case hex is accepted and normalised.
    pub fn parse(raw: &str) -> Result<Self, InvalidRecordId> {
        if raw.len() != ID_HEX_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidRecordId(raw.to_owned()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Borrow the hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
