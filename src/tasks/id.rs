//! Task identifiers.
//!
//! A [`TaskId`] is 12 bytes rendered as 24 lower-case hex characters:
//! 1. A 4-byte big-endian count of seconds since the Unix epoch
//! 2. 5 bytes of per-process random data
//! 3. A 3-byte big-endian counter, seeded randomly
//!
//! Ids generated by one process therefore sort by creation second and never
//! collide within that process.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// Number of raw bytes in an id.
const ID_BYTES: usize = 12;

/// Per-process random bytes (middle of every id).
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Rolling counter (tail of every id), 24 bits used.
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Opaque identifier assigned to a task by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId([u8; ID_BYTES]);

impl TaskId {
    /// Generate a fresh id stamped with the given time.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn generate(now: DateTime<Utc>) -> Self {
        // Truncation is intentional: the seconds field wraps in 2106
        let secs = now.timestamp().max(0) as u32;
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(random_u64() as u32))
            .fetch_add(1, Ordering::SeqCst)
            & 0x00FF_FFFF;

        let mut bytes = [0u8; ID_BYTES];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(PROCESS_UNIQUE.get_or_init(process_unique));
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Coerce user text into an id.
    ///
    /// Surrounding whitespace is ignored; upper-case hex is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdFormat`] unless the text is exactly 24 hex
    /// characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != ID_BYTES * 2 || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidIdFormat(raw.to_string()));
        }

        let mut bytes = [0u8; ID_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &trimmed[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| Error::InvalidIdFormat(raw.to_string()))?;
        }
        Ok(Self(bytes))
    }

    /// The second at which this id was generated.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(i64::from(secs), 0)
    }

    /// The raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; ID_BYTES] {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Random 64 bits from the std hasher's per-instance keys.
#[allow(clippy::cast_possible_truncation)]
fn random_u64() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    // Truncation is intentional - we only need entropy, not precision
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    hasher.write_u32(std::process::id());
    hasher.finish()
}

fn process_unique() -> [u8; 5] {
    let bytes = random_u64().to_be_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]
}
