//! Identifiers used by the service
//!
//! Two kinds of identifier live here:
//!
//! - [`ObjectId`]: the 12-byte document identifier assigned to every stored
//!   user and task, rendered on the wire as 24 lowercase hex characters.
//! - [`RequestId`]: a TypeID (`req_<base32-uuidv7>`) attached to every HTTP
//!   request for log correlation.
//!
//! ```rust
//! use tasky::ids::ObjectId;
//!
//! let id = ObjectId::new();
//! let parsed: ObjectId = id.to_hex().parse().unwrap();
//! assert_eq!(id, parsed);
//! ```

use http::Request;
use mti::prelude::*;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Length of an [`ObjectId`] in bytes.
pub const OBJECT_ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Random bytes fixed for the lifetime of the process.
static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random);

/// Per-process counter, seeded randomly and wrapped to 24 bits.
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK));

/// A document identifier.
///
/// Layout: 4-byte big-endian seconds since the Unix epoch, 5 process-unique
/// random bytes, 3-byte big-endian counter. Identifiers generated by one
/// process sort by creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or_default();
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Raw bytes of the identifier.
    #[must_use]
    pub const fn bytes(&self) -> [u8; OBJECT_ID_LEN] {
        self.0
    }

    /// Creation time in seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Parses a 24-character hex string (either case).
    pub fn parse_str(input: &str) -> Result<Self, ObjectIdError> {
        if input.len() != OBJECT_ID_LEN * 2 {
            return Err(ObjectIdError::InvalidLength(input.len()));
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        let raw = input.as_bytes();
        for (index, byte) in bytes.iter_mut().enumerate() {
            let high = hex_value(raw[index * 2], index * 2, input)?;
            let low = hex_value(raw[index * 2 + 1], index * 2 + 1, input)?;
            *byte = (high << 4) | low;
        }
        Ok(Self(bytes))
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

fn hex_value(byte: u8, index: usize, input: &str) -> Result<u8, ObjectIdError> {
    match byte {
        b'0'..=b'9' => Ok(byte - b'0'),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        _ => Err(ObjectIdError::InvalidCharacter {
            character: input[index..].chars().next().unwrap_or_default(),
            index,
        }),
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Error type for identifier parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    /// The input was not 24 characters long.
    #[error("invalid object id length {0}, expected 24 hex characters")]
    InvalidLength(usize),

    /// The input contained a non-hex character.
    #[error("invalid character {character:?} at position {index} in object id")]
    InvalidCharacter { character: char, index: usize },
}

/// A type-safe request identifier for log correlation.
///
/// Format: `req_<base32-encoded-uuidv7>`, e.g. `req_01h455vb4pex5vsknk084sn02q`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The prefix used for request IDs
    pub const PREFIX: &'static str = "req";

    /// Creates a new time-sortable request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Returns the request ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = RequestIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mti = MagicTypeId::from_str(s).map_err(RequestIdError::Parse)?;

        if mti.prefix().as_str() != Self::PREFIX {
            return Err(RequestIdError::InvalidPrefix {
                actual: mti.prefix().as_str().to_string(),
            });
        }

        Ok(Self(mti))
    }
}

/// Error type for request ID parsing.
#[derive(Debug, thiserror::Error)]
pub enum RequestIdError {
    /// The ID could not be parsed as a valid TypeID.
    #[error("failed to parse request ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    /// The ID has the wrong prefix.
    #[error("invalid request ID prefix: expected 'req', got '{actual}'")]
    InvalidPrefix { actual: String },
}

/// Generates a [`RequestId`] for every request that arrives without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let request_id = RequestId::new();
        http::HeaderValue::from_str(request_id.as_str())
            .ok()
            .map(TowerRequestId::new)
    }
}
