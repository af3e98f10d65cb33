//! Short random identifiers
//!
//! Session identifiers only group events from one reporter instance, so they
//! are kept short and carry no structure.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a generated session identifier.
pub const SESSION_ID_LEN: usize = 16;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Bytes of a v4 UUID carrying the version and variant bits.
const FIXED_UUID_BYTES: [usize; 2] = [6, 8];

/// 252 = 7 * 36
const UNBIASED_BYTE_LIMIT: u8 = 252;

/// Generates a random alphanumeric identifier of `len` characters.
///
/// Randomness comes from v4 UUIDs. The version and variant bytes are
/// skipped, and bytes at or above the largest multiple of 36 are rejected so
/// every character is uniform over the alphabet.
pub fn generate_id(len: usize) -> String {
    let mut id = String::with_capacity(len);
    while id.len() < len {
        let bytes = Uuid::new_v4().into_bytes();
        let random = bytes
            .iter()
            .enumerate()
            .filter(|(index, _)| !FIXED_UUID_BYTES.contains(index))
            .map(|(_, byte)| *byte)
            .filter(|byte| *byte < UNBIASED_BYTE_LIMIT);

        for byte in random {
            if id.len() == len {
                break;
            }
            id.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
        }
    }
    id
}

/// Identifier grouping the events of one reporter instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a fresh random session identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id(SESSION_ID_LEN))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
