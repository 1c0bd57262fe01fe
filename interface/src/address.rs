use std::{fmt, str::FromStr};

use data_encoding::BASE32_NOPAD;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};

use crate::InterfaceError;

/// Length of the textual form of an address.
pub const ADDRESS_TEXT_LEN: usize = 58;
const KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;

/// An account address: a 32-byte public key.
///
/// The textual form is the base32 (no padding) encoding of the key followed
/// by the last four bytes of its SHA-512/256 digest. Serde uses the textual
/// form; the transaction encoder writes the raw key bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; KEY_LEN]);

impl Address {
    pub const fn new(key: [u8; KEY_LEN]) -> Self {
        Self(key)
    }

    pub const fn zero() -> Self {
        Self([0; KEY_LEN])
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; KEY_LEN]
    }

    /// `ABCD...WXYZ` style rendering keeping `edge` characters on each side.
    pub fn shortened(&self, edge: usize) -> String {
        let text = self.to_string();
        if edge * 2 >= text.len() {
            return text;
        }
        format!("{}...{}", &text[..edge], &text[text.len() - edge..])
    }

    fn checksum(key: &[u8; KEY_LEN]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(key);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        checksum
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(KEY_LEN + CHECKSUM_LEN);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&Self::checksum(&self.0));
        f.write_str(&BASE32_NOPAD.encode(&buf))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = InterfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.len() != ADDRESS_TEXT_LEN {
            return Err(InterfaceError::InvalidAddress(text.to_string()));
        }
        let decoded = BASE32_NOPAD
            .decode(text.as_bytes())
            .map_err(|_| InterfaceError::InvalidAddress(text.to_string()))?;
        if decoded.len() != KEY_LEN + CHECKSUM_LEN {
            return Err(InterfaceError::InvalidAddress(text.to_string()));
        }

        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&decoded[..KEY_LEN]);
        if decoded[KEY_LEN..] != Self::checksum(&key) {
            return Err(InterfaceError::InvalidAddress(text.to_string()));
        }
        Ok(Self(key))
    }
}

impl From<[u8; KEY_LEN]> for Address {
    fn from(key: [u8; KEY_LEN]) -> Self {
        Self(key)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Writes an address as raw key bytes, the form used inside transactions.
pub(crate) fn serialize_key<S: Serializer>(
    address: &Address,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_bytes(address.as_bytes())
}

pub(crate) fn serialize_optional_key<S: Serializer>(
    address: &Option<Address>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match address {
        Some(address) => serializer.serialize_bytes(address.as_bytes()),
        None => serializer.serialize_none(),
    }
}
