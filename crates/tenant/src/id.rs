//! Fixed-width resource identifiers.
//!
//! An [`Id`] is a 64-bit value whose zero value means "unset". On the wire
//! and in storage keys it is exactly [`ID_LENGTH`] lowercase hexadecimal
//! ASCII bytes, so encoded ids sort in numeric order.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TenantError};

/// Length in bytes of an encoded [`Id`].
pub const ID_LENGTH: usize = 16;

/// Identifier of a bucket or organization.
///
/// # Examples
///
/// ```
/// use tenantdb_tenant::Id;
///
/// let id = Id::new(0x0a);
/// assert_eq!(&id.encode().unwrap(), b"000000000000000a");
/// assert_eq!(Id::decode(b"000000000000000a").unwrap(), id);
/// assert!(!Id::default().is_valid());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Wraps a raw value. Zero produces the invalid id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` unless this is the zero id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Encodes the id as [`ID_LENGTH`] lowercase hex bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::InvalidId`] for the zero id.
    pub fn encode(self) -> Result<[u8; ID_LENGTH]> {
        if !self.is_valid() {
            return Err(TenantError::invalid_id("id is zero"));
        }
        let mut out = [0u8; ID_LENGTH];
        hex::encode_to_slice(self.0.to_be_bytes(), &mut out)
            .map_err(|e| TenantError::invalid_id_with_source("failed to encode id", e))?;
        Ok(out)
    }

    /// Decodes an id from its [`ID_LENGTH`]-byte hex form.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::InvalidId`] if `bytes` has the wrong length,
    /// is not lowercase hexadecimal, or decodes to zero. Only the canonical
    /// form produced by [`encode`](Self::encode) is accepted, so decoding
    /// then encoding always gives back the input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ID_LENGTH {
            return Err(TenantError::invalid_id(format!(
                "id must be {ID_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().any(u8::is_ascii_uppercase) {
            return Err(TenantError::invalid_id("id must be lowercase hexadecimal"));
        }
        let mut raw = [0u8; ID_LENGTH / 2];
        hex::decode_to_slice(bytes, &mut raw)
            .map_err(|e| TenantError::invalid_id_with_source("id is not hexadecimal", e))?;

        let id = Self(u64::from_be_bytes(raw));
        if !id.is_valid() {
            return Err(TenantError::invalid_id("id is zero"));
        }
        Ok(id)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl FromStr for Id {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s.as_bytes())
    }
}

/// Serializes as the 16-char hex string. The zero id is refused, matching
/// [`Deserialize`], so a serialized id always reads back.
impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.is_valid() {
            return Err(serde::ser::Error::custom("id is zero"));
        }
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
