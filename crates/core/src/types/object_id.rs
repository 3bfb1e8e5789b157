use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const HEX_LEN: usize = 24;

/// Twelve-byte document identifier, rendered as 24 lowercase hex chars.
///
/// Layout: 4-byte big-endian unix seconds, 5 bytes unique to the generating
/// process, 3-byte big-endian counter. Byte order therefore sorts ids from the
/// same process by creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn from_parts(timestamp: u32, process_unique: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&process_unique);
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);
        ObjectId(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.len() != HEX_LEN {
            return Err(CoreError::InvalidObjectId(value.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value, &mut bytes)
            .map_err(|_| CoreError::InvalidObjectId(value.to_string()))?;
        Ok(ObjectId(bytes))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::try_from(value.as_str())
    }
}

impl FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::try_from(s)
    }
}

impl From<ObjectId> for String {
    fn from(value: ObjectId) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_24_hex_chars() {
        let id: ObjectId = "60d21b4667d0d8992e610c85".parse().unwrap();
        assert_eq!(id.to_string(), "60d21b4667d0d8992e610c85");
        assert_eq!(id.timestamp(), 0x60d2_1b46);
    }

    #[test]
    fn parse_normalizes_uppercase_hex() {
        let id: ObjectId = "60D21B4667D0D8992E610C85".parse().unwrap();
        assert_eq!(id.to_string(), "60d21b4667d0d8992e610c85");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(ObjectId::try_from("60d21b4667d0d8992e610c8").is_err());
        assert!(ObjectId::try_from("60d21b4667d0d8992e610c855").is_err());
        assert!(ObjectId::try_from("").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let err = ObjectId::try_from("zzd21b4667d0d8992e610c85").unwrap_err();
        assert!(matches!(err, CoreError::InvalidObjectId(_)));
    }

    #[test]
    fn from_parts_orders_by_time_then_counter() {
        let process = [1, 2, 3, 4, 5];
        let first = ObjectId::from_parts(100, process, 7);
        let second = ObjectId::from_parts(100, process, 8);
        let later = ObjectId::from_parts(101, process, 0);
        assert!(first < second);
        assert!(second < later);
        assert_eq!(first.bytes()[9..], [0, 0, 7]);
    }

    #[test]
    fn serde_uses_hex_string() {
        let id: ObjectId = "60d21b4667d0d8992e610c85".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"60d21b4667d0d8992e610c85\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }
}
