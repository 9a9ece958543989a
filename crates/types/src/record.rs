//! Dataset records and their identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_PREFIX: &str = "id_";

/// Record identifier of the form `id_<sequence>`.
///
/// The id doubles as the partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Id for the `index`-th read of a wave, cycling through a dataset of
    /// `dataset_size` records.
    pub fn cycling(index: u64, dataset_size: u64) -> Self {
        RecordId(index % dataset_size.max(1))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ID_PREFIX, self.0)
    }
}

/// Error parsing a [`RecordId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid record id: {0}")]
pub struct ParseRecordIdError(pub String);

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(ID_PREFIX)
            .and_then(|seq| seq.parse().ok())
            .map(RecordId)
            .ok_or_else(|| ParseRecordIdError(s.to_string()))
    }
}

impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A product record stored in the backend.
///
/// Records are generated once, written once by the seeder and then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub category: String,
    pub name: String,
    pub quantity: u32,
    /// Price in cents. Serialized as a decimal amount.
    #[serde(rename = "price", with = "price_serde")]
    pub price_cents: u64,
    #[serde(rename = "clearance")]
    pub clearance_flag: bool,
}

impl Record {
    /// Partition key value. Identical to the id.
    pub fn partition_key(&self) -> String {
        self.id.to_string()
    }
}

mod price_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*cents as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let price = f64::deserialize(deserializer)?;
        if !price.is_finite() || price < 0.0 {
            return Err(serde::de::Error::custom(format!("invalid price {}", price)));
        }
        Ok((price * 100.0).round() as u64)
    }
}
