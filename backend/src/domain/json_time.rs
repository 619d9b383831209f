//! Serde helpers rendering timestamps as `YYYY-MM-DD HH:MM:SS`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Wire format for every timestamp exposed by the API.
pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialize a timestamp in [`FORMAT`].
///
/// # Errors
///
/// Propagates serializer failures.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(FORMAT))
}

/// Parse a timestamp written in [`FORMAT`], interpreting it as UTC.
///
/// # Errors
///
/// Fails when the input does not match [`FORMAT`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Optional variant used for soft-delete markers.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize `Some` in the shared format and `None` as `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => super::serialize(timestamp, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Parse an optional timestamp.
    ///
    /// # Errors
    ///
    /// Fails when a present value does not match the shared format.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                chrono::NaiveDateTime::parse_from_str(&raw, super::FORMAT)
                    .map(|naive| naive.and_utc())
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
