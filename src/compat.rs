//! Serde adapters for the on-disk JSON shape.
//!
//! Databases written by earlier versions of the tool store timestamps as
//! RFC3339 strings with `0001-01-01T00:00:00Z` meaning "unset", write `null`
//! for empty arrays, and encode the password hash as a base64 string. These
//! adapters read all of that and write one canonical form back.

use base64::prelude::*;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const ZERO_TIME_PREFIX: &str = "0001-01-01";

/// Deserialize `null` as the type's default (used for arrays and strings).
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Calendar date stored as `YYYY-MM-DD`; RFC3339 and the zero time are accepted on read.
pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.starts_with(ZERO_TIME_PREFIX) => Ok(None),
            Some(s) => parse_date(s).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{s}'"))).map(Some),
        }
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(d);
        }
        // The calendar date as written, not shifted into UTC.
        DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
    }
}

/// RFC3339 timestamp; `null`, empty, and the zero time all mean unset.
pub mod timestamp {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.starts_with(ZERO_TIME_PREFIX) => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{s}': {e}"))),
        }
    }
}

/// Optional string where the empty string means "none".
pub mod blank_as_none {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|s| !s.trim().is_empty()))
    }
}

/// Password hash bytes, written as base64 and read from base64 or a byte array.
pub mod password {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Encoded(String),
        Bytes(Vec<u8>),
    }

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&BASE64_STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Bytes(bytes)) if bytes.is_empty() => Ok(None),
            Some(Raw::Bytes(bytes)) => Ok(Some(bytes)),
            Some(Raw::Encoded(s)) if s.is_empty() => Ok(None),
            Some(Raw::Encoded(s)) => BASE64_STANDARD
                .decode(s.as_bytes())
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid password encoding: {e}"))),
        }
    }
}
