// /////////////////////////////////////////////////////////////////////////////
// TaskDeck
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Millisecond Timestamp Serialization
//!
//! The wire and storage format for every timestamp in the system is integer
//! milliseconds since the Unix epoch. Internally timestamps are
//! `chrono::DateTime<Utc>`; this module is the serde bridge between the two,
//! used with `#[serde(with = "millis_serde")]` on required fields and
//! `#[serde(default, with = "millis_serde::optional")]` on optional ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_i64(dt.timestamp_millis())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = i64::deserialize(deserializer)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp {} out of range", ms)))
}

pub mod optional {
    use super::*;

    pub fn serialize<S>(opt_dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match opt_dt {
            Some(dt) => serializer.serialize_some(&dt.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_ms: Option<i64> = Option::deserialize(deserializer)?;
        match opt_ms {
            Some(ms) => DateTime::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp {} out of range", ms))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super")]
        at: DateTime<Utc>,
        #[serde(default, with = "super::optional")]
        maybe: Option<DateTime<Utc>>,
    }

    #[test]
    fn serializes_as_integer_millis() {
        let stamped = Stamped {
            at: DateTime::from_timestamp_millis(1_735_689_600_000).unwrap(),
            maybe: None,
        };
        let json = serde_json::to_value(&stamped).unwrap();
        assert_eq!(json["at"], serde_json::json!(1_735_689_600_000i64));
        assert_eq!(json["maybe"], serde_json::Value::Null);
    }

    #[test]
    fn deserializes_from_integer_millis() {
        let stamped: Stamped =
            serde_json::from_str(r#"{"at": 1000, "maybe": 2000}"#).unwrap();
        assert_eq!(stamped.at.timestamp_millis(), 1000);
        assert_eq!(stamped.maybe.unwrap().timestamp_millis(), 2000);
    }

    #[test]
    fn missing_optional_maps_to_none() {
        let stamped: Stamped = serde_json::from_str(r#"{"at": 0}"#).unwrap();
        assert!(stamped.maybe.is_none());
    }
}
