//! Serde helpers for server timestamps.
//!
//! The API emits either RFC 3339 strings or naive ISO 8601 datetimes with no
//! offset.  Naive values are taken to be UTC.  Serialization always writes
//! RFC 3339.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};

/// Parse a server timestamp.
pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    match OffsetDateTime::parse(s, &Rfc3339) {
        Ok(datetime) => Ok(datetime),
        Err(_) => PrimitiveDateTime::parse(s, &Iso8601::DEFAULT).map(|dt| dt.assume_utc()),
    }
}

/// Deserialize an RFC 3339 or naive ISO 8601 string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_rfc3339() {
        assert_eq!(
            parse("2024-05-01T12:30:00Z").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
        assert_eq!(
            parse("2024-05-01T14:30:00+02:00").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(
            parse("2024-05-01T12:30:00").unwrap(),
            datetime!(2024-05-01 12:30:00 UTC)
        );
        assert_eq!(
            parse("2024-05-01T12:30:00.250000").unwrap(),
            datetime!(2024-05-01 12:30:00.25 UTC)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }
}
