//! Serde helpers for dates sent by the dashboard, which posts either full
//! RFC 3339 timestamps or bare `YYYY-MM-DD` dates from date inputs.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

/// Parses an RFC 3339 timestamp or a calendar date (taken as midnight UTC).
///
/// # Errors
/// Returns a message naming the accepted formats.
pub fn parse_flexible(value: &str) -> Result<OffsetDateTime, String> {
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|d| d.with_time(Time::MIDNIGHT).assume_utc())
        .map_err(|_| format!("invalid date '{value}', expected RFC 3339 or YYYY-MM-DD"))
}

pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    time::serde::rfc3339::serialize(value, serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_flexible(&raw).map_err(D::Error::custom)
}

pub mod option {
    use super::parse_flexible;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::OffsetDateTime;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_flexible(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
