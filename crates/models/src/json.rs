//! Tolerant decoders for the ODE service's JSON quirks: single-element
//! lists serialized as bare objects, counts serialized as strings, and
//! timestamps without an offset.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Error decoding an upstream JSON payload into a typed model.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not the JSON the service documents: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service reported an error: {0}")]
    Service(String),
}

/// The service collapses single-element arrays into a bare object. Accept
/// either shape, and a missing field as the empty list.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(one)) => vec![one],
    })
}

/// Counts arrive as either a JSON number or a quoted decimal string.
pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Coordinates arrive as either a JSON number or a quoted decimal string;
/// empty strings mean absent.
pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coord {
        Number(f64),
        Text(String),
    }

    match Option::<Coord>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Coord::Number(n)) => Ok(Some(n)),
        Some(Coord::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Coord::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Observation times arrive as `1997-09-15T19:10:00.000`, without an
/// offset; they are documented as UTC.
pub fn utc_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(text) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    for format in TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Some(naive.and_utc()));
        }
    }
    Err(serde::de::Error::custom(format!("unrecognized timestamp: {text:?}")))
}

/// Serializes a timestamp back in the service's own format, so that a
/// decoded model re-encodes to something the decoder accepts.
pub fn serialize_utc_time<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match time {
        None => serializer.serialize_none(),
        Some(t) => serializer.serialize_str(&t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
    }
}
