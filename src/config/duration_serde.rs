//! Durations in configuration: `"8s"`, `"1h30m"` or plain seconds.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// What a duration looks like in the TOML file
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

impl RawDuration {
    fn into_duration<E: de::Error>(self) -> Result<Duration, E> {
        match self {
            Self::Seconds(seconds) => Ok(Duration::from_secs(seconds)),
            Self::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| E::custom(format!("invalid duration '{text}': {e}"))),
        }
    }
}

fn to_text(duration: &Duration) -> String {
    humantime::format_duration(*duration).to_string()
}

/// `#[serde(with = "duration")]` for `Duration` fields
pub mod duration {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_text(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        RawDuration::deserialize(deserializer)
            .map_err(|_| de::Error::custom("expected seconds or a duration such as \"8s\""))?
            .into_duration()
    }
}

/// Same as [`duration`] for optional settings such as `cache.negative_ttl`
pub mod option_duration {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.as_ref().map(to_text).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
    }
}
