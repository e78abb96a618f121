//! Named decoder configurations.
//!
//! Upstream services disagree on conventions: the first-party API and the
//! third-party catalog API both send `snake_case` keys, but only one of them
//! emits fractional seconds in its timestamps. A [`DecodingConfiguration`]
//! bundles a key strategy with a date strategy so each descriptor can pick
//! the preset matching its service.
//!
//! Date fields are typed as [`Timestamp`]. While a configuration decodes a
//! payload, every `Timestamp` inside it is parsed with that configuration's
//! [`DateDecodingStrategy`].

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::DecodingError;

/// How object keys in the payload are rewritten before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDecodingStrategy {
    /// Keys are used exactly as sent.
    #[default]
    UseDefaultKeys,
    /// `release_date` becomes `releaseDate`. Pair with
    /// `#[serde(rename_all = "camelCase")]` on the target type.
    ConvertFromSnakeCase,
}

impl KeyDecodingStrategy {
    pub fn apply(&self, value: Value) -> Value {
        match self {
            KeyDecodingStrategy::UseDefaultKeys => value,
            KeyDecodingStrategy::ConvertFromSnakeCase => convert_keys(value),
        }
    }
}

/// How [`Timestamp`] fields are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateDecodingStrategy {
    /// `2024-05-01T12:30:45Z`. Fractional seconds are rejected.
    #[default]
    Iso8601,
    /// `2024-05-01T12:30:45.123Z`. Fractional seconds are required.
    Iso8601WithFractionalSeconds,
}

impl DateDecodingStrategy {
    /// Parse `value`, returning `None` if it does not match this format.
    pub fn parse(&self, value: &str) -> Option<DateTime<Utc>> {
        let parsed = DateTime::parse_from_rfc3339(value).ok()?;
        // RFC 3339 fixes the seconds field to end at byte 19.
        let fractional = value.as_bytes().get(19) == Some(&b'.');
        match (self, fractional) {
            (DateDecodingStrategy::Iso8601, true) => None,
            (DateDecodingStrategy::Iso8601WithFractionalSeconds, false) => None,
            _ => Some(parsed.with_timezone(&Utc)),
        }
    }
}

/// A reusable, named decoder setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodingConfiguration {
    pub name: &'static str,
    pub keys: KeyDecodingStrategy,
    pub dates: DateDecodingStrategy,
}

impl Default for DecodingConfiguration {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl DecodingConfiguration {
    /// Snake-case keys, plain ISO-8601 dates.
    pub const STANDARD: Self = Self::new(
        "standard",
        KeyDecodingStrategy::ConvertFromSnakeCase,
        DateDecodingStrategy::Iso8601,
    );

    /// Snake-case keys, ISO-8601 dates with fractional seconds.
    pub const FRACTIONAL: Self = Self::new(
        "fractional",
        KeyDecodingStrategy::ConvertFromSnakeCase,
        DateDecodingStrategy::Iso8601WithFractionalSeconds,
    );

    pub const fn new(
        name: &'static str,
        keys: KeyDecodingStrategy,
        dates: DateDecodingStrategy,
    ) -> Self {
        Self { name, keys, dates }
    }

    /// Look up a preset by name.
    pub fn named(name: &str) -> Option<Self> {
        [Self::STANDARD, Self::FRACTIONAL]
            .into_iter()
            .find(|preset| preset.name == name)
    }

    /// Decode a JSON payload into `T`.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodingError> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.decode_value(value)
    }

    /// Like [`decode`](Self::decode), but an empty payload decodes as JSON
    /// `null`, so `()` and `Option<_>` targets accept it.
    pub fn decode_or_null<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodingError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return self.decode_value(Value::Null);
        }
        self.decode(bytes)
    }

    /// Decode an already-parsed JSON value into `T`.
    pub fn decode_value<T: DeserializeOwned>(&self, value: Value) -> Result<T, DecodingError> {
        let value = self.keys.apply(value);

        let scope = DateScope::enter(self.dates);
        let result = serde_json::from_value::<T>(value);
        let rejected = scope.finish();

        result.map_err(|e| match rejected {
            Some(value) if e.to_string().contains(&invalid_date_message(&value)) => {
                DecodingError::InvalidDate { value }
            }
            _ => DecodingError::Json(e),
        })
    }
}

impl fmt::Display for DecodingConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

struct ActiveDecode {
    dates: DateDecodingStrategy,
    rejected: Option<String>,
}

thread_local! {
    static ACTIVE: RefCell<Option<ActiveDecode>> = const { RefCell::new(None) };
}

/// Makes a date strategy visible to `Timestamp` for one synchronous decode.
/// Restores the enclosing scope on drop, so nested decodes are fine.
struct DateScope {
    previous: Option<ActiveDecode>,
}

impl DateScope {
    fn enter(dates: DateDecodingStrategy) -> Self {
        let previous = ACTIVE.with(|active| {
            active.replace(Some(ActiveDecode {
                dates,
                rejected: None,
            }))
        });
        Self { previous }
    }

    /// Leave the scope, returning the last date string that was rejected.
    fn finish(self) -> Option<String> {
        ACTIVE.with(|active| {
            active
                .borrow_mut()
                .as_mut()
                .and_then(|scope| scope.rejected.take())
        })
    }
}

impl Drop for DateScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| {
            active.replace(previous);
        });
    }
}

fn invalid_date_message(value: &str) -> String {
    format!("Invalid date: {}", value)
}

/// A UTC instant decoded from an ISO-8601 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let strategy = ACTIVE.with(|active| active.borrow().as_ref().map(|scope| scope.dates));

        let parsed = match strategy {
            Some(dates) => dates.parse(&raw),
            None => DateTime::parse_from_rfc3339(&raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        };

        match parsed {
            Some(dt) => Ok(Timestamp(dt)),
            None => {
                let message = invalid_date_message(&raw);
                ACTIVE.with(|active| {
                    if let Some(scope) = active.borrow_mut().as_mut() {
                        scope.rejected = Some(raw);
                    }
                });
                Err(D::Error::custom(message))
            }
        }
    }
}

fn convert_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key).into_owned(), convert_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(convert_keys).collect()),
        other => other,
    }
}

/// `release_date` -> `releaseDate`, `_private_key_` -> `_privateKey_`.
///
/// Words after the first are capitalized with the rest of their letters
/// lowercased. Leading and trailing underscores survive; runs of inner
/// underscores collapse.
pub fn snake_to_camel(key: &str) -> Cow<'_, str> {
    let Some(start) = key.find(|c: char| c != '_') else {
        return Cow::Borrowed(key);
    };
    let end = key
        .char_indices()
        .rev()
        .find(|&(_, c)| c != '_')
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(key.len());

    let core = &key[start..end];
    let mut words = core.split('_').filter(|word| !word.is_empty());
    let Some(first) = words.next() else {
        return Cow::Borrowed(key);
    };
    if !core.contains('_') {
        return Cow::Borrowed(key);
    }

    let mut converted = String::with_capacity(key.len());
    converted.push_str(&key[..start]);
    converted.push_str(first);
    for word in words {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            converted.extend(head.to_uppercase());
            converted.extend(chars.flat_map(char::to_lowercase));
        }
    }
    converted.push_str(&key[end..]);
    Cow::Owned(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Title {
        id: u64,
        original_title: String,
        vote_count: u32,
        release_date: Timestamp,
    }

    const FRACTIONAL_PAYLOAD: &str = r#"{
        "id": 603,
        "original_title": "The Matrix",
        "vote_count": 24000,
        "release_date": "1999-03-31T08:15:30.250Z"
    }"#;

    #[test]
    fn snake_to_camel_conversions() {
        assert_eq!(snake_to_camel("release_date"), "releaseDate");
        assert_eq!(snake_to_camel("id"), "id");
        assert_eq!(snake_to_camel("poster_URL"), "posterUrl");
        assert_eq!(snake_to_camel("_private_key_"), "_privateKey_");
        assert_eq!(snake_to_camel("a__b"), "aB");
        assert_eq!(snake_to_camel("___"), "___");
        assert_eq!(snake_to_camel(""), "");
        assert_eq!(snake_to_camel("alreadyCamel"), "alreadyCamel");
    }

    #[test]
    fn key_conversion_recurses_into_nested_values() {
        let value = serde_json::json!({
            "total_pages": 2,
            "results": [{"vote_average": 7.5, "genre_ids": [1, 2]}],
            "note": "keep_this_value"
        });
        let converted = KeyDecodingStrategy::ConvertFromSnakeCase.apply(value);
        assert_eq!(
            converted,
            serde_json::json!({
                "totalPages": 2,
                "results": [{"voteAverage": 7.5, "genreIds": [1, 2]}],
                "note": "keep_this_value"
            })
        );
    }

    #[test]
    fn fractional_preset_decodes_snake_case_payload() {
        let title: Title = DecodingConfiguration::FRACTIONAL
            .decode(FRACTIONAL_PAYLOAD.as_bytes())
            .unwrap();

        assert_eq!(title.id, 603);
        assert_eq!(title.original_title, "The Matrix");
        assert_eq!(title.vote_count, 24000);

        let expected = Utc.with_ymd_and_hms(1999, 3, 31, 8, 15, 30).unwrap();
        assert_eq!(title.release_date.timestamp(), expected.timestamp());
        assert_eq!(title.release_date.nanosecond(), 250_000_000);
    }

    #[test]
    fn standard_preset_rejects_fractional_dates() {
        let err = DecodingConfiguration::STANDARD
            .decode::<Title>(FRACTIONAL_PAYLOAD.as_bytes())
            .unwrap_err();
        assert_eq!(err.invalid_date(), Some("1999-03-31T08:15:30.250Z"));
    }

    #[test]
    fn fractional_preset_rejects_whole_second_dates() {
        let payload = FRACTIONAL_PAYLOAD.replace("30.250Z", "30Z");
        let err = DecodingConfiguration::FRACTIONAL
            .decode::<Title>(payload.as_bytes())
            .unwrap_err();
        match err {
            DecodingError::InvalidDate { value } => assert_eq!(value, "1999-03-31T08:15:30Z"),
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn standard_preset_decodes_whole_second_dates_with_offset() {
        let payload = FRACTIONAL_PAYLOAD.replace("08:15:30.250Z", "10:15:30+02:00");
        let title: Title = DecodingConfiguration::STANDARD.decode(payload.as_bytes()).unwrap();
        let expected = Utc.with_ymd_and_hms(1999, 3, 31, 8, 15, 30).unwrap();
        assert_eq!(title.release_date, Timestamp(expected));
    }

    #[test]
    fn garbage_date_names_the_offending_string() {
        let payload = FRACTIONAL_PAYLOAD.replace("1999-03-31T08:15:30.250Z", "yesterday");
        let err = DecodingConfiguration::FRACTIONAL
            .decode::<Title>(payload.as_bytes())
            .unwrap_err();
        assert_eq!(err.invalid_date(), Some("yesterday"));
        assert_eq!(err.to_string(), "Invalid date: yesterday");
    }

    #[test]
    fn shape_mismatch_is_json_error() {
        let err = DecodingConfiguration::STANDARD
            .decode::<Title>(br#"{"id": "not a number"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodingError::Json(_)));
    }

    #[test]
    fn default_keys_leave_snake_case_untouched() {
        #[derive(Deserialize)]
        struct Raw {
            vote_count: u32,
        }

        let config = DecodingConfiguration::new(
            "raw",
            KeyDecodingStrategy::UseDefaultKeys,
            DateDecodingStrategy::Iso8601,
        );
        let raw: Raw = config.decode(br#"{"vote_count": 3}"#).unwrap();
        assert_eq!(raw.vote_count, 3);
    }

    #[test]
    fn empty_payload_fails_unless_null_is_allowed() {
        let config = DecodingConfiguration::STANDARD;
        assert!(matches!(config.decode::<()>(b""), Err(DecodingError::Json(_))));
        config.decode_or_null::<()>(b"").unwrap();
        assert_eq!(config.decode_or_null::<Option<u32>>(b"  ").unwrap(), None);
        assert_eq!(config.decode_or_null::<Option<u32>>(b"7").unwrap(), Some(7));
    }

    #[test]
    fn named_lookup() {
        assert_eq!(
            DecodingConfiguration::named("fractional"),
            Some(DecodingConfiguration::FRACTIONAL)
        );
        assert_eq!(
            DecodingConfiguration::named("standard"),
            Some(DecodingConfiguration::STANDARD)
        );
        assert_eq!(DecodingConfiguration::named("iso8601"), None);
    }

    #[test]
    fn timestamp_outside_a_configuration_accepts_any_rfc3339() {
        let whole: Timestamp = serde_json::from_str("\"2020-01-01T00:00:00Z\"").unwrap();
        let fractional: Timestamp = serde_json::from_str("\"2020-01-01T00:00:00.5Z\"").unwrap();
        assert!(fractional > whole);
    }

    #[test]
    fn timestamp_serializes_as_rfc3339() {
        let ts = Timestamp(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2021-06-01T00:00:00Z\"");
    }

    #[test]
    fn scope_is_cleared_after_decode() {
        DecodingConfiguration::FRACTIONAL
            .decode::<Title>(FRACTIONAL_PAYLOAD.as_bytes())
            .unwrap();
        // Back to the lenient default outside any configuration.
        let ts: Timestamp = serde_json::from_str("\"2020-01-01T00:00:00Z\"").unwrap();
        assert_eq!(ts.timestamp(), 1_577_836_800);
    }
}
