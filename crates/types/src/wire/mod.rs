//! Wire boundary helpers
//!
//! The remote service stores timestamps as strings (some written by older
//! import tooling in US-style formats) and stores nested collections as JSON
//! encoded strings. These helpers convert both directions deterministically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

/// Two-digit years at or below this pivot are read as 20xx, above as 19xx
const TWO_DIGIT_YEAR_PIVOT: i32 = 30;

/// Errors raised while mapping wire records to domain entities
#[derive(Error, Debug)]
pub enum MappingError {
	#[error("Missing required field: {field}")]
	MissingField { field: String },

	#[error("Invalid timestamp in {field}: {value}")]
	InvalidTimestamp { field: String, value: String },

	#[error("Invalid serialized collection in {field}: {reason}")]
	InvalidCollection { field: String, reason: String },

	#[error("Invalid value for {field}: {value}")]
	InvalidValue { field: String, value: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl MappingError {
	pub fn missing(field: &str) -> Self {
		Self::MissingField {
			field: field.to_string(),
		}
	}
}

/// Parse a wire timestamp in any of the accepted formats
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-M-D H:M:S`, `YYYY-MM-DD`,
/// `MM/DD/YYYY`, `MM/DD/YY`, `MM-DD-YYYY` and `MM-DD-YY`. Values without an
/// offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
	let value = value.trim();
	if value.is_empty() {
		return None;
	}

	if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
		return Some(parsed.with_timezone(&Utc));
	}

	for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
		if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
			return Some(Utc.from_utc_datetime(&naive));
		}
	}

	if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
		return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
	}

	parse_us_date(value)
}

/// `MM/DD/YY[YY]` or `MM-DD-YY[YY]`
fn parse_us_date(value: &str) -> Option<DateTime<Utc>> {
	let separator = if value.contains('/') { '/' } else { '-' };
	let parts: Vec<&str> = value.split(separator).collect();
	if parts.len() != 3 || parts[0].len() > 2 || parts[1].len() > 2 {
		return None;
	}

	let month: u32 = parts[0].parse().ok()?;
	let day: u32 = parts[1].parse().ok()?;
	let year = match parts[2].len() {
		2 => {
			let short: i32 = parts[2].parse().ok()?;
			if short <= TWO_DIGIT_YEAR_PIVOT {
				2000 + short
			} else {
				1900 + short
			}
		},
		4 => parts[2].parse().ok()?,
		_ => return None,
	};

	NaiveDate::from_ymd_opt(year, month, day)
		.and_then(|date| date.and_hms_opt(0, 0, 0))
		.map(|naive| Utc.from_utc_datetime(&naive))
}

/// Required timestamp; absence or garbage is a mapping error
pub fn required_timestamp(
	field: &str,
	value: Option<&str>,
) -> Result<DateTime<Utc>, MappingError> {
	let raw = value.ok_or_else(|| MappingError::missing(field))?;
	parse_timestamp(raw).ok_or_else(|| MappingError::InvalidTimestamp {
		field: field.to_string(),
		value: raw.to_string(),
	})
}

/// Optional timestamp; unparseable values are dropped
pub fn optional_timestamp(field: &str, value: Option<&str>) -> Option<DateTime<Utc>> {
	let raw = value?;
	let parsed = parse_timestamp(raw);
	if parsed.is_none() && !raw.trim().is_empty() {
		debug!("Dropping unparseable {} value '{}'", field, raw);
	}
	parsed
}

/// Decode a JSON-encoded collection string into its structured form
///
/// Absent or blank values decode to an empty collection.
pub fn decode_collection<T: DeserializeOwned>(
	field: &str,
	value: Option<&str>,
) -> Result<Vec<T>, MappingError> {
	match value.map(str::trim) {
		None | Some("") | Some("null") => Ok(Vec::new()),
		Some(raw) => serde_json::from_str(raw).map_err(|e| MappingError::InvalidCollection {
			field: field.to_string(),
			reason: e.to_string(),
		}),
	}
}

/// `serialize_with` helper writing a collection as a JSON string
pub fn encode_collection<S, T>(items: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let encoded = serde_json::to_string(items).map_err(serde::ser::Error::custom)?;
	serializer.serialize_str(&encoded)
}

/// `serialize_with` helper for optional collections on partial updates
pub fn encode_optional_collection<S, T>(
	items: &Option<Vec<T>>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	match items {
		Some(items) => encode_collection(items, serializer),
		None => serializer.serialize_none(),
	}
}

/// Serialize a value into a JSON object, failing for non-object shapes
pub fn to_object<T: Serialize>(
	value: &T,
) -> Result<serde_json::Map<String, serde_json::Value>, MappingError> {
	match serde_json::to_value(value)? {
		serde_json::Value::Object(map) => Ok(map),
		other => Err(MappingError::InvalidValue {
			field: "input".to_string(),
			value: other.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Datelike, Timelike};
	use serde::Deserialize;

	#[test]
	fn test_parse_rfc3339_and_iso_variants() {
		let ts = parse_timestamp("2025-03-04T10:15:30Z").unwrap();
		assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2025, 3, 4, 10));

		let ts = parse_timestamp("2025-03-04T10:15:30-07:00").unwrap();
		assert_eq!(ts.hour(), 17);

		let ts = parse_timestamp("2025-03-04T10:15:30.250").unwrap();
		assert_eq!(ts.minute(), 15);

		let ts = parse_timestamp("2025-03-04").unwrap();
		assert_eq!((ts.day(), ts.hour()), (4, 0));
	}

	#[test]
	fn test_parse_legacy_formats() {
		let ts = parse_timestamp("2024-1-5 8:05:00").unwrap();
		assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 1, 5, 8));

		let ts = parse_timestamp("03/15/2023").unwrap();
		assert_eq!((ts.year(), ts.month(), ts.day()), (2023, 3, 15));

		let ts = parse_timestamp("7-4-2022").unwrap();
		assert_eq!((ts.year(), ts.month(), ts.day()), (2022, 7, 4));
	}

	#[test]
	fn test_two_digit_year_pivot() {
		assert_eq!(parse_timestamp("01/02/30").unwrap().year(), 2030);
		assert_eq!(parse_timestamp("01/02/31").unwrap().year(), 1931);
		assert_eq!(parse_timestamp("12-31-99").unwrap().year(), 1999);
	}

	#[test]
	fn test_rejects_garbage() {
		assert!(parse_timestamp("").is_none());
		assert!(parse_timestamp("next tuesday").is_none());
		assert!(parse_timestamp("13/45/2020").is_none());
		assert!(optional_timestamp("visitDate", Some("soon")).is_none());
		assert!(matches!(
			required_timestamp("createdAt", Some("soon")),
			Err(MappingError::InvalidTimestamp { .. })
		));
		assert!(matches!(
			required_timestamp("createdAt", None),
			Err(MappingError::MissingField { .. })
		));
	}

	#[derive(Debug, Deserialize, Serialize, PartialEq)]
	struct Item {
		name: String,
	}

	#[derive(Serialize)]
	struct Holder {
		#[serde(serialize_with = "encode_collection")]
		items: Vec<Item>,
	}

	#[test]
	fn test_collection_encoding_boundary() {
		let holder = Holder {
			items: vec![Item {
				name: "photo.jpg".to_string(),
			}],
		};
		let value = serde_json::to_value(&holder).unwrap();
		let encoded = value["items"].as_str().unwrap();
		assert_eq!(encoded, r#"[{"name":"photo.jpg"}]"#);

		let decoded: Vec<Item> = decode_collection("items", Some(encoded)).unwrap();
		assert_eq!(decoded, holder.items);

		let empty: Vec<Item> = decode_collection("items", None).unwrap();
		assert!(empty.is_empty());
		assert!(decode_collection::<Item>("items", Some("{oops")).is_err());
	}
}
