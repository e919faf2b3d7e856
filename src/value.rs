//! Scalar values carried between fixture files and the database.
//!
//! Fixture content is decoded into [`FixtureValue`] once, at parse time, so the
//! insert path binds tagged variants instead of inspecting dynamic data. Query
//! results read back from the database use the same value type via [`Row`].

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static DATETIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}$").expect("DATETIME_SHAPE: invalid regex")
});

static DATE_SHAPE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("DATE_SHAPE: invalid regex"));

static TIME_SHAPE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("TIME_SHAPE: invalid regex"));

/// Scalar value of one fixture column.
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureValue {
	/// SQL NULL.
	Null,
	/// Boolean value.
	Bool(bool),
	/// Integer value.
	Int(i64),
	/// Floating point value.
	Float(f64),
	/// Plain string value.
	String(String),
	/// Calendar date without a time of day.
	Date(NaiveDate),
	/// Time of day without a date.
	Time(NaiveTime),
	/// Combined date and time.
	DateTime(NaiveDateTime),
}

impl FixtureValue {
	/// Classifies a textual scalar, promoting recognizable date and time
	/// shapes to their typed variants.
	///
	/// Recognized shapes are `YYYY-MM-DD`, `HH:MM:SS` and
	/// `YYYY-MM-DD HH:MM:SS` (a `T` separator is also accepted). A string
	/// that merely looks date-shaped but does not parse as a valid calendar
	/// value stays a plain string.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures::FixtureValue;
	/// assert!(matches!(FixtureValue::classify_text("2023-04-01"), FixtureValue::Date(_)));
	/// assert!(matches!(FixtureValue::classify_text("2023-13-01"), FixtureValue::String(_)));
	/// assert!(matches!(FixtureValue::classify_text("alice"), FixtureValue::String(_)));
	/// ```
	pub fn classify_text(text: &str) -> Self {
		if DATETIME_SHAPE.is_match(text) {
			let normalized = text.replacen('T', " ", 1);
			if let Ok(datetime) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S") {
				return Self::DateTime(datetime);
			}
		} else if DATE_SHAPE.is_match(text) {
			if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
				return Self::Date(date);
			}
		} else if TIME_SHAPE.is_match(text) {
			if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S") {
				return Self::Time(time);
			}
		}
		Self::String(text.to_string())
	}

	/// Decodes a YAML scalar; `None` for sequences, mappings and tagged values.
	pub(crate) fn from_yaml_scalar(value: &serde_yaml::Value) -> Option<Self> {
		match value {
			serde_yaml::Value::Null => Some(Self::Null),
			serde_yaml::Value::Bool(b) => Some(Self::Bool(*b)),
			serde_yaml::Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Some(Self::Int(i))
				} else {
					n.as_f64().map(Self::Float)
				}
			}
			serde_yaml::Value::String(s) => Some(Self::classify_text(s)),
			_ => None,
		}
	}

	/// Decodes a JSON scalar; `None` for arrays and objects.
	pub(crate) fn from_json_scalar(value: &serde_json::Value) -> Option<Self> {
		match value {
			serde_json::Value::Null => Some(Self::Null),
			serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
			serde_json::Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Some(Self::Int(i))
				} else {
					n.as_f64().map(Self::Float)
				}
			}
			serde_json::Value::String(s) => Some(Self::classify_text(s)),
			_ => None,
		}
	}
}

impl From<&str> for FixtureValue {
	fn from(s: &str) -> Self {
		FixtureValue::String(s.to_string())
	}
}

impl From<String> for FixtureValue {
	fn from(s: String) -> Self {
		FixtureValue::String(s)
	}
}

impl From<i64> for FixtureValue {
	fn from(i: i64) -> Self {
		FixtureValue::Int(i)
	}
}

impl From<i32> for FixtureValue {
	fn from(i: i32) -> Self {
		FixtureValue::Int(i as i64)
	}
}

impl From<f64> for FixtureValue {
	fn from(f: f64) -> Self {
		FixtureValue::Float(f)
	}
}

impl From<bool> for FixtureValue {
	fn from(b: bool) -> Self {
		FixtureValue::Bool(b)
	}
}

impl From<NaiveDate> for FixtureValue {
	fn from(d: NaiveDate) -> Self {
		FixtureValue::Date(d)
	}
}

impl From<NaiveTime> for FixtureValue {
	fn from(t: NaiveTime) -> Self {
		FixtureValue::Time(t)
	}
}

impl From<NaiveDateTime> for FixtureValue {
	fn from(dt: NaiveDateTime) -> Self {
		FixtureValue::DateTime(dt)
	}
}

/// Row of a query result, keyed by column name.
///
/// Dialects read introspection results through this type; the SQL they issue
/// aliases every selected column so lookups are stable across drivers.
#[derive(Debug, Clone, Default)]
pub struct Row {
	data: HashMap<String, FixtureValue>,
}

impl Row {
	/// Creates an empty row.
	pub fn new() -> Self {
		Self {
			data: HashMap::new(),
		}
	}

	/// Sets a column value.
	pub fn insert(&mut self, column: String, value: FixtureValue) {
		self.data.insert(column, value);
	}

	/// Returns the raw value of a column, if present.
	pub fn get(&self, column: &str) -> Option<&FixtureValue> {
		self.data.get(column)
	}

	/// Returns a column as a string, if present and textual.
	pub fn get_string(&self, column: &str) -> Option<String> {
		match self.data.get(column) {
			Some(FixtureValue::String(s)) => Some(s.clone()),
			_ => None,
		}
	}

	/// Returns a column as an integer, if present and integral.
	pub fn get_i64(&self, column: &str) -> Option<i64> {
		match self.data.get(column) {
			Some(FixtureValue::Int(i)) => Some(*i),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("2023-04-01")]
	#[case("1999-12-31")]
	fn test_classify_date(#[case] text: &str) {
		assert!(matches!(
			FixtureValue::classify_text(text),
			FixtureValue::Date(_)
		));
	}

	#[rstest]
	#[case("12:30:45")]
	#[case("00:00:00")]
	fn test_classify_time(#[case] text: &str) {
		assert!(matches!(
			FixtureValue::classify_text(text),
			FixtureValue::Time(_)
		));
	}

	#[rstest]
	#[case("2023-04-01 12:30:45")]
	#[case("2023-04-01T12:30:45")]
	fn test_classify_datetime(#[case] text: &str) {
		assert!(matches!(
			FixtureValue::classify_text(text),
			FixtureValue::DateTime(_)
		));
	}

	#[rstest]
	#[case("alice")]
	#[case("")]
	#[case("2023-04")]
	#[case("note 2023-04-01")]
	fn test_classify_plain_string(#[case] text: &str) {
		assert!(matches!(
			FixtureValue::classify_text(text),
			FixtureValue::String(_)
		));
	}

	#[rstest]
	#[case("2023-13-01")]
	#[case("2023-02-30")]
	#[case("25:00:00")]
	#[case("2023-04-01 99:00:00")]
	fn test_invalid_calendar_values_stay_strings(#[case] text: &str) {
		assert!(matches!(
			FixtureValue::classify_text(text),
			FixtureValue::String(_)
		));
	}

	#[rstest]
	fn test_datetime_t_separator_normalized() {
		let spaced = FixtureValue::classify_text("2023-04-01 12:30:45");
		let tagged = FixtureValue::classify_text("2023-04-01T12:30:45");
		assert_eq!(spaced, tagged);
	}

	#[rstest]
	fn test_yaml_scalars() {
		let yaml: serde_yaml::Value = serde_yaml::from_str("42").unwrap();
		assert_eq!(
			FixtureValue::from_yaml_scalar(&yaml),
			Some(FixtureValue::Int(42))
		);

		let yaml: serde_yaml::Value = serde_yaml::from_str("3.5").unwrap();
		assert_eq!(
			FixtureValue::from_yaml_scalar(&yaml),
			Some(FixtureValue::Float(3.5))
		);

		let yaml: serde_yaml::Value = serde_yaml::from_str("null").unwrap();
		assert_eq!(
			FixtureValue::from_yaml_scalar(&yaml),
			Some(FixtureValue::Null)
		);

		let yaml: serde_yaml::Value = serde_yaml::from_str("[1, 2]").unwrap();
		assert_eq!(FixtureValue::from_yaml_scalar(&yaml), None);
	}

	#[rstest]
	fn test_json_scalars() {
		let json: serde_json::Value = serde_json::from_str("\"2023-04-01\"").unwrap();
		assert!(matches!(
			FixtureValue::from_json_scalar(&json),
			Some(FixtureValue::Date(_))
		));

		let json: serde_json::Value = serde_json::from_str("true").unwrap();
		assert_eq!(
			FixtureValue::from_json_scalar(&json),
			Some(FixtureValue::Bool(true))
		);

		let json: serde_json::Value = serde_json::from_str("{\"nested\": 1}").unwrap();
		assert_eq!(FixtureValue::from_json_scalar(&json), None);
	}

	#[rstest]
	fn test_row_typed_accessors() {
		let mut row = Row::new();
		row.insert("database_name".to_string(), "app_test".into());
		row.insert("identity_columns".to_string(), 2i64.into());

		assert_eq!(row.get_string("database_name").as_deref(), Some("app_test"));
		assert_eq!(row.get_i64("identity_columns"), Some(2));
		assert_eq!(row.get_string("identity_columns"), None);
		assert_eq!(row.get_i64("missing"), None);
		assert!(row.get("database_name").is_some());
	}
}
