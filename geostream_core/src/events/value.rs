//! Typed attribute values for feature and row fields.

use super::FieldType;
use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Debug, Display};

/// A single attribute value, typed per its [`super::SimpleField`].
#[derive(Clone, PartialEq)]
pub enum FieldValue {
	Bool(bool),
	Date(DateTime<Utc>),
	Double(f64),
	Long(i64),
	Null,
	String(String),
}

impl FieldValue {
	/// Parses a lexical value according to the declared field type.
	///
	/// Values that do not parse as the declared type fall back to `String`; an empty
	/// string becomes `Null` for non-string types.
	#[must_use]
	pub fn parse_typed(field_type: FieldType, value: &str) -> Self {
		let trimmed = value.trim();
		if trimmed.is_empty() && field_type != FieldType::String {
			return FieldValue::Null;
		}
		match field_type {
			FieldType::String => FieldValue::String(value.to_string()),
			FieldType::Int | FieldType::Short | FieldType::Long | FieldType::Oid => trimmed
				.parse::<i64>()
				.map_or_else(|_| FieldValue::String(value.to_string()), FieldValue::Long),
			FieldType::Float | FieldType::Double => trimmed
				.parse::<f64>()
				.map_or_else(|_| FieldValue::String(value.to_string()), FieldValue::Double),
			FieldType::Bool => match trimmed {
				"1" | "true" | "True" | "TRUE" => FieldValue::Bool(true),
				"0" | "false" | "False" | "FALSE" => FieldValue::Bool(false),
				_ => FieldValue::String(value.to_string()),
			},
			FieldType::Date => crate::utils::time::parse_timestamp(trimmed)
				.map_or_else(|_| FieldValue::String(value.to_string()), FieldValue::Date),
			FieldType::Geometry => FieldValue::String(value.to_string()),
		}
	}

	/// Sniffs the type of an untyped lexical value (bool, integer, double or string).
	#[must_use]
	pub fn sniff(value: &str) -> Self {
		lazy_static! {
			static ref REG_LONG: Regex = Regex::new(r"^-?(?:0|[1-9]\d*)$").unwrap();
			static ref REG_DOUBLE: Regex =
				Regex::new(r"^-?(?:0|[1-9]\d*)(?:(?:\.\d+)(?:[eE][+-]?\d+)?|[eE][+-]?\d+)$").unwrap();
		}
		match value {
			"" => FieldValue::String(String::new()),
			"true" => FieldValue::Bool(true),
			"false" => FieldValue::Bool(false),
			_ => {
				if REG_LONG.is_match(value) {
					FieldValue::Long(value.parse().unwrap())
				} else if REG_DOUBLE.is_match(value) {
					FieldValue::Double(value.parse().unwrap())
				} else {
					FieldValue::String(value.to_string())
				}
			}
		}
	}

	/// Parses a dBase `YYYYMMDD` date field.
	#[must_use]
	pub fn parse_dbase_date(value: &str) -> Self {
		NaiveDate::parse_from_str(value.trim(), "%Y%m%d")
			.ok()
			.and_then(|d| d.and_hms_opt(0, 0, 0))
			.map_or(FieldValue::Null, |dt| FieldValue::Date(dt.and_utc()))
	}
}

impl Display for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Bool(v) => write!(f, "{v}"),
			FieldValue::Date(v) => write!(f, "{}", crate::utils::time::format_timestamp(v)),
			FieldValue::Double(v) => write!(f, "{v}"),
			FieldValue::Long(v) => write!(f, "{v}"),
			FieldValue::Null => Ok(()),
			FieldValue::String(v) => write!(f, "{v}"),
		}
	}
}

impl Debug for FieldValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
			FieldValue::Date(v) => f.debug_tuple("Date").field(v).finish(),
			FieldValue::Double(v) => f.debug_tuple("Double").field(v).finish(),
			FieldValue::Long(v) => f.debug_tuple("Long").field(v).finish(),
			FieldValue::Null => f.debug_tuple("Null").finish(),
			FieldValue::String(v) => f.debug_tuple("String").field(v).finish(),
		}
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::String(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::String(value)
	}
}

impl From<f64> for FieldValue {
	fn from(value: f64) -> Self {
		FieldValue::Double(value)
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		FieldValue::Long(value)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Bool(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(FieldType::String, "hello", FieldValue::String("hello".to_string()))]
	#[case(FieldType::Long, "42", FieldValue::Long(42))]
	#[case(FieldType::Int, "-7", FieldValue::Long(-7))]
	#[case(FieldType::Double, "2.5", FieldValue::Double(2.5))]
	#[case(FieldType::Bool, "true", FieldValue::Bool(true))]
	#[case(FieldType::Bool, "0", FieldValue::Bool(false))]
	#[case(FieldType::Long, "", FieldValue::Null)]
	#[case(FieldType::Long, "abc", FieldValue::String("abc".to_string()))]
	fn parse_typed(#[case] t: FieldType, #[case] text: &str, #[case] expected: FieldValue) {
		assert_eq!(FieldValue::parse_typed(t, text), expected);
	}

	#[rstest]
	#[case("true", FieldValue::Bool(true))]
	#[case("42", FieldValue::Long(42))]
	#[case("-42", FieldValue::Long(-42))]
	#[case("2.5", FieldValue::Double(2.5))]
	#[case("1.5e10", FieldValue::Double(1.5e10))]
	#[case("042", FieldValue::String("042".to_string()))]
	#[case("1.2.3", FieldValue::String("1.2.3".to_string()))]
	#[case("", FieldValue::String(String::new()))]
	fn sniff(#[case] text: &str, #[case] expected: FieldValue) {
		assert_eq!(FieldValue::sniff(text), expected);
	}

	#[test]
	fn dbase_date() {
		match FieldValue::parse_dbase_date("20090314") {
			FieldValue::Date(d) => assert_eq!(d.to_rfc3339(), "2009-03-14T00:00:00+00:00"),
			other => panic!("expected a date, got {other:?}"),
		}
		assert_eq!(FieldValue::parse_dbase_date("        "), FieldValue::Null);
	}
}
