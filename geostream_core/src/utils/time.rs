//! KML timestamp parsing and formatting.
//!
//! Accepts the XML Schema lexical forms `yyyy`, `yyyy-MM`, `yyyy-MM-dd` and
//! `yyyy-MM-dd'T'HH:mm[:ss[.SSS]][Z|±HH:MM]`. Google Earth is laxer than the schema, so a
//! missing seconds field or a missing `Z` suffix is tolerated; a missing zone means UTC.
//! Non-dateTime forms zero the time of day.

use anyhow::{Context, Result, bail, ensure};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// Parses a KML `dateTimeType` lexical value into a UTC timestamp.
///
/// # Errors
/// Returns an error for an empty value or one matching none of the accepted forms.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	let v = value.trim();
	ensure!(!v.is_empty(), "empty timestamp");

	if v.contains('T') {
		// full dateTime; explicit offsets are converted to UTC
		if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
			return Ok(dt.with_timezone(&Utc));
		}
		// sloppy forms: trailing Z optional, seconds optional
		let naive = v.strip_suffix('Z').unwrap_or(v);
		for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
			if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
				return Ok(dt.and_utc());
			}
		}
		bail!("invalid dateTime value '{value}'");
	}

	lazy_static! {
		static ref REG_YEAR: Regex = Regex::new(r"^\d{4}$").unwrap();
		static ref REG_YEAR_MONTH: Regex = Regex::new(r"^\d{4}-\d{2}$").unwrap();
	}
	let date = if REG_YEAR.is_match(v) {
		format!("{v}-01-01")
	} else if REG_YEAR_MONTH.is_match(v) {
		format!("{v}-01")
	} else {
		v.to_string()
	};
	let d = NaiveDate::parse_from_str(&date, "%Y-%m-%d").with_context(|| format!("invalid date value '{value}'"))?;
	Ok(d.and_time(NaiveTime::MIN).and_utc())
}

/// Formats a timestamp in the canonical KML form, with milliseconds only when non-zero.
#[must_use]
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
	if value.nanosecond() == 0 {
		value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
	} else {
		value.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("1997", "1997-01-01T00:00:00Z")]
	#[case("1997-07", "1997-07-01T00:00:00Z")]
	#[case("1997-07-16", "1997-07-16T00:00:00Z")]
	#[case("1997-07-16T07:30:15Z", "1997-07-16T07:30:15Z")]
	#[case("1997-07-16T07:30:15.30Z", "1997-07-16T07:30:15.300Z")]
	#[case("1997-07-16T10:30:15+03:00", "1997-07-16T07:30:15Z")]
	#[case("1997-07-16T05:30:15-05:00", "1997-07-16T10:30:15Z")]
	#[case("2009-03-14T21:10:50", "2009-03-14T21:10:50Z")] // missing Z means UTC
	#[case("2009-03-14T18:10", "2009-03-14T18:10:00Z")] // missing seconds tolerated
	#[case("2009-03-14T18:10Z", "2009-03-14T18:10:00Z")]
	#[case(" 2009-03-14 ", "2009-03-14T00:00:00Z")]
	fn accepted_forms(#[case] input: &str, #[case] expected: &str) {
		let parsed = parse_timestamp(input).unwrap();
		assert_eq!(format_timestamp(&parsed), expected);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case("not-a-date")]
	#[case("1997-13-01")]
	#[case("07-16-1997")]
	#[case("2009-03-14T25:00:00Z")]
	fn rejected_forms(#[case] input: &str) {
		assert!(parse_timestamp(input).is_err());
	}

	#[test]
	fn format_round_trip() {
		let dt = parse_timestamp("2011-06-01T12:34:56Z").unwrap();
		assert_eq!(parse_timestamp(&format_timestamp(&dt)).unwrap(), dt);
	}
}
