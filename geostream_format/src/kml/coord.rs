//! The permissive `<coordinates>` tokenizer.
//!
//! Matches the loose parsing of Google Earth: whitespace separates tuples and commas
//! separate components, but commas between tuples are recovered (`1,2,3,4,5,6` parses as
//! two 3D tuples), a missing leading component defaults to 0 degrees, and junk tokens or
//! out-of-range coordinates poison only the tuple they appear in.

use geostream_geometry::{GeodeticPoint, Latitude, Longitude};
use log::warn;

enum Token<'a> {
	Number(f64),
	Word(&'a str),
	Comma,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
	let mut tokens = Vec::new();
	let mut rest = text;
	loop {
		rest = rest.trim_start_matches(|c: char| c.is_whitespace());
		if rest.is_empty() {
			break;
		}
		if let Some(r) = rest.strip_prefix(',') {
			tokens.push(Token::Comma);
			rest = r;
			continue;
		}
		let end = rest
			.find(|c: char| c.is_whitespace() || c == ',')
			.unwrap_or(rest.len());
		let (word, r) = rest.split_at(end);
		tokens.push(word.parse::<f64>().map_or(Token::Word(word), Token::Number));
		rest = r;
	}
	tokens
}

/// Parses a KML coordinate string into points. Tuples are `lon[,lat[,alt]]`; invalid
/// input is logged and dropped without aborting the parse. Never fails; an unusable
/// string yields an empty list.
#[must_use]
pub fn parse_coord(text: &str) -> Vec<GeodeticPoint> {
	let mut list = Vec::new();
	let mut seen_comma = false;
	let mut numparts = 0u8;
	let mut lon = Longitude::default();
	let mut lat = Latitude::default();
	let mut elev = 0.0;
	let mut tuple_poisoned = false;

	for token in tokenize(text) {
		match token {
			Token::Word(w) => {
				warn!("ignore invalid string in coordinate: \"{w}\"");
			}
			Token::Number(n) => {
				if numparts == 3 {
					if seen_comma {
						warn!("comma found instead of whitespace between tuples before {n}");
						seen_comma = false;
					}
					if !tuple_poisoned {
						list.push(GeodeticPoint::from_angles(lon, lat, Some(elev)));
					}
					numparts = 0;
				}
				numparts += 1;
				match numparts {
					1 => {
						if seen_comma {
							// a leading comma skipped the longitude
							lat = parse_lat(n, &mut tuple_poisoned);
							lon = Longitude::default();
							numparts = 2;
						} else {
							lon = parse_lon(n, &mut tuple_poisoned);
						}
					}
					2 => {
						if seen_comma {
							lat = parse_lat(n, &mut tuple_poisoned);
						} else {
							// whitespace after a bare longitude ends the tuple
							if !tuple_poisoned {
								list.push(GeodeticPoint::from_angles(lon, Latitude::default(), None));
							}
							lon = parse_lon(n, &mut tuple_poisoned);
							numparts = 1;
						}
					}
					_ => {
						if seen_comma {
							elev = n;
						} else {
							if !tuple_poisoned {
								list.push(GeodeticPoint::from_angles(lon, lat, None));
							}
							lon = parse_lon(n, &mut tuple_poisoned);
							numparts = 1;
						}
					}
				}
				seen_comma = false;
			}
			Token::Comma => {
				if !seen_comma {
					seen_comma = true;
					if numparts == 0 {
						lon = Longitude::default(); // skipped longitude, use 0 degrees
						tuple_poisoned = false;
						numparts = 1;
					}
				} else if numparts == 1 {
					lat = Latitude::default(); // skipped latitude, use 0 degrees
					numparts = 2;
				}
			}
		}
	}

	if numparts != 0 && !tuple_poisoned {
		match numparts {
			1 => list.push(GeodeticPoint::from_angles(lon, Latitude::default(), None)),
			2 => list.push(GeodeticPoint::from_angles(lon, lat, None)),
			_ => list.push(GeodeticPoint::from_angles(lon, lat, Some(elev))),
		}
	}

	list
}

fn parse_lon(value: f64, poisoned: &mut bool) -> Longitude {
	match Longitude::new(value) {
		Ok(v) => {
			*poisoned = false;
			v
		}
		Err(e) => {
			warn!("invalid coordinate: {e}");
			*poisoned = true;
			Longitude::default()
		}
	}
}

fn parse_lat(value: f64, poisoned: &mut bool) -> Latitude {
	match Latitude::new(value) {
		Ok(v) => v,
		Err(e) => {
			warn!("invalid coordinate: {e}");
			*poisoned = true;
			Latitude::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn coords(text: &str) -> Vec<(f64, f64, Option<f64>)> {
		parse_coord(text)
			.into_iter()
			.map(|p| (p.lon(), p.lat(), p.elevation))
			.collect()
	}

	#[test]
	fn single_tuple() {
		assert_eq!(coords("10,20,30"), vec![(10.0, 20.0, Some(30.0))]);
		assert_eq!(coords("10,20"), vec![(10.0, 20.0, None)]);
		assert_eq!(coords("10"), vec![(10.0, 0.0, None)]);
	}

	#[test]
	fn whitespace_separated_tuples() {
		assert_eq!(
			coords("0,0 1,0 1,1"),
			vec![(0.0, 0.0, None), (1.0, 0.0, None), (1.0, 1.0, None)]
		);
		assert_eq!(
			coords("  -121.9921875, 37.265625  "),
			vec![(-121.9921875, 37.265625, None)]
		);
	}

	#[test]
	fn commas_between_tuples_are_recovered() {
		assert_eq!(
			coords("1,2,3,4,5,6"),
			vec![(1.0, 2.0, Some(3.0)), (4.0, 5.0, Some(6.0))]
		);
	}

	#[test]
	fn skipped_leading_components_default_to_zero() {
		assert_eq!(coords(",20"), vec![(0.0, 20.0, None)]);
		assert_eq!(coords(",,30"), vec![(0.0, 0.0, Some(30.0))]);
	}

	#[test]
	fn out_of_range_tuple_is_dropped() {
		assert_eq!(coords("181,5 10,20"), vec![(10.0, 20.0, None)]);
		assert_eq!(coords("10,95 1,2"), vec![(1.0, 2.0, None)]);
	}

	#[test]
	fn junk_tokens_are_ignored() {
		assert_eq!(coords("abc 10,20"), vec![(10.0, 20.0, None)]);
		assert_eq!(coords(""), Vec::<(f64, f64, Option<f64>)>::new());
		assert_eq!(coords("   \n\t  "), Vec::<(f64, f64, Option<f64>)>::new());
	}

	#[rstest]
	#[case("1.5,2.5,3.5", vec![(1.5, 2.5, Some(3.5))])]
	#[case("10,20,30 40,50,60 70,80,90", vec![(10.0, 20.0, Some(30.0)), (40.0, 50.0, Some(60.0)), (70.0, 80.0, Some(90.0))])]
	#[case("0,0,0", vec![(0.0, 0.0, Some(0.0))])]
	#[case("-180,-90 180,90", vec![(-180.0, -90.0, None), (180.0, 90.0, None)])]
	fn tuples(#[case] text: &str, #[case] expected: Vec<(f64, f64, Option<f64>)>) {
		assert_eq!(coords(text), expected);
	}
}
