//! Minimal WKT inspection of `.prj` sidecar files.

/// Extracts the datum name of the first `GEOGCS` entry, i.e. the first quoted string
/// after `GEOGCS[`. Returns `None` when the text contains no such entry.
#[must_use]
pub fn geogcs_datum(wkt: &str) -> Option<String> {
	let start = wkt.find("GEOGCS[")? + "GEOGCS[".len();
	let rest = &wkt[start..];
	let open = rest.find('"')? + 1;
	let close = rest[open..].find('"')? + open;
	Some(rest[open..close].to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	const WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

	#[test]
	fn extracts_datum() {
		assert_eq!(geogcs_datum(WGS84).as_deref(), Some("GCS_WGS_1984"));
	}

	#[test]
	fn projected_crs_with_nested_geogcs() {
		let wkt = r#"PROJCS["WGS_1984_UTM_Zone_31N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984"]]]"#;
		assert_eq!(geogcs_datum(wkt).as_deref(), Some("GCS_WGS_1984"));
	}

	#[test]
	fn missing_geogcs() {
		assert_eq!(geogcs_datum("LOCAL_CS[\"x\"]"), None);
		assert_eq!(geogcs_datum(""), None);
	}
}
