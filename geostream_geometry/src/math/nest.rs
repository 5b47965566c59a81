use crate::geometry::{LinearRing, Polygon};
use log::warn;

/// Reconstructs nested polygons from a flat, ordered ring list.
///
/// Clockwise rings open a new polygon in encounter order. Each counter-clockwise ring is
/// attached to the first already-open polygon whose outer ring contains the ring's first
/// vertex; rings that match nothing are retried against all polygons after the walk. A
/// ring that still matches nothing is promoted to its own polygon with reversed winding,
/// a best-effort recovery for malformed input (logged).
#[must_use]
pub fn nest(rings: Vec<LinearRing>) -> Vec<Polygon> {
	let mut polygons: Vec<Polygon> = Vec::new();
	let mut deferred: Vec<LinearRing> = Vec::new();

	for ring in rings {
		if ring.is_clockwise() {
			polygons.push(Polygon::new(ring));
		} else if !attach_inner(&mut polygons, &ring) {
			deferred.push(ring);
		}
	}

	for ring in deferred {
		if !attach_inner(&mut polygons, &ring) {
			warn!("inner ring is contained by no outer ring, promoting to standalone polygon");
			polygons.push(Polygon::new(ring.reversed()));
		}
	}

	polygons
}

fn attach_inner(polygons: &mut [Polygon], ring: &LinearRing) -> bool {
	let Some(first) = ring.points().first() else {
		return false;
	};
	for polygon in polygons.iter_mut() {
		if polygon.outer_ring().contains(first) {
			polygon.add_inner_ring(ring.clone());
			return true;
		}
	}
	false
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geodetic::GeodeticPoint;

	fn p(lon: f64, lat: f64) -> GeodeticPoint {
		GeodeticPoint::new(lon, lat).unwrap()
	}

	fn ring_cw(w: f64, s: f64, e: f64, n: f64) -> LinearRing {
		LinearRing::new(vec![p(w, s), p(w, n), p(e, n), p(e, s), p(w, s)]).unwrap()
	}

	fn ring_ccw(w: f64, s: f64, e: f64, n: f64) -> LinearRing {
		ring_cw(w, s, e, n).reversed()
	}

	#[test]
	fn outer_with_hole() {
		let polygons = nest(vec![ring_cw(0.0, 0.0, 10.0, 10.0), ring_ccw(2.0, 2.0, 4.0, 4.0)]);
		assert_eq!(polygons.len(), 1);
		assert_eq!(polygons[0].inner_rings().len(), 1);
	}

	#[test]
	fn two_separate_outers() {
		let polygons = nest(vec![ring_cw(0.0, 0.0, 4.0, 4.0), ring_cw(10.0, 0.0, 14.0, 4.0)]);
		assert_eq!(polygons.len(), 2);
		assert!(polygons.iter().all(|poly| poly.inner_rings().is_empty()));
	}

	#[test]
	fn inner_before_its_outer_is_deferred_and_recovered() {
		let polygons = nest(vec![ring_ccw(2.0, 2.0, 4.0, 4.0), ring_cw(0.0, 0.0, 10.0, 10.0)]);
		assert_eq!(polygons.len(), 1);
		assert_eq!(polygons[0].inner_rings().len(), 1);
	}

	#[test]
	fn hole_attaches_to_first_containing_outer() {
		// both outers contain the hole bounds; the first one wins
		let polygons = nest(vec![
			ring_cw(0.0, 0.0, 10.0, 10.0),
			ring_cw(-20.0, -20.0, 20.0, 20.0),
			ring_ccw(2.0, 2.0, 4.0, 4.0),
		]);
		assert_eq!(polygons.len(), 2);
		assert_eq!(polygons[0].inner_rings().len(), 1);
		assert!(polygons[1].inner_rings().is_empty());
	}

	#[test]
	fn orphan_inner_becomes_reversed_polygon() {
		let polygons = nest(vec![ring_cw(0.0, 0.0, 4.0, 4.0), ring_ccw(20.0, 20.0, 24.0, 24.0)]);
		assert_eq!(polygons.len(), 2);
		assert!(polygons[1].inner_rings().is_empty());
		assert!(polygons[1].outer_ring().is_clockwise());
	}

	#[test]
	fn empty_input() {
		assert!(nest(vec![]).is_empty());
	}
}
