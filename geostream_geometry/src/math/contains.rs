use crate::geodetic::GeodeticPoint;

/// Even-odd ray-cast containment test.
///
/// Casts a horizontal ray from `p` and counts edge crossings. Points on an edge may land
/// on either side; callers needing exactness should not rely on boundary behavior.
#[must_use]
pub fn point_in_ring(ring: &[GeodeticPoint], p: &GeodeticPoint) -> bool {
	if ring.len() < 3 {
		return false;
	}
	let (x, y) = (p.lon(), p.lat());
	let mut inside = false;
	let mut j = ring.len() - 1;
	for i in 0..ring.len() {
		let (xi, yi) = (ring[i].lon(), ring[i].lat());
		let (xj, yj) = (ring[j].lon(), ring[j].lat());
		if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
			inside = !inside;
		}
		j = i;
	}
	inside
}

#[cfg(test)]
mod tests {
	use super::*;

	fn p(lon: f64, lat: f64) -> GeodeticPoint {
		GeodeticPoint::new(lon, lat).unwrap()
	}

	fn square() -> Vec<GeodeticPoint> {
		vec![p(0.0, 0.0), p(0.0, 4.0), p(4.0, 4.0), p(4.0, 0.0), p(0.0, 0.0)]
	}

	#[test]
	fn inside_and_outside() {
		let ring = square();
		assert!(point_in_ring(&ring, &p(2.0, 2.0)));
		assert!(point_in_ring(&ring, &p(0.5, 3.9)));
		assert!(!point_in_ring(&ring, &p(4.5, 2.0)));
		assert!(!point_in_ring(&ring, &p(-0.5, 2.0)));
		assert!(!point_in_ring(&ring, &p(2.0, 4.5)));
	}

	#[test]
	fn concave_ring() {
		// a "U" shape: the notch between the prongs is outside
		let ring = vec![
			p(0.0, 0.0),
			p(0.0, 4.0),
			p(1.0, 4.0),
			p(1.0, 1.0),
			p(3.0, 1.0),
			p(3.0, 4.0),
			p(4.0, 4.0),
			p(4.0, 0.0),
			p(0.0, 0.0),
		];
		assert!(point_in_ring(&ring, &p(0.5, 2.0)));
		assert!(point_in_ring(&ring, &p(2.0, 0.5)));
		assert!(!point_in_ring(&ring, &p(2.0, 2.0)));
	}

	#[test]
	fn degenerate_ring_contains_nothing() {
		assert!(!point_in_ring(&[], &p(0.0, 0.0)));
		assert!(!point_in_ring(&[p(1.0, 1.0), p(2.0, 2.0)], &p(1.5, 1.5)));
	}
}
