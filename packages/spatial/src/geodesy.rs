//! Great-circle geometry helpers.
//!
//! Distances travel through two representations: kilometres along the
//! surface and central angles in degrees. The grid and query regions are
//! angular; the public search API takes kilometres.

use geo::Point;

/// IUGG mean earth radius in kilometres.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6_371.008_771_415_06;

/// Converts a surface distance in kilometres to a central angle in degrees.
///
/// Pure conversion with no validation; callers pass a positive radius.
#[must_use]
pub fn distance_to_degrees(distance_km: f64, earth_radius_km: f64) -> f64 {
    (distance_km / earth_radius_km).to_degrees()
}

/// Converts a central angle in degrees back to a surface distance in
/// kilometres.
#[must_use]
pub fn degrees_to_distance(degrees: f64, earth_radius_km: f64) -> f64 {
    degrees.to_radians() * earth_radius_km
}

/// Haversine central angle between two lon/lat points, in degrees.
///
/// `sin²(Δλ/2)` is periodic, so the shorter arc is measured even when the
/// two points sit on opposite sides of the antimeridian.
#[must_use]
pub fn arc_degrees(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat_a = a.y().to_radians();
    let lat_b = b.y().to_radians();
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_round_trips() {
        let degrees = distance_to_degrees(1000.0, EARTH_MEAN_RADIUS_KM);
        let km = degrees_to_distance(degrees, EARTH_MEAN_RADIUS_KM);
        assert!((km - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn one_degree_is_about_111_km() {
        let km = degrees_to_distance(1.0, EARTH_MEAN_RADIUS_KM);
        assert!((km - 111.195).abs() < 0.01);
    }

    #[test]
    fn arc_between_identical_points_is_zero() {
        let p = Point::new(13.3833, 52.5167);
        assert!(arc_degrees(p, p).abs() < 1e-12);
    }

    #[test]
    fn berlin_to_frankfurt_is_about_422_km() {
        let berlin = Point::new(13.3833, 52.5167);
        let frankfurt = Point::new(8.6833, 50.1167);
        let km = degrees_to_distance(arc_degrees(berlin, frankfurt), EARTH_MEAN_RADIUS_KM);
        assert!((km - 422.0).abs() < 5.0, "got {km}");
    }

    #[test]
    fn arc_wraps_across_the_antimeridian() {
        let east = Point::new(179.5, 0.0);
        let west = Point::new(-179.5, 0.0);
        assert!((arc_degrees(east, west) - 1.0).abs() < 1e-9);
    }
}
