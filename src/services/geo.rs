//! Great-circle distance on a spherical Earth

use crate::domain::types::GeoPoint;

/// Mean Earth radius used for all distance computations (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters.
///
/// Identical points give exactly 0. The haversine term is clamped to [0, 1]
/// so rounding near antipodal points cannot produce NaN.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identical_points_zero() {
        let p = GeoPoint::new(48.8566, 2.3522);
        assert_eq!(haversine_m(p, p), 0.0);

        let pole = GeoPoint::new(90.0, 0.0);
        assert_eq!(haversine_m(pole, pole), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let paris = GeoPoint::new(48.8566, 2.3522);
        let versailles = GeoPoint::new(48.8049, 2.1204);
        assert_eq!(haversine_m(paris, versailles), haversine_m(versailles, paris));
    }

    #[test]
    fn test_paris_to_versailles() {
        let paris = GeoPoint::new(48.8566, 2.3522);
        let versailles = GeoPoint::new(48.8049, 2.1204);
        let d = haversine_m(paris, versailles);
        // ~17.9 km between the city centers
        assert!((17_000.0..18_500.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        let expected = EARTH_RADIUS_M * PI / 180.0;
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!(!d.is_nan());
        assert!((d - EARTH_RADIUS_M * PI).abs() < 1e-3);

        let d = haversine_m(GeoPoint::new(45.0, 30.0), GeoPoint::new(-45.0, -150.0));
        assert!(!d.is_nan());
        assert!((d - EARTH_RADIUS_M * PI).abs() < 1.0);
    }

    #[test]
    fn test_antimeridian_crossing_is_short() {
        let d = haversine_m(GeoPoint::new(0.0, 179.9), GeoPoint::new(0.0, -179.9));
        assert!(d < 25_000.0, "got {d}");
    }
}
