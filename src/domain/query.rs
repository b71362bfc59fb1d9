//! Zone query - the circular geofence and time window being searched

use crate::domain::types::GeoPoint;
use crate::error::ValidationError;
use chrono::{DateTime, Utc};

/// Immutable, validated description of one reverse search zone.
///
/// Can only be built through [`ZoneQuery::new`], so every instance satisfies
/// `from <= to`, a finite non-negative radius and an in-range center.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneQuery {
    center: GeoPoint,
    radius_m: f64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl ZoneQuery {
    /// Validate parameters and build the query.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use zone_visits::domain::query::ZoneQuery;
    /// use zone_visits::domain::types::GeoPoint;
    ///
    /// let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    /// let to = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
    /// let query = ZoneQuery::new(GeoPoint::new(48.8584, 2.2945), 250.0, from, to).unwrap();
    /// assert_eq!(query.radius_m(), 250.0);
    /// assert!(ZoneQuery::new(GeoPoint::new(48.8584, 2.2945), 250.0, to, from).is_err());
    /// ```
    pub fn new(
        center: GeoPoint,
        radius_m: f64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if !center.latitude.is_finite() || !(-90.0..=90.0).contains(&center.latitude) {
            return Err(ValidationError::LatitudeOutOfRange(center.latitude));
        }
        if !center.longitude.is_finite() || !(-180.0..=180.0).contains(&center.longitude) {
            return Err(ValidationError::LongitudeOutOfRange(center.longitude));
        }
        if !radius_m.is_finite() || radius_m < 0.0 {
            return Err(ValidationError::InvalidRadius(radius_m));
        }
        if from > to {
            return Err(ValidationError::WindowInverted { from, to });
        }

        Ok(Self { center, radius_m, from, to })
    }

    #[inline]
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    #[inline]
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    #[inline]
    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Inclusive window end; also the exit time given to visits still open
    /// when the scanned history runs out
    #[inline]
    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let from = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        (from, from + Duration::hours(6))
    }

    #[test]
    fn test_valid_query() {
        let (from, to) = window();
        let query = ZoneQuery::new(GeoPoint::new(64.1466, -21.9426), 300.0, from, to).unwrap();
        assert_eq!(query.center(), GeoPoint::new(64.1466, -21.9426));
        assert_eq!(query.from(), from);
        assert_eq!(query.to(), to);
    }

    #[test]
    fn test_zero_radius_and_empty_window_allowed() {
        let (from, _) = window();
        assert!(ZoneQuery::new(GeoPoint::new(0.0, 0.0), 0.0, from, from).is_ok());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let (from, to) = window();
        let err = ZoneQuery::new(GeoPoint::new(0.0, 0.0), 10.0, to, from).unwrap_err();
        assert_eq!(err, ValidationError::WindowInverted { from: to, to: from });
    }

    #[test]
    fn test_bad_radius_rejected() {
        let (from, to) = window();
        let center = GeoPoint::new(0.0, 0.0);
        assert!(matches!(
            ZoneQuery::new(center, -1.0, from, to),
            Err(ValidationError::InvalidRadius(_))
        ));
        assert!(matches!(
            ZoneQuery::new(center, f64::NAN, from, to),
            Err(ValidationError::InvalidRadius(_))
        ));
        assert!(matches!(
            ZoneQuery::new(center, f64::INFINITY, from, to),
            Err(ValidationError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_bad_center_rejected() {
        let (from, to) = window();
        assert!(matches!(
            ZoneQuery::new(GeoPoint::new(91.0, 0.0), 10.0, from, to),
            Err(ValidationError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            ZoneQuery::new(GeoPoint::new(f64::NAN, 0.0), 10.0, from, to),
            Err(ValidationError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            ZoneQuery::new(GeoPoint::new(0.0, 200.0), 10.0, from, to),
            Err(ValidationError::LongitudeOutOfRange(_))
        ));
    }
}
