//! Proximity and recency filtering for the report listing.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset};
use regex::Regex;

use crate::store::StoredReport;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

static COORDINATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((-?\d+\.?\d*),\s*(-?\d+\.?\d*)\)").expect("coordinate regex is valid")
});

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// First `(lat, lng)` group in free-form location text.
    pub fn from_location(location: &str) -> Option<Self> {
        let caps = COORDINATES.captures(location)?;
        let lat = caps[1].parse().ok()?;
        let lng = caps[2].parse().ok()?;
        Some(Self { lat, lng })
    }

    /// Great-circle distance via the haversine formula.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let a = a.clamp(0.0, 1.0);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Listing filter around a centre point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityFilter {
    pub centre: Coordinates,
    pub radius_km: f64,
    pub max_age: Duration,
}

impl ProximityFilter {
    pub const DEFAULT_RADIUS_KM: f64 = 20.0;
    pub const DEFAULT_MAX_HOURS: i64 = 48;

    /// Whether a report lies within the radius and was filed within the age
    /// limit. Reports without coordinates or with unreadable timestamps are
    /// excluded.
    pub fn matches(&self, report: &StoredReport, now: DateTime<FixedOffset>) -> bool {
        let Some(position) = Coordinates::from_location(&report.location) else {
            return false;
        };
        if self.centre.distance_km(&position) > self.radius_km {
            return false;
        }
        match DateTime::parse_from_rfc3339(&report.timestamp) {
            Ok(filed) => now.signed_duration_since(filed) <= self.max_age,
            Err(_) => false,
        }
    }

    /// Keep matching reports, preserving order.
    pub fn apply(
        &self,
        reports: Vec<StoredReport>,
        now: DateTime<FixedOffset>,
    ) -> Vec<StoredReport> {
        reports
            .into_iter()
            .filter(|r| self.matches(r, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReportStatus;

    fn report(location: &str, timestamp: &str) -> StoredReport {
        StoredReport {
            report_id: "r".into(),
            category: "Fire".into(),
            location: location.into(),
            description: "d".into(),
            classification: String::new(),
            routing: String::new(),
            authority_routing: String::new(),
            suggestions: String::new(),
            media_files: vec![],
            timestamp: timestamp.into(),
            status: ReportStatus::Pending,
        }
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-03-03T12:00:00+05:30").unwrap()
    }

    fn filter() -> ProximityFilter {
        ProximityFilter {
            centre: Coordinates::new(28.6139, 77.2090),
            radius_km: ProximityFilter::DEFAULT_RADIUS_KM,
            max_age: Duration::hours(ProximityFilter::DEFAULT_MAX_HOURS),
        }
    }

    #[test]
    fn extracts_coordinates() {
        let c = Coordinates::from_location("Connaught Place (28.6315, 77.2167)").unwrap();
        assert_eq!(c, Coordinates::new(28.6315, 77.2167));
        let c = Coordinates::from_location("South pole (-90,0)").unwrap();
        assert_eq!(c, Coordinates::new(-90.0, 0.0));
        assert!(Coordinates::from_location("Connaught Place").is_none());
    }

    #[test]
    fn haversine_distance() {
        let delhi = Coordinates::new(28.6139, 77.2090);
        let mumbai = Coordinates::new(19.0760, 72.8777);
        let d = delhi.distance_km(&mumbai);
        assert!((d - 1148.1).abs() < 1.0, "got {d}");
        assert!(delhi.distance_km(&delhi).abs() < 1e-9);
    }

    #[test]
    fn filters_by_distance_and_age() {
        let f = filter();
        assert!(f.matches(&report("CP (28.6315, 77.2167)", "2026-03-02T12:00:00.000000+05:30"), now()));
        // too far
        assert!(!f.matches(&report("Mumbai (19.0760, 72.8777)", "2026-03-03T11:00:00+05:30"), now()));
        // too old
        assert!(!f.matches(&report("CP (28.6315, 77.2167)", "2026-02-28T12:00:00+05:30"), now()));
        // no coordinates
        assert!(!f.matches(&report("CP", "2026-03-03T11:00:00+05:30"), now()));
        // unreadable timestamp
        assert!(!f.matches(&report("CP (28.6315, 77.2167)", "yesterday"), now()));
    }

    #[test]
    fn timestamps_in_other_offsets_compare_correctly() {
        // 2026-03-03T06:00Z == 11:30 +05:30, half an hour before now
        assert!(filter().matches(&report("CP (28.6315, 77.2167)", "2026-03-03T06:00:00Z"), now()));
    }
}
