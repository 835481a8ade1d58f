//! Stop identity and location types.

use std::fmt;

/// Dense stop identifier, assigned in first-seen order during graph construction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopId(pub u32);

impl StopId {
    /// Index into per-stop vectors.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A latitude/longitude pair in degrees.
///
/// The all-zero pair is the "unresolved" sentinel used by the data sources.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// The unresolved sentinel.
    pub const UNRESOLVED: Self = Self { lat: 0.0, lon: 0.0 };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true unless this is the zero/zero sentinel.
    pub fn is_resolved(&self) -> bool {
        !(self.lat == 0.0 && self.lon == 0.0)
    }
}

/// A physical boarding/alighting location.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    /// Trimmed, upper-cased name.
    pub name: String,
    pub location: Coordinates,
}

impl Stop {
    pub fn has_coordinates(&self) -> bool {
        self.location.is_resolved()
    }
}

/// Canonical form of a stop name: trimmed and upper-cased.
pub fn normalize_stop_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_unresolved() {
        assert!(!Coordinates::UNRESOLVED.is_resolved());
        assert!(!Coordinates::default().is_resolved());
        assert!(Coordinates::new(-33.92, 18.42).is_resolved());
        // Only the exact pair is the sentinel
        assert!(Coordinates::new(0.0, 18.42).is_resolved());
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_stop_name("  Cape Town "), "CAPE TOWN");
        assert_eq!(normalize_stop_name("woodstock"), "WOODSTOCK");
    }

    #[test]
    fn stop_id_display() {
        assert_eq!(StopId(7).to_string(), "7");
        assert_eq!(format!("{:?}", StopId(7)), "StopId(7)");
        assert_eq!(StopId(7).index(), 7);
    }
}
