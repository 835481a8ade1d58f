//! Service calendar buckets and transport modes.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

/// The service calendar bucket a trip operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayType {
    Weekday,
    Saturday,
    Sunday,
    PublicHoliday,
}

impl DayType {
    pub const ALL: [DayType; 4] = [
        DayType::Weekday,
        DayType::Saturday,
        DayType::Sunday,
        DayType::PublicHoliday,
    ];

    /// Canonical label, as used in trip identifiers and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayType::Weekday => "WEEKDAY",
            DayType::Saturday => "SATURDAY",
            DayType::Sunday => "SUNDAY",
            DayType::PublicHoliday => "PUBLIC_HOLIDAY",
        }
    }

    /// Collapse a raw timetable label ("Mon-Fri", "Saturdays",
    /// "Sundays and Public Holidays", ...) into a canonical day type.
    ///
    /// Empty labels are weekday service. Unrecognized labels also default to
    /// weekday, with a warning.
    ///
    /// ```
    /// use transit_server::domain::DayType;
    ///
    /// assert_eq!(DayType::from_label("Saturdays"), DayType::Saturday);
    /// assert_eq!(DayType::from_label("Mondays to Fridays"), DayType::Weekday);
    /// assert_eq!(DayType::from_label("Sundays and Public Holidays"), DayType::Sunday);
    /// ```
    pub fn from_label(raw: &str) -> DayType {
        match Self::classify(raw) {
            Some(day_type) => day_type,
            None => {
                warn!(label = raw, "unknown day type, defaulting to WEEKDAY");
                DayType::Weekday
            }
        }
    }

    /// Classify a raw label, returning `None` when it is not recognized.
    pub fn classify(raw: &str) -> Option<DayType> {
        let collapsed: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| c.is_ascii_uppercase())
            .collect();

        if collapsed.is_empty() {
            return Some(DayType::Weekday);
        }

        match collapsed.as_str() {
            "SATURDAY" | "SATURDAYS" | "SAT" => Some(DayType::Saturday),
            "SUNDAY" | "SUNDAYS" | "SUN" | "SUNDAYSANDPUBLICHOLIDAYS" => Some(DayType::Sunday),
            "PUBLICHOLIDAY" | "PUBLICHOLIDAYS" => Some(DayType::PublicHoliday),
            "WEEKDAY" | "WEEKDAYS" | "MONFRI" | "MONDAY" | "MONDAYS" | "TUESDAY" | "TUESDAYS"
            | "WEDNESDAY" | "WEDNESDAYS" | "THURSDAY" | "THURSDAYS" | "FRIDAY" | "FRIDAYS"
            | "MONDAYTOFRIDAY" | "MONDAYSTOFRIDAY" | "MONDAYSTOFRIDAYS" | "MONDAYTOFRIDAYS"
            | "MONDAYSTOTHURSDAY" | "MONDAYSTOTHURSDAYS" => Some(DayType::Weekday),
            other if other.contains("HOLIDAY") => Some(DayType::PublicHoliday),
            _ => None,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport mode of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransportMode {
    Train,
    Bus,
    Unknown,
}

impl TransportMode {
    /// Modes a rider can ask for.
    pub const SELECTABLE: [TransportMode; 2] = [TransportMode::Bus, TransportMode::Train];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Train => "TRAIN",
            TransportMode::Bus => "BUS",
            TransportMode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a mode label is not one of the selectable modes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for TransportMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRAIN" => Ok(TransportMode::Train),
            "BUS" => Ok(TransportMode::Bus),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
