//! Timetable time handling.
//!
//! Schedules give times as "HH:MM" strings. Service that runs after midnight
//! stays on the same logical day, so hours past 23 are allowed ("25:10" is
//! ten past one in the morning of the same service day).

use std::fmt;
use std::ops::Add;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Largest hour accepted by [`ServiceTime::parse_hhmm`].
pub const MAX_SERVICE_HOUR: u32 = 47;

/// Largest hour accepted in a timetable cell.
pub const MAX_SCHEDULE_HOUR: u32 = 29;

/// Minutes since midnight of the service day.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ServiceTime;
///
/// let t = ServiceTime::parse_hhmm("08:30").unwrap();
/// assert_eq!(t.minutes(), 510);
/// assert_eq!(t.to_string(), "08:30");
///
/// let late = ServiceTime::parse_hhmm("24:15").unwrap();
/// assert_eq!(late.to_string(), "24:15");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create a time from minutes since midnight.
    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Create a time from hour and minute components.
    pub const fn from_hm(hour: u32, minute: u32) -> Self {
        Self(hour * 60 + minute)
    }

    /// Parse a time from "HH:MM" (or "H:MM") format.
    ///
    /// Minutes must be 0-59. Hours may exceed 23 to express service after
    /// midnight, up to [`MAX_SERVICE_HOUR`].
    ///
    /// ```
    /// use transit_server::domain::ServiceTime;
    ///
    /// assert!(ServiceTime::parse_hhmm("7:05").is_ok());
    /// assert!(ServiceTime::parse_hhmm("0805").is_err());
    /// assert!(ServiceTime::parse_hhmm("08:60").is_err());
    /// assert!(ServiceTime::parse_hhmm("08:5").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        Self::parse_bounded(s, MAX_SERVICE_HOUR)
    }

    /// Parse a timetable cell. Cells are stricter about the hour range.
    pub fn parse_schedule_cell(s: &str) -> Result<Self, TimeError> {
        Self::parse_bounded(s, MAX_SCHEDULE_HOUR)
    }

    fn parse_bounded(s: &str, max_hour: u32) -> Result<Self, TimeError> {
        let s = s.trim();
        let (hours, minutes) = s
            .split_once(':')
            .ok_or_else(|| TimeError::new("expected HH:MM format"))?;

        if hours.is_empty() || hours.len() > 2 {
            return Err(TimeError::new("expected one or two hour digits"));
        }
        if minutes.len() != 2 {
            return Err(TimeError::new("expected two minute digits"));
        }

        let hour = parse_digits(hours).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > max_hour {
            return Err(TimeError::new("hour out of range"));
        }

        let minute =
            parse_digits(minutes).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self::from_hm(hour, minute))
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// Hour component (may exceed 23).
    pub const fn hour(self) -> u32 {
        self.0 / 60
    }

    /// Minute component (0-59).
    pub const fn minute(self) -> u32 {
        self.0 % 60
    }

    /// Add whole minutes.
    pub const fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0 + minutes)
    }

    /// Subtract whole minutes, clamping at midnight.
    pub const fn saturating_minus_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_sub(minutes))
    }

    /// Minutes elapsed since `earlier`, or `None` if `earlier` is later.
    pub fn minutes_since(self, earlier: Self) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }
}

impl Add<u32> for ServiceTime {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        self.plus_minutes(rhs)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn display_parse_roundtrip(hour in 0u32..=MAX_SERVICE_HOUR, minute in 0u32..60) {
            let t = ServiceTime::from_hm(hour, minute);
            let parsed = ServiceTime::parse_hhmm(&t.to_string()).unwrap();
            prop_assert_eq!(parsed, t);
        }

        #[test]
        fn never_panics(s in "\\PC*") {
            let _ = ServiceTime::parse_hhmm(&s);
        }
    }
}
