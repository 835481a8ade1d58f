//! Service day resolution.
//!
//! Maps a travel date to the timetable bucket that runs on it. Public
//! holidays follow the South African calendar: a fixed list of dates (each
//! also observed on the Monday when it falls on a Sunday) plus Good Friday
//! and Family Day, which move with Easter.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::domain::DayType;

/// Fixed-date public holidays as (month, day).
const FIXED_HOLIDAYS: [(u32, u32); 10] = [
    (1, 1),   // New Year's Day
    (3, 21),  // Human Rights Day
    (4, 27),  // Freedom Day
    (5, 1),   // Workers' Day
    (6, 16),  // Youth Day
    (8, 9),   // National Women's Day
    (9, 24),  // Heritage Day
    (12, 16), // Day of Reconciliation
    (12, 25), // Christmas Day
    (12, 26), // Day of Goodwill
];

/// Resolve a free-form date string to a day type.
///
/// ISO-8601 dates (`2024-12-25`) are resolved against the holiday table and
/// the day of the week. Anything else falls back to keyword sniffing
/// ("HOLIDAY", "SAT", "SUN"), and finally to a weekday.
///
/// ```
/// use transit_server::calendar::resolve_day_type;
/// use transit_server::domain::DayType;
///
/// assert_eq!(resolve_day_type("2024-12-25"), DayType::PublicHoliday);
/// assert_eq!(resolve_day_type("2024-06-15"), DayType::Saturday);
/// assert_eq!(resolve_day_type("next sunday"), DayType::Sunday);
/// assert_eq!(resolve_day_type(""), DayType::Weekday);
/// ```
pub fn resolve_day_type(date: &str) -> DayType {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return DayType::Weekday;
    }

    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(parsed) => day_type_for(parsed),
        Err(_) => sniff_keywords(trimmed),
    }
}

/// Day type of a calendar date.
pub fn day_type_for(date: NaiveDate) -> DayType {
    if is_public_holiday(date) {
        return DayType::PublicHoliday;
    }
    match date.weekday() {
        Weekday::Sat => DayType::Saturday,
        Weekday::Sun => DayType::Sunday,
        _ => DayType::Weekday,
    }
}

fn sniff_keywords(raw: &str) -> DayType {
    let upper = raw.to_uppercase();
    if upper.contains("HOLIDAY") {
        DayType::PublicHoliday
    } else if upper.contains("SAT") {
        DayType::Saturday
    } else if upper.contains("SUN") {
        DayType::Sunday
    } else {
        DayType::Weekday
    }
}

/// Returns true if `date` is a public holiday (including Sunday observance).
pub fn is_public_holiday(date: NaiveDate) -> bool {
    public_holidays(date.year()).contains(&date)
}

/// All public holidays in `year`, sorted.
pub fn public_holidays(year: i32) -> Vec<NaiveDate> {
    let mut holidays = Vec::with_capacity(FIXED_HOLIDAYS.len() * 2 + 2);

    for (month, day) in FIXED_HOLIDAYS {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            holidays.push(date);
            if date.weekday() == Weekday::Sun {
                holidays.push(date + Duration::days(1));
            }
        }
    }

    if let Some(easter) = easter_sunday(year) {
        holidays.push(easter - Duration::days(2)); // Good Friday
        holidays.push(easter + Duration::days(1)); // Family Day
    }

    holidays.sort();
    holidays.dedup();
    holidays
}

/// Gregorian Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn known_easter_dates() {
        assert_eq!(easter_sunday(2019), Some(date(2019, 4, 21)));
        assert_eq!(easter_sunday(2024), Some(date(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(date(2025, 4, 20)));
        assert_eq!(easter_sunday(2038), Some(date(2038, 4, 25)));
        assert_eq!(easter_sunday(2008), Some(date(2008, 3, 23)));
    }

    #[test]
    fn easter_derived_holidays() {
        // Easter 2025 is 20 April
        assert!(is_public_holiday(date(2025, 4, 18)));
        assert!(is_public_holiday(date(2025, 4, 21)));
        assert!(!is_public_holiday(date(2025, 4, 20)));
        assert!(!is_public_holiday(date(2025, 4, 19)));
    }

    #[test]
    fn fixed_holidays() {
        assert!(is_public_holiday(date(2024, 1, 1)));
        assert!(is_public_holiday(date(2024, 6, 16)));
        assert!(is_public_holiday(date(2024, 12, 26)));
        assert!(!is_public_holiday(date(2024, 12, 27)));
    }

    #[test]
    fn sunday_holiday_observed_on_monday() {
        // 16 June 2024 is a Sunday
        assert_eq!(date(2024, 6, 16).weekday(), Weekday::Sun);
        assert!(is_public_holiday(date(2024, 6, 17)));
        assert_eq!(day_type_for(date(2024, 6, 17)), DayType::PublicHoliday);
        // The Sunday itself is still the holiday
        assert_eq!(day_type_for(date(2024, 6, 16)), DayType::PublicHoliday);
    }

    #[test]
    fn ordinary_days() {
        // 2024-06-12 is a Wednesday
        assert_eq!(resolve_day_type("2024-06-12"), DayType::Weekday);
        assert_eq!(resolve_day_type("2024-06-15"), DayType::Saturday);
        assert_eq!(resolve_day_type("2024-06-23"), DayType::Sunday);
    }

    #[test]
    fn keyword_fallback() {
        assert_eq!(resolve_day_type("Saturday"), DayType::Saturday);
        assert_eq!(resolve_day_type("sun"), DayType::Sunday);
        assert_eq!(resolve_day_type("public holiday"), DayType::PublicHoliday);
        assert_eq!(resolve_day_type("tomorrow"), DayType::Weekday);
        assert_eq!(resolve_day_type("2024-13-45"), DayType::Weekday);
    }

    #[test]
    fn holiday_list_is_sorted_and_unique() {
        let holidays = public_holidays(2024);
        let mut sorted = holidays.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(holidays, sorted);
        // 10 fixed + 2 Easter + 1 Sunday observance (Youth Day 2024)
        assert_eq!(holidays.len(), 13);
    }
}
