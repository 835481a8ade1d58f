//! Estimating times for timetable cells marked "VIA".
//!
//! Bus timetables mark stops the bus passes without a published time as
//! "VIA". A run of such cells between two published times gets linearly
//! spaced estimates; a run with no published time on one side stays unset.

use crate::domain::ServiceTime;

/// One timetable cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Time(ServiceTime),
    Via,
    /// Empty or unparseable: the trip does not call here.
    Blank,
}

impl Cell {
    /// Classify a raw schedule cell.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Blank;
        }
        if let Ok(time) = ServiceTime::parse_schedule_cell(trimmed) {
            return Cell::Time(time);
        }
        if is_via_marker(trimmed) {
            Cell::Via
        } else {
            Cell::Blank
        }
    }
}

/// Returns true for "VIA", "VIA." and "VIA*" (any case).
pub fn is_via_marker(raw: &str) -> bool {
    matches!(raw.trim().to_uppercase().as_str(), "VIA" | "VIA." | "VIA*")
}

/// Resolve a row of cells into per-column times.
///
/// Published times pass through. Each maximal run of VIA cells bounded by
/// published times on both sides is filled by linear interpolation between
/// those bounds (blank cells inside the span count towards the spacing). An
/// estimate that would not exceed the previous value in the span is bumped
/// to one minute after it.
pub fn interpolate_via(cells: &[Cell]) -> Vec<Option<ServiceTime>> {
    let mut minutes: Vec<Option<u32>> = cells
        .iter()
        .map(|cell| match cell {
            Cell::Time(t) => Some(t.minutes()),
            _ => None,
        })
        .collect();
    let is_via = |idx: usize| cells[idx] == Cell::Via;

    let n = cells.len();
    let mut i = 0;
    while i < n {
        if !is_via(i) || minutes[i].is_some() {
            i += 1;
            continue;
        }

        let run_start = i;
        while i < n && is_via(i) && minutes[i].is_none() {
            i += 1;
        }

        let prev = (0..run_start)
            .rev()
            .find_map(|idx| minutes[idx].map(|m| (idx, m)));
        let next = (i..n).find_map(|idx| minutes[idx].map(|m| (idx, m)));
        let (Some((prev_idx, prev_val)), Some((next_idx, next_val))) = (prev, next) else {
            continue;
        };

        let gap = next_idx - prev_idx;
        let step = (f64::from(next_val) - f64::from(prev_val)) / gap as f64;
        let mut last = prev_val;
        for offset in 1..gap {
            let idx = prev_idx + offset;
            if !is_via(idx) || minutes[idx].is_some() {
                if let Some(known) = minutes[idx] {
                    last = known;
                }
                continue;
            }
            let linear = (f64::from(prev_val) + step * offset as f64 + 0.5).floor();
            let mut estimate = if linear <= 0.0 { 0 } else { linear as u32 };
            if estimate <= last {
                estimate = last + 1;
            }
            minutes[idx] = Some(estimate);
            last = estimate;
        }
    }

    minutes
        .into_iter()
        .map(|m| m.map(ServiceTime::from_minutes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> Cell {
        Cell::Time(ServiceTime::from_hm(h, m))
    }

    fn mins(out: &[Option<ServiceTime>]) -> Vec<Option<u32>> {
        out.iter().map(|o| o.map(|t| t.minutes())).collect()
    }

    #[test]
    fn parse_cells() {
        assert_eq!(Cell::parse("07:15"), t(7, 15));
        assert_eq!(Cell::parse(" via "), Cell::Via);
        assert_eq!(Cell::parse("VIA*"), Cell::Via);
        assert_eq!(Cell::parse("Via."), Cell::Via);
        assert_eq!(Cell::parse(""), Cell::Blank);
        assert_eq!(Cell::parse("-"), Cell::Blank);
        assert_eq!(Cell::parse("31:00"), Cell::Blank);
    }

    #[test]
    fn single_via_is_midpoint() {
        let out = interpolate_via(&[t(8, 0), Cell::Via, t(8, 10)]);
        assert_eq!(mins(&out), vec![Some(480), Some(485), Some(490)]);
    }

    #[test]
    fn run_is_evenly_spaced() {
        let out = interpolate_via(&[t(8, 0), Cell::Via, Cell::Via, Cell::Via, t(8, 20)]);
        assert_eq!(
            mins(&out),
            vec![Some(480), Some(485), Some(490), Some(495), Some(500)]
        );
    }

    #[test]
    fn tight_gap_bumps_by_one_minute() {
        let out = interpolate_via(&[t(8, 0), Cell::Via, Cell::Via, t(8, 1)]);
        // Linear estimates round to 480 and 481, each bumped past its predecessor.
        // The bump can overtake the closing time.
        assert_eq!(mins(&out), vec![Some(480), Some(481), Some(482), Some(481)]);
    }

    #[test]
    fn unbounded_runs_stay_unset() {
        let out = interpolate_via(&[Cell::Via, t(8, 0), Cell::Via]);
        assert_eq!(mins(&out), vec![None, Some(480), None]);
    }

    #[test]
    fn blank_cells_count_towards_spacing() {
        let out = interpolate_via(&[t(8, 0), Cell::Blank, Cell::Via, t(8, 9)]);
        assert_eq!(mins(&out), vec![Some(480), None, Some(486), Some(489)]);
    }

    #[test]
    fn blanks_never_get_times() {
        let out = interpolate_via(&[t(8, 0), Cell::Blank, t(8, 5)]);
        assert_eq!(mins(&out), vec![Some(480), None, Some(485)]);
    }
}
