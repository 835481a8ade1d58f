//! Stop coordinate lookup.
//!
//! Timetables name stops by free text, and the coordinate sources spell the
//! same place differently ("Main Road" vs "MAIN RD", station codes vs names).
//! All of that fuzziness lives in [`CoordinateTable::resolve`] so its rule
//! order is fixed and testable on its own.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Coordinates, normalize_stop_name};

/// Suffixes removed by [`clean_name`], longest first so that "STREET" is not
/// reduced to "REET" by the shorter "ST".
const NAME_SUFFIXES: [&str; 4] = ["STREET", "ROAD", "RD", "ST"];

/// Thresholds for the fuzzy rules of [`CoordinateTable::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Containment only counts when both cleaned names are at least this long.
    pub min_containment_len: usize,
    /// Prefix matches only count when the cleaned lengths differ by at most this.
    pub max_prefix_len_diff: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_containment_len: 5,
            max_prefix_len_diff: 2,
        }
    }
}

impl MatchPolicy {
    /// Loose comparison of two names after cleaning.
    pub fn is_match(&self, a: &str, b: &str) -> bool {
        let a = clean_name(a);
        let b = clean_name(b);
        self.is_clean_match(&a, &b)
    }

    fn is_clean_match(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let (a_len, b_len) = (a.chars().count(), b.chars().count());
        let min_len = a_len.min(b_len);
        if min_len >= self.min_containment_len && (a.contains(b) || b.contains(a)) {
            return true;
        }
        a_len.abs_diff(b_len) <= self.max_prefix_len_diff && (a.starts_with(b) || b.starts_with(a))
    }
}

/// Strip whitespace and common street suffixes from an upper-cased name.
///
/// ```
/// use transit_server::graph::clean_name;
///
/// assert_eq!(clean_name("MAIN ROAD"), "MAIN");
/// assert_eq!(clean_name("LONG STREET"), "LONG");
/// assert_eq!(clean_name("VOORTREKKER RD"), "VOORTREKKER");
/// ```
pub fn clean_name(name: &str) -> String {
    let mut cleaned: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    for suffix in NAME_SUFFIXES {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned
}

/// Coordinate sources merged into one lookup.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    by_name: BTreeMap<String, Coordinates>,
    by_station_id: BTreeMap<String, Coordinates>,
    standalone: BTreeSet<String>,
    policy: MatchPolicy,
}

impl CoordinateTable {
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Record coordinates under a stop name.
    ///
    /// The normalized name always takes the new value; the cleaned form is
    /// only registered if no earlier entry claimed it.
    pub fn insert_named(&mut self, raw_name: &str, location: Coordinates) {
        let normalized = normalize_stop_name(raw_name);
        if normalized.is_empty() {
            return;
        }
        let cleaned = clean_name(&normalized);
        self.by_name.insert(normalized, location);
        if !cleaned.is_empty() {
            self.by_name.entry(cleaned).or_insert(location);
        }
    }

    /// Record a station row: coordinates are reachable by name and by station id.
    pub fn insert_station(&mut self, raw_name: &str, station_id: &str, location: Coordinates) {
        self.insert_named(raw_name, location);
        let id = normalize_stop_name(station_id);
        if !id.is_empty() {
            self.by_station_id.insert(id, location);
        }
    }

    /// Mark a name as a known stop without coordinates.
    pub fn mark_standalone(&mut self, raw_name: &str) {
        let normalized = normalize_stop_name(raw_name);
        if !normalized.is_empty() {
            self.standalone.insert(normalized);
        }
    }

    pub fn is_standalone(&self, name: &str) -> bool {
        self.standalone.contains(&normalize_stop_name(name))
    }

    /// Number of named entries (including cleaned aliases).
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_station_id.is_empty()
    }

    /// Resolve a stop name to coordinates.
    ///
    /// Rules, first success wins:
    /// 1. exact normalized name
    /// 2. cleaned name
    /// 3. standalone stops resolve to nothing
    /// 4. containment between cleaned names (both long enough)
    /// 5. shared prefix with a small length difference
    ///
    /// Rules 4 and 5 scan names first, then station ids, each in sorted order.
    pub fn resolve(&self, stop_name: &str) -> Option<Coordinates> {
        let normalized = normalize_stop_name(stop_name);

        if let Some(location) = self.by_name.get(&normalized) {
            return Some(*location);
        }
        let cleaned = clean_name(&normalized);
        if let Some(location) = self.by_name.get(&cleaned) {
            return Some(*location);
        }
        if self.standalone.contains(&normalized) {
            return None;
        }

        self.by_name
            .iter()
            .chain(self.by_station_id.iter())
            .find(|(candidate, _)| self.policy.is_clean_match(&cleaned, &clean_name(candidate)))
            .map(|(_, location)| *location)
    }
}
