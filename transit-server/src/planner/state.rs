//! Per-query search labels and the predecessor arena.
//!
//! Both engines keep, for every stop, the best known [`SearchState`] and the
//! [`Predecessor`] that produced it. Everything here is created fresh for a
//! query and dropped after reconstruction.

use std::cmp::Ordering;
use std::collections::{BTreeSet, VecDeque};

use crate::domain::{DayType, ServiceTime, StopId, TransportMode, Trip, TripIdx};
use crate::graph::TransitGraph;

use super::preferences::QueryPreferences;

/// The two interchangeable search engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RoundBased,
    ConnectionScan,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::RoundBased => "RAPTOR",
            Algorithm::ConnectionScan => "CSA",
        }
    }
}

/// Everything an engine needs to answer one earliest-arrival query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub source: StopId,
    pub target: StopId,
    pub departure: ServiceTime,
    pub filter: ServiceFilter,
    pub limits: WalkLimits,
    /// Walked before reaching `source`; counts against the walking caps.
    pub origin_walk_km: f64,
}

impl SearchRequest {
    /// Fresh labels for this request over `graph`.
    pub fn labels(&self, graph: &TransitGraph) -> Labels {
        let origin = SearchState::at(self.departure, self.origin_walk_km, self.origin_walk_km);
        Labels::starting_at(graph.stop_count(), self.source, origin, self.limits.eps)
    }
}

/// An earliest-arrival search over a graph snapshot.
///
/// Engines allocate their own labels and never mutate the graph, so one
/// snapshot can serve any number of concurrent searches.
pub trait SearchEngine {
    fn algorithm(&self) -> Algorithm;

    fn search(&self, graph: &TransitGraph, request: &SearchRequest) -> Labels;
}

/// Best known way of reaching a stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchState {
    /// `None` while the stop is unreached.
    pub arrival: Option<ServiceTime>,
    pub total_walk_km: f64,
    /// Walking since the last vehicle was left.
    pub consecutive_walk_km: f64,
}

impl SearchState {
    pub const UNREACHED: Self = Self {
        arrival: None,
        total_walk_km: f64::INFINITY,
        consecutive_walk_km: f64::INFINITY,
    };

    pub fn at(arrival: ServiceTime, total_walk_km: f64, consecutive_walk_km: f64) -> Self {
        Self {
            arrival: Some(arrival),
            total_walk_km,
            consecutive_walk_km,
        }
    }

    pub fn is_reached(&self) -> bool {
        self.arrival.is_some()
    }

    /// Three-way dominance: earlier arrival, then less total walking, then
    /// less consecutive walking. Walking distances within `eps` are equal.
    pub fn improves_on(&self, current: &SearchState, eps: f64) -> bool {
        let Some(arrival) = self.arrival else {
            return false;
        };
        let Some(current_arrival) = current.arrival else {
            return true;
        };
        match arrival.cmp(&current_arrival) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
        if self.total_walk_km + eps < current.total_walk_km {
            return true;
        }
        if self.total_walk_km > current.total_walk_km + eps {
            return false;
        }
        self.consecutive_walk_km + eps < current.consecutive_walk_km
    }
}

/// How a stop's best state was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predecessor {
    /// Rode `trip`, boarding at `from`.
    Ride {
        trip: TripIdx,
        from: StopId,
        board_time: ServiceTime,
        arrival: ServiceTime,
    },
    /// Walked from `from`.
    Walk {
        from: StopId,
        depart: ServiceTime,
        arrival: ServiceTime,
        distance_km: f64,
    },
}

impl Predecessor {
    pub fn from_stop(&self) -> StopId {
        match self {
            Predecessor::Ride { from, .. } | Predecessor::Walk { from, .. } => *from,
        }
    }

    pub fn walk_km(&self) -> f64 {
        match self {
            Predecessor::Ride { .. } => 0.0,
            Predecessor::Walk { distance_km, .. } => *distance_km,
        }
    }
}

/// Walking totals along a predecessor chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WalkingStats {
    pub total_km: f64,
    pub max_consecutive_km: f64,
}

/// Labels for every stop, indexed by stop id.
#[derive(Debug, Clone)]
pub struct Labels {
    states: Vec<SearchState>,
    predecessors: Vec<Option<Predecessor>>,
    eps: f64,
}

impl Labels {
    /// Fresh labels with only `source` reached, at `departure` with no walking.
    pub fn new(stop_count: usize, source: StopId, departure: ServiceTime, eps: f64) -> Self {
        Self::starting_at(stop_count, source, SearchState::at(departure, 0.0, 0.0), eps)
    }

    /// Fresh labels with only `source` reached, in `origin`.
    pub fn starting_at(stop_count: usize, source: StopId, origin: SearchState, eps: f64) -> Self {
        let size = stop_count.max(source.index() + 1);
        let mut states = vec![SearchState::UNREACHED; size];
        states[source.index()] = origin;
        Self {
            states,
            predecessors: vec![None; size],
            eps,
        }
    }

    pub fn state(&self, stop: StopId) -> SearchState {
        self.states
            .get(stop.index())
            .copied()
            .unwrap_or(SearchState::UNREACHED)
    }

    pub fn arrival(&self, stop: StopId) -> Option<ServiceTime> {
        self.state(stop).arrival
    }

    pub fn predecessor(&self, stop: StopId) -> Option<&Predecessor> {
        self.predecessors.get(stop.index()).and_then(Option::as_ref)
    }

    /// Record `candidate` at `stop` if it dominates the current label.
    pub fn relax(&mut self, stop: StopId, candidate: SearchState, via: Predecessor) -> bool {
        let Some(current) = self.states.get(stop.index()) else {
            return false;
        };
        if !candidate.improves_on(current, self.eps) {
            return false;
        }
        self.states[stop.index()] = candidate;
        self.predecessors[stop.index()] = Some(via);
        true
    }

    /// Breadth-first walking from each of `origins`, carrying the walked
    /// state rather than re-reading labels. The target is never expanded.
    /// Returns every stop the walks improved.
    pub fn relax_footpaths(
        &mut self,
        graph: &TransitGraph,
        request: &SearchRequest,
        origins: &[StopId],
    ) -> Vec<StopId> {
        let mut improved = Vec::new();
        if !request.limits.allowed {
            return improved;
        }
        let mut queue: VecDeque<(StopId, SearchState)> =
            origins.iter().map(|&stop| (stop, self.state(stop))).collect();

        while let Some((stop, state)) = queue.pop_front() {
            let Some(depart) = state.arrival else {
                continue;
            };
            for edge in graph.walking_from(stop) {
                let Some(candidate) = request.limits.extend(&state, edge.distance_km, edge.minutes)
                else {
                    continue;
                };
                let walk = Predecessor::Walk {
                    from: stop,
                    depart,
                    arrival: depart + edge.minutes,
                    distance_km: edge.distance_km,
                };
                if self.relax(edge.to, candidate, walk) {
                    improved.push(edge.to);
                    if edge.to != request.target {
                        queue.push_back((edge.to, candidate));
                    }
                }
            }
        }
        improved
    }

    /// Walk the chain back from `target`, summing walks and tracking the
    /// longest unbroken run. Stops at `source`, a missing link or a revisit.
    pub fn walking_stats(&self, source: StopId, target: StopId) -> WalkingStats {
        let mut stats = WalkingStats::default();
        let mut run = 0.0;
        let mut seen = BTreeSet::new();
        let mut cursor = target;

        while cursor != source && seen.insert(cursor) {
            let Some(step) = self.predecessor(cursor) else {
                break;
            };
            match step {
                Predecessor::Walk { distance_km, .. } => {
                    stats.total_km += distance_km;
                    run += distance_km;
                    stats.max_consecutive_km = stats.max_consecutive_km.max(run);
                }
                Predecessor::Ride { .. } => run = 0.0,
            }
            cursor = step.from_stop();
        }
        stats
    }
}

/// Which trips a query may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFilter {
    pub day_type: DayType,
    /// `None` admits every mode.
    pub modes: Option<BTreeSet<TransportMode>>,
}

impl ServiceFilter {
    pub fn for_day(day_type: DayType) -> Self {
        Self {
            day_type,
            modes: None,
        }
    }

    /// Day filter plus the preferences' mode restriction.
    pub fn with_preferences(day_type: DayType, preferences: &QueryPreferences) -> Self {
        Self {
            day_type,
            modes: preferences.allowed_modes().cloned(),
        }
    }

    pub fn admits(&self, trip: &Trip) -> bool {
        trip.day_type == self.day_type
            && self
                .modes
                .as_ref()
                .is_none_or(|modes| modes.contains(&trip.mode))
    }
}

/// Walking limits applied while searching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkLimits {
    pub allowed: bool,
    pub max_single_km: Option<f64>,
    pub max_consecutive_km: f64,
    pub max_cumulative_km: f64,
    pub eps: f64,
}

impl WalkLimits {
    pub fn from_preferences(preferences: &QueryPreferences, eps: f64) -> Self {
        Self {
            allowed: preferences.allows_walking(),
            max_single_km: preferences.max_single_walk_km(),
            max_consecutive_km: preferences.max_consecutive_walk_km(),
            max_cumulative_km: preferences.max_cumulative_walk_km(),
            eps,
        }
    }

    /// State after walking `distance_km` from `from`, or `None` if a cap is
    /// exceeded.
    pub fn extend(&self, from: &SearchState, distance_km: f64, minutes: u32) -> Option<SearchState> {
        if !self.allowed {
            return None;
        }
        let arrival = from.arrival?;
        if self
            .max_single_km
            .is_some_and(|cap| distance_km > cap + self.eps)
        {
            return None;
        }
        let total = from.total_walk_km + distance_km;
        let consecutive = from.consecutive_walk_km + distance_km;
        if total > self.max_cumulative_km + self.eps || consecutive > self.max_consecutive_km + self.eps
        {
            return None;
        }
        Some(SearchState::at(arrival + minutes, total, consecutive))
    }

    /// True if a finished journey stays within the caps.
    pub fn permits(&self, stats: &WalkingStats) -> bool {
        stats.total_km <= self.max_cumulative_km + self.eps
            && stats.max_consecutive_km <= self.max_consecutive_km + self.eps
    }
}
