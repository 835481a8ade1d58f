//! The transit network: stops, routes, trips and walking edges.
//!
//! A [`TransitGraph`] is built once per dataset load by [`GraphBuilder`] and
//! is read-only afterwards, so any number of queries can share it.

mod builder;
mod coords;
mod interpolate;
mod loader;
mod walking;

use std::collections::{BTreeMap, HashMap};

pub use builder::{BuildOptions, GraphBuilder, PurgeReport, TripRecord};
pub use coords::{CoordinateTable, MatchPolicy, clean_name};
pub use interpolate::{Cell, interpolate_via, is_via_marker};
pub use loader::{DatasetLayout, LoadError, load_dataset};
pub use walking::WalkingGraph;

use crate::domain::{
    Coordinates, Route, Stop, StopId, Trip, TripIdx, WalkingEdge, normalize_stop_name,
};
use crate::geo::haversine_km;

/// Immutable snapshot of the network.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    stops: Vec<Stop>,
    stop_ids: HashMap<String, StopId>,
    routes: BTreeMap<String, Route>,
    stop_routes: Vec<Vec<String>>,
    trips: Vec<Trip>,
    route_trips: HashMap<String, Vec<TripIdx>>,
    walking: WalkingGraph,
    purged_routes: Vec<String>,
}

/// Counts reported after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub walking_edges: usize,
    pub purged_routes: usize,
}

impl TransitGraph {
    pub(crate) fn from_parts(
        stops: Vec<Stop>,
        routes: BTreeMap<String, Route>,
        stop_routes: Vec<Vec<String>>,
        trips: Vec<Trip>,
        walking: WalkingGraph,
        purged_routes: Vec<String>,
    ) -> Self {
        let stop_ids = stops.iter().map(|s| (s.name.clone(), s.id)).collect();
        let mut route_trips: HashMap<String, Vec<TripIdx>> = HashMap::new();
        for (idx, trip) in trips.iter().enumerate() {
            route_trips
                .entry(trip.route.clone())
                .or_default()
                .push(TripIdx(idx));
        }
        Self {
            stops,
            stop_ids,
            routes,
            stop_routes,
            trips,
            route_trips,
            walking,
            purged_routes,
        }
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            stops: self.stops.len(),
            routes: self.routes.len(),
            trips: self.trips.len(),
            walking_edges: self.walking.len(),
            purged_routes: self.purged_routes.len(),
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn stop(&self, id: StopId) -> Option<&Stop> {
        self.stops.get(id.index())
    }

    /// Exact lookup by normalized name.
    pub fn stop_id(&self, name: &str) -> Option<StopId> {
        self.stop_ids.get(&normalize_stop_name(name)).copied()
    }

    /// All stop names, sorted.
    pub fn stop_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stops.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn route_operator(&self, id: &str) -> Option<&str> {
        self.routes.get(id).and_then(|r| r.operator.as_deref())
    }

    /// Routes with at least one trip calling at `stop`.
    pub fn routes_serving(&self, stop: StopId) -> &[String] {
        self.stop_routes
            .get(stop.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, idx: TripIdx) -> Option<&Trip> {
        self.trips.get(idx.0)
    }

    pub fn trips_on_route(&self, route: &str) -> &[TripIdx] {
        self.route_trips
            .get(route)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn walking(&self) -> &WalkingGraph {
        &self.walking
    }

    pub fn walking_from(&self, stop: StopId) -> &[WalkingEdge] {
        self.walking.from(stop)
    }

    /// Routes removed because they served stops without coordinates.
    pub fn purged_routes(&self) -> &[String] {
        &self.purged_routes
    }

    /// Forgiving lookup for rider-typed stop names.
    ///
    /// Commas are dropped and anything from the word "STATION" on is cut.
    /// Then: exact name, containment either way, and finally a shared
    /// three-letter prefix. Candidates are tried in stop-id order.
    pub fn find_stop_by_name(&self, query: &str) -> Option<StopId> {
        let mut wanted = query.trim().to_uppercase().replace(',', "");
        if let Some(cut) = wanted.find("STATION") {
            wanted.truncate(cut);
        }
        let wanted = wanted.trim();
        if wanted.is_empty() {
            return None;
        }

        if let Some(id) = self.stop_ids.get(wanted) {
            return Some(*id);
        }
        if let Some(stop) = self
            .stops
            .iter()
            .find(|s| wanted.contains(s.name.as_str()) || s.name.contains(wanted))
        {
            return Some(stop.id);
        }

        let prefix: String = wanted.chars().take(3).collect();
        if prefix.chars().count() < 3 {
            return None;
        }
        self.stops
            .iter()
            .find(|s| s.name.chars().count() >= 3 && s.name.starts_with(&prefix))
            .map(|s| s.id)
    }

    /// Closest stop with coordinates within `max_distance_km` of `point`.
    pub fn nearest_stop(&self, point: Coordinates, max_distance_km: f64) -> Option<(StopId, f64)> {
        let mut best: Option<(StopId, f64)> = None;
        for stop in self.stops.iter().filter(|s| s.has_coordinates()) {
            let distance = haversine_km(point, stop.location);
            if distance > max_distance_km {
                continue;
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((stop.id, distance));
            }
        }
        best
    }
}
