//! Incremental construction of a [`TransitGraph`].
//!
//! The loader feeds coordinate tables and trip records in a fixed order;
//! the builder assigns stop ids, resolves coordinates as each stop is first
//! seen, maintains the route indexes and flags routes that touch a stop
//! without coordinates. [`GraphBuilder::build`] purges flagged routes and
//! derives the walking graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use super::TransitGraph;
use super::coords::{CoordinateTable, MatchPolicy};
use super::walking::WalkingGraph;
use crate::domain::{
    Coordinates, DayType, Route, ServiceTime, Stop, StopId, StopTime, TransportMode, Trip,
    normalize_stop_name,
};
use crate::geo::DEFAULT_WALKING_SPEED_KMH;

/// Knobs for graph construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Stops further apart than this get no walking edge.
    pub walk_radius_km: f64,
    pub walking_speed_kmh: f64,
    pub match_policy: MatchPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            walk_radius_km: 0.8,
            walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
            match_policy: MatchPolicy::default(),
        }
    }
}

/// One parsed timetable row.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub id: String,
    pub base_id: String,
    pub route: String,
    pub day_type: DayType,
    pub mode: TransportMode,
    /// Stop names with their times, in column order.
    pub calls: Vec<(String, ServiceTime)>,
    /// Inbound rows list stops in the opposite direction of travel.
    pub reversed: bool,
}

/// Result of dropping routes with unresolved stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub routes: Vec<String>,
    pub trips_removed: usize,
}

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    options: BuildOptions,
    coordinates: CoordinateTable,
    stop_ids: HashMap<String, StopId>,
    stops: Vec<Stop>,
    routes: BTreeMap<String, Route>,
    stop_routes: Vec<Vec<String>>,
    trips: Vec<Trip>,
    trip_positions: HashMap<String, usize>,
    invalid_routes: BTreeSet<String>,
}

impl GraphBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            coordinates: CoordinateTable::new(options.match_policy),
            options,
            stop_ids: HashMap::new(),
            stops: Vec::new(),
            routes: BTreeMap::new(),
            stop_routes: Vec::new(),
            trips: Vec::new(),
            trip_positions: HashMap::new(),
            invalid_routes: BTreeSet::new(),
        }
    }

    /// Coordinate sources consulted when a stop is first seen.
    ///
    /// Stops already created keep the coordinates they resolved to.
    pub fn coordinates_mut(&mut self) -> &mut CoordinateTable {
        &mut self.coordinates
    }

    /// Id for a stop name, creating the stop on first sight.
    pub fn stop_for(&mut self, raw_name: &str) -> StopId {
        let name = normalize_stop_name(raw_name);
        if let Some(id) = self.stop_ids.get(&name) {
            return *id;
        }

        let location = self
            .coordinates
            .resolve(&name)
            .unwrap_or(Coordinates::UNRESOLVED);
        let id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            id,
            name: name.clone(),
            location,
        });
        self.stop_routes.push(Vec::new());
        self.stop_ids.insert(name, id);
        id
    }

    /// Make sure a route exists, recording its operator if given.
    ///
    /// Returns the normalized route key, or `None` for a blank id.
    pub fn register_route(&mut self, route_id: &str, operator: Option<&str>) -> Option<String> {
        let key = route_id.trim();
        if key.is_empty() {
            return None;
        }
        let route = self
            .routes
            .entry(key.to_string())
            .or_insert_with(|| Route::new(key));
        if let Some(operator) = operator.map(|o| o.trim().to_uppercase()) {
            if !operator.is_empty() {
                route.operator = Some(operator);
            }
        }
        Some(key.to_string())
    }

    /// Add one timetable row. Rows with no calls are dropped; a later row with
    /// the same trip id replaces an earlier one.
    pub fn add_trip(&mut self, record: TripRecord) {
        let Some(route_key) = self.register_route(&record.route, None) else {
            warn!(trip = %record.id, "skipping trip without a route id");
            return;
        };
        if record.calls.is_empty() {
            return;
        }

        let mut stop_times = Vec::with_capacity(record.calls.len());
        for (name, time) in &record.calls {
            let stop = self.stop_for(name);
            if !self.stops[stop.index()].has_coordinates() {
                self.invalid_routes.insert(route_key.clone());
            }
            if let Some(route) = self.routes.get_mut(&route_key) {
                route.add_stop(stop);
            }
            let serving = &mut self.stop_routes[stop.index()];
            if !serving.contains(&route_key) {
                serving.push(route_key.clone());
            }
            stop_times.push(StopTime::new(stop, *time));
        }
        if record.reversed {
            stop_times.reverse();
        }

        let trip = Trip {
            id: record.id,
            base_id: record.base_id,
            route: route_key,
            day_type: record.day_type,
            mode: record.mode,
            stop_times,
        };
        match self.trip_positions.get(&trip.id) {
            Some(&pos) => self.trips[pos] = trip,
            None => {
                self.trip_positions.insert(trip.id.clone(), self.trips.len());
                self.trips.push(trip);
            }
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Routes that serve at least one stop without coordinates.
    pub fn invalid_routes(&self) -> impl Iterator<Item = &str> {
        self.invalid_routes.iter().map(String::as_str)
    }

    pub fn is_route_invalid(&self, route_id: &str) -> bool {
        self.invalid_routes.contains(route_id.trim())
    }

    /// Remove flagged routes, their trips and their entries in the
    /// stop-to-route index.
    pub fn purge_invalid_routes(&mut self) -> PurgeReport {
        if self.invalid_routes.is_empty() {
            return PurgeReport::default();
        }
        let dropped = std::mem::take(&mut self.invalid_routes);

        for route in &dropped {
            self.routes.remove(route);
        }
        for serving in &mut self.stop_routes {
            serving.retain(|r| !dropped.contains(r));
        }

        let before = self.trips.len();
        self.trips.retain(|t| !dropped.contains(&t.route));
        self.trip_positions = self
            .trips
            .iter()
            .enumerate()
            .map(|(pos, t)| (t.id.clone(), pos))
            .collect();

        let report = PurgeReport {
            routes: dropped.into_iter().collect(),
            trips_removed: before - self.trips.len(),
        };
        warn!(
            routes = ?report.routes,
            trips_removed = report.trips_removed,
            "dropped routes with missing coordinates"
        );
        report
    }

    /// Purge invalid routes and freeze the graph.
    pub fn build(mut self) -> TransitGraph {
        let report = self.purge_invalid_routes();
        let walking = WalkingGraph::build(
            &self.stops,
            self.options.walk_radius_km,
            self.options.walking_speed_kmh,
        );

        let mut per_day: BTreeMap<DayType, usize> = BTreeMap::new();
        for trip in &self.trips {
            *per_day.entry(trip.day_type).or_default() += 1;
        }
        info!(
            stops = self.stops.len(),
            routes = self.routes.len(),
            trips = self.trips.len(),
            ?per_day,
            walking_edges = walking.len(),
            "transit graph built"
        );

        TransitGraph::from_parts(
            self.stops,
            self.routes,
            self.stop_routes,
            self.trips,
            walking,
            report.routes,
        )
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}
