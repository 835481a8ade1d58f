//! Itinerary types.
//!
//! An [`Itinerary`] is the rider-facing answer to a query: a forward-ordered
//! list of stop/time steps. Walks contribute two steps each (origin and
//! destination of the footpath), rides one step per call.

use crate::domain::{Coordinates, ServiceTime, Stop, StopId, TransportMode, Trip};
use crate::graph::TransitGraph;

/// Trip id carried by walking steps.
pub const WALK_TRIP_ID: &str = "WALK";

/// Trip id of the synthetic first step.
pub const SOURCE_TRIP_ID: &str = "SOURCE";

/// Operator shown for train legs whose route has none recorded.
pub const DEFAULT_TRAIN_OPERATOR: &str = "METRORAIL";

/// How a step was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepMode {
    Transit(TransportMode),
    Walk,
    Source,
}

impl StepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepMode::Transit(mode) => mode.as_str(),
            StepMode::Walk => "WALK",
            StepMode::Source => "SOURCE",
        }
    }
}

/// One stop (or endpoint) of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub trip_id: String,
    /// `None` for coordinate endpoints that are not stops.
    pub stop_id: Option<StopId>,
    pub stop_name: String,
    pub time: ServiceTime,
    pub location: Coordinates,
    pub walking: bool,
    /// Length of the walk this step belongs to, zero when riding.
    pub walk_distance_km: f64,
    pub mode: StepMode,
    pub route: Option<String>,
}

impl PathStep {
    /// A call of `trip` at `stop`.
    pub fn ride(trip: &Trip, stop: &Stop, time: ServiceTime) -> Self {
        Self {
            trip_id: trip.id.clone(),
            stop_id: Some(stop.id),
            stop_name: stop.name.clone(),
            time,
            location: stop.location,
            walking: false,
            walk_distance_km: 0.0,
            mode: StepMode::Transit(trip.mode),
            route: Some(trip.route.clone()),
        }
    }

    /// One end of a footpath at `stop`.
    pub fn walk(stop: &Stop, time: ServiceTime, distance_km: f64) -> Self {
        Self {
            stop_id: Some(stop.id),
            ..Self::walk_point(&stop.name, stop.location, time, distance_km)
        }
    }

    /// One end of a walk at an arbitrary point.
    pub fn walk_point(
        name: &str,
        location: Coordinates,
        time: ServiceTime,
        distance_km: f64,
    ) -> Self {
        Self {
            trip_id: WALK_TRIP_ID.to_string(),
            stop_id: None,
            stop_name: name.to_string(),
            time,
            location,
            walking: true,
            walk_distance_km: distance_km,
            mode: StepMode::Walk,
            route: None,
        }
    }

    /// The synthetic origin step.
    pub fn source(stop: &Stop, time: ServiceTime) -> Self {
        Self {
            trip_id: SOURCE_TRIP_ID.to_string(),
            stop_id: Some(stop.id),
            stop_name: stop.name.clone(),
            time,
            location: stop.location,
            walking: false,
            walk_distance_km: 0.0,
            mode: StepMode::Source,
            route: None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.mode == StepMode::Source
    }
}

/// Headline numbers for an itinerary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub start: ServiceTime,
    pub end: ServiceTime,
    pub duration_minutes: u32,
    pub transfers: usize,
    pub walking_km: f64,
}

/// A stop visited during a leg.
#[derive(Debug, Clone, PartialEq)]
pub struct LegStop {
    pub name: String,
    pub time: ServiceTime,
    pub location: Coordinates,
}

/// Consecutive steps sharing a trip id.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub trip_id: String,
    pub mode: StepMode,
    pub operator: Option<String>,
    pub line: String,
    pub start_stop: String,
    pub start_time: ServiceTime,
    pub end_stop: String,
    pub end_time: ServiceTime,
    pub duration_minutes: u32,
    pub walk_km: f64,
    pub stops: Vec<LegStop>,
}

impl Leg {
    pub fn is_walk(&self) -> bool {
        self.mode == StepMode::Walk
    }
}

/// An ordered journey; empty means no route was found.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Itinerary {
    steps: Vec<PathStep>,
}

impl Itinerary {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<PathStep> {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn first(&self) -> Option<&PathStep> {
        self.steps.first()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// Total walking distance. Each footpath appears as a pair of steps
    /// carrying its length, so only the second of each pair is counted.
    pub fn walking_km(&self) -> f64 {
        walked_km(&self.steps)
    }

    /// Lengths of the maximal unbroken walking runs, in order.
    pub fn walking_runs_km(&self) -> Vec<f64> {
        self.steps
            .chunk_by(|a, b| a.walking == b.walking)
            .filter(|run| run.first().is_some_and(|s| s.walking))
            .map(walked_km)
            .collect()
    }

    pub fn summary(&self) -> Option<Summary> {
        let start = self.first()?.time;
        let end = self.last()?.time;
        let transit_legs = self
            .steps
            .chunk_by(|a, b| a.trip_id == b.trip_id)
            .filter(|run| matches!(run[0].mode, StepMode::Transit(_)))
            .count();
        Some(Summary {
            start,
            end,
            duration_minutes: end.minutes_since(start).unwrap_or(0),
            transfers: transit_legs.saturating_sub(1),
            walking_km: self.walking_km(),
        })
    }

    /// Group steps into legs. The synthetic source step is not a leg.
    pub fn legs(&self, graph: &TransitGraph) -> Vec<Leg> {
        self.steps
            .chunk_by(|a, b| a.trip_id == b.trip_id)
            .filter(|run| !run[0].is_source())
            .map(|run| build_leg(run, graph))
            .collect()
    }
}

fn walked_km(steps: &[PathStep]) -> f64 {
    steps
        .chunk_by(|a, b| a.walking == b.walking)
        .filter(|run| run[0].walking)
        .flat_map(|run| run.iter().skip(1).step_by(2))
        .map(|s| s.walk_distance_km)
        .sum()
}

fn build_leg(run: &[PathStep], graph: &TransitGraph) -> Leg {
    let first = &run[0];
    let last = &run[run.len() - 1];

    let operator = match first.mode {
        StepMode::Transit(mode) => first
            .route
            .as_deref()
            .and_then(|route| graph.route_operator(route))
            .map(str::to_string)
            .or_else(|| (mode == TransportMode::Train).then(|| DEFAULT_TRAIN_OPERATOR.to_string())),
        StepMode::Walk | StepMode::Source => None,
    };

    Leg {
        trip_id: first.trip_id.clone(),
        mode: first.mode,
        operator,
        line: line_for(&first.trip_id),
        start_stop: first.stop_name.clone(),
        start_time: first.time,
        end_stop: last.stop_name.clone(),
        end_time: last.time,
        duration_minutes: last.time.minutes_since(first.time).unwrap_or(0),
        walk_km: walked_km(run),
        stops: run
            .iter()
            .map(|s| LegStop {
                name: s.stop_name.clone(),
                time: s.time,
                location: s.location,
            })
            .collect(),
    }
}

/// Rider-facing line label: the route number for `BUS_{route}_...` trips,
/// otherwise the trip id itself.
fn line_for(trip_id: &str) -> String {
    if let Some(rest) = trip_id.strip_prefix("BUS_") {
        if let Some(route) = rest.split('_').next().filter(|r| !r.is_empty()) {
            return route.to_string();
        }
    }
    trip_id.to_string()
}
