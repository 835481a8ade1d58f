//! Query orchestration.
//!
//! Resolves endpoints, the service day and the trip filter, picks an engine,
//! reconstructs the journey and enforces the walking budget. Coordinate
//! endpoints get synthetic walks to and from the snapped stops.

use tracing::{debug, warn};

use crate::calendar::resolve_day_type;
use crate::domain::{Coordinates, DayType, ServiceTime, StopId, TimeError};
use crate::geo::{haversine_km, walk_minutes};
use crate::graph::TransitGraph;

use super::config::PlannerConfig;
use super::csa::ConnectionScan;
use super::itinerary::{Itinerary, PathStep};
use super::preferences::{PreferenceError, QueryPreferences};
use super::raptor::RoundBased;
use super::reconstruct::reconstruct;
use super::state::{Algorithm, SearchEngine, SearchRequest, ServiceFilter, WalkLimits};

/// Name of the synthetic step at a coordinate origin.
pub const START_LOCATION: &str = "Start location";

/// Name of the synthetic step at a coordinate destination.
pub const DESTINATION: &str = "Destination";

/// Error from journey planning. "No route" is not an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("unknown stop: {0}")]
    UnknownStop(String),

    #[error("no stop within walking distance of ({lat}, {lon})")]
    NoNearbyStop { lat: f64, lon: f64 },

    #[error("invalid preferences: {0}")]
    InvalidPreferences(#[from] PreferenceError),

    #[error(transparent)]
    InvalidTime(#[from] TimeError),

    #[error("internal planner error: {0}")]
    Internal(String),
}

impl PlanError {
    /// True for errors caused by the caller's input.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, PlanError::Internal(_))
    }
}

/// Where a journey starts or ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// A stop name, matched forgivingly.
    Stop(String),
    /// A point, snapped to the nearest stop within walking distance.
    Point(Coordinates),
}

/// One journey request.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyQuery {
    pub from: Endpoint,
    pub to: Endpoint,
    /// "HH:MM", hours past 23 allowed.
    pub departure: String,
    /// ISO date or free text; only used to pick the day type.
    pub date: String,
    pub preferences: QueryPreferences,
}

impl JourneyQuery {
    pub fn between_stops(from: &str, to: &str, departure: &str, date: &str) -> Self {
        Self {
            from: Endpoint::Stop(from.to_string()),
            to: Endpoint::Stop(to.to_string()),
            departure: departure.to_string(),
            date: date.to_string(),
            preferences: QueryPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: QueryPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// The answer to a [`JourneyQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyPlan {
    pub itinerary: Itinerary,
    pub algorithm: Algorithm,
    pub day_type: DayType,
}

/// Plans journeys over one graph snapshot.
pub struct JourneyPlanner<'a> {
    graph: &'a TransitGraph,
    config: PlannerConfig,
}

impl<'a> JourneyPlanner<'a> {
    pub fn new(graph: &'a TransitGraph, config: PlannerConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan the single fastest journey for `query`.
    ///
    /// Unresolvable endpoints and malformed times are errors; an exhausted
    /// search or a journey over the walking budget is an empty itinerary.
    pub fn plan(&self, query: &JourneyQuery) -> Result<JourneyPlan, PlanError> {
        let departure = ServiceTime::parse_hhmm(&query.departure)?;
        let day_type = resolve_day_type(&query.date);
        let prefs = &query.preferences;

        let source = self.resolve_endpoint(&query.from, prefs)?;
        let target = self.resolve_endpoint(&query.to, prefs)?;

        let algorithm = if prefs.is_specified() {
            Algorithm::ConnectionScan
        } else {
            Algorithm::RoundBased
        };
        debug!(
            algorithm = algorithm.as_str(),
            day_type = day_type.as_str(),
            %departure,
            "planning journey"
        );

        let origin_walk = self.endpoint_walk(&query.from, source, prefs)?;
        let destination_walk = self.endpoint_walk(&query.to, target, prefs)?;

        // The rider reaches the source stop only after the origin walk.
        let search_departure = origin_walk.map_or(departure, |(_, km)| {
            departure + walk_minutes(km, self.config.walking_speed_kmh)
        });
        let request = SearchRequest {
            source,
            target,
            departure: search_departure,
            filter: match algorithm {
                Algorithm::ConnectionScan => ServiceFilter::with_preferences(day_type, prefs),
                Algorithm::RoundBased => ServiceFilter::for_day(day_type),
            },
            limits: WalkLimits::from_preferences(prefs, self.config.walk_epsilon),
            origin_walk_km: origin_walk.map_or(0.0, |(_, km)| km),
        };
        let mut itinerary = self.plan_between(&request, algorithm)?;

        if !itinerary.is_empty() {
            if let Some((point, km)) = origin_walk {
                itinerary = self.with_origin_walk(itinerary, source, point, km);
            }
            if let Some((point, km)) = destination_walk {
                itinerary = self.with_destination_walk(itinerary, target, point, km);
            }
            if !self.within_walking_budget(&itinerary, prefs) {
                warn!(
                    total_km = itinerary.walking_km(),
                    "discarding journey whose endpoint walks exceed the walking budget"
                );
                itinerary = Itinerary::empty();
            }
        }

        Ok(JourneyPlan {
            itinerary,
            algorithm,
            day_type,
        })
    }

    /// Run one engine for `request` and check the walking budget of the
    /// stop-to-stop journey.
    pub fn plan_between(
        &self,
        request: &SearchRequest,
        algorithm: Algorithm,
    ) -> Result<Itinerary, PlanError> {
        if !self.graph.trips().iter().any(|trip| request.filter.admits(trip)) {
            debug!(
                day_type = request.filter.day_type.as_str(),
                "no trips run on this day"
            );
            return Ok(Itinerary::empty());
        }

        let labels = match algorithm {
            Algorithm::RoundBased => {
                RoundBased::new(self.config.max_rounds).search(self.graph, request)
            }
            Algorithm::ConnectionScan => ConnectionScan.search(self.graph, request),
        };

        let (source, target) = (request.source, request.target);
        let itinerary = reconstruct(self.graph, &labels, source, target, request.departure)
            .map_err(|e| PlanError::Internal(e.to_string()))?;
        if itinerary.is_empty() {
            return Ok(itinerary);
        }

        let walked = labels.walking_stats(source, target);
        if !request.limits.permits(&walked) {
            warn!(
                total_km = walked.total_km,
                max_consecutive_km = walked.max_consecutive_km,
                "discarding journey over the walking budget"
            );
            return Ok(Itinerary::empty());
        }
        Ok(itinerary)
    }

    /// Every walking run and the walking total within the caps.
    fn within_walking_budget(&self, itinerary: &Itinerary, prefs: &QueryPreferences) -> bool {
        let eps = self.config.walk_epsilon;
        itinerary.walking_km() <= prefs.max_cumulative_walk_km() + eps
            && itinerary
                .walking_runs_km()
                .iter()
                .all(|&run| run <= prefs.max_consecutive_walk_km() + eps)
    }

    fn resolve_endpoint(
        &self,
        endpoint: &Endpoint,
        prefs: &QueryPreferences,
    ) -> Result<StopId, PlanError> {
        match endpoint {
            Endpoint::Stop(name) => self
                .graph
                .find_stop_by_name(name)
                .ok_or_else(|| PlanError::UnknownStop(name.clone())),
            Endpoint::Point(point) => {
                let radius = if prefs.allows_walking() {
                    self.config
                        .stop_lookup_km
                        .min(prefs.max_consecutive_walk_km().max(0.0))
                } else {
                    0.0
                };
                self.graph
                    .nearest_stop(*point, radius)
                    .map(|(stop, _)| stop)
                    .ok_or(PlanError::NoNearbyStop {
                        lat: point.lat,
                        lon: point.lon,
                    })
            }
        }
    }

    /// The point and walking distance of a coordinate endpoint, if it
    /// deserves a walking leg to or from `stop`.
    fn endpoint_walk(
        &self,
        endpoint: &Endpoint,
        stop: StopId,
        prefs: &QueryPreferences,
    ) -> Result<Option<(Coordinates, f64)>, PlanError> {
        let Endpoint::Point(point) = *endpoint else {
            return Ok(None);
        };
        if !prefs.allows_walking() {
            return Ok(None);
        }
        let stop = self
            .graph
            .stop(stop)
            .ok_or_else(|| PlanError::Internal(format!("unknown stop {stop}")))?;
        let distance = haversine_km(point, stop.location);
        let eps = self.config.walk_epsilon;
        if distance < self.config.endpoint_walk_threshold_km
            || distance > prefs.max_consecutive_walk_km() + eps
            || distance > prefs.max_cumulative_walk_km() + eps
        {
            return Ok(None);
        }
        Ok(Some((point, distance)))
    }

    fn with_origin_walk(
        &self,
        itinerary: Itinerary,
        source: StopId,
        point: Coordinates,
        distance: f64,
    ) -> Itinerary {
        let (Some(stop), Some(first)) = (self.graph.stop(source), itinerary.first()) else {
            return itinerary;
        };
        let board = first.time;
        let minutes = walk_minutes(distance, self.config.walking_speed_kmh);

        let mut steps = vec![
            PathStep::walk_point(
                START_LOCATION,
                point,
                board.saturating_minus_minutes(minutes),
                distance,
            ),
            PathStep::walk(stop, board, distance),
        ];
        steps.extend(itinerary.into_steps());
        Itinerary::new(steps)
    }

    fn with_destination_walk(
        &self,
        itinerary: Itinerary,
        target: StopId,
        point: Coordinates,
        distance: f64,
    ) -> Itinerary {
        let (Some(stop), Some(last)) = (self.graph.stop(target), itinerary.last()) else {
            return itinerary;
        };
        let arrive = last.time;
        let minutes = walk_minutes(distance, self.config.walking_speed_kmh);

        let mut steps = itinerary.into_steps();
        steps.push(PathStep::walk(stop, arrive, distance));
        steps.push(PathStep::walk_point(DESTINATION, point, arrive + minutes, distance));
        Itinerary::new(steps)
    }
}
