//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinates, Stop};
use crate::graph::{GraphStats, TransitGraph};
use crate::planner::{
    Endpoint, Itinerary, JourneyPlan, JourneyQuery, Leg, PathStep, PlannerConfig,
    QueryPreferences, Summary,
};

use super::routes::AppError;

/// Message sent alongside an empty route list.
pub const NO_ROUTE_MESSAGE: &str = "No route found";

/// Query parameters of `GET /journey`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyParams {
    /// Origin stop name
    pub from: Option<String>,
    /// Destination stop name
    pub to: Option<String>,
    pub from_lat: Option<f64>,
    pub from_lng: Option<f64>,
    pub to_lat: Option<f64>,
    pub to_lng: Option<f64>,
    /// Departure time, "HH:MM"
    pub time: Option<String>,
    /// Service date; ISO dates pick weekday, weekend or holiday service
    pub date: Option<String>,
    /// Comma-separated allow-list, e.g. "bus,train"
    pub modes: Option<String>,
    pub max_walk_meters: Option<String>,
}

impl JourneyParams {
    /// Validate the parameters into a planner query. `today` is used when
    /// no date is given.
    pub fn into_query(self, config: &PlannerConfig, today: &str) -> Result<JourneyQuery, AppError> {
        let from = endpoint("origin", self.from, self.from_lat, self.from_lng)?;
        let to = endpoint("destination", self.to, self.to_lat, self.to_lng)?;
        let departure = self
            .time
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest {
                message: "missing departure time".to_string(),
            })?;
        let date = self
            .date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| today.to_string());

        let preferences = QueryPreferences::from_raw_inputs(
            self.modes.as_deref(),
            self.max_walk_meters.as_deref(),
            config.max_consecutive_walk_km,
            config.max_cumulative_walk_km,
        )
        .map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;

        Ok(JourneyQuery {
            from,
            to,
            departure,
            date,
            preferences,
        })
    }
}

/// Coordinates win over a name when both are given.
fn endpoint(
    which: &str,
    name: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Endpoint, AppError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
            return Ok(Endpoint::Point(Coordinates::new(lat, lng)));
        }
        (None, None) => {}
        _ => {
            return Err(AppError::BadRequest {
                message: format!("{which} needs both a latitude and a longitude"),
            });
        }
    }
    name.filter(|n| !n.trim().is_empty())
        .map(Endpoint::Stop)
        .ok_or_else(|| AppError::BadRequest {
            message: format!("missing {which}"),
        })
}

/// Response of `GET /journey`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    pub routes: Vec<RouteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub algorithm: &'static str,
    pub day_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub summary: SummaryResult,
    pub steps: Vec<StepResult>,
    pub legs: Vec<LegResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub start: String,
    pub end: String,
    pub duration_minutes: u32,
    pub transfers: usize,
    pub walking_km: f64,
    pub day_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub trip_id: String,
    /// Absent for coordinate endpoints
    pub stop_id: Option<u32>,
    pub stop_name: String,
    pub time: String,
    pub lat: f64,
    pub lon: f64,
    pub walking: bool,
    pub walk_distance_km: f64,
    pub mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegResult {
    pub trip_id: String,
    pub mode: &'static str,
    pub operator: Option<String>,
    pub line: String,
    pub start_stop: String,
    pub start_time: String,
    pub end_stop: String,
    pub end_time: String,
    pub duration_minutes: u32,
    pub walk_km: f64,
    pub stops: Vec<LegStopResult>,
}

#[derive(Debug, Serialize)]
pub struct LegStopResult {
    pub name: String,
    pub time: String,
    pub lat: f64,
    pub lon: f64,
}

/// Response of `GET /stops`.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<StopResult>,
}

#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: u32,
    pub name: String,
    /// Absent when the stop has no known coordinates
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Response of `POST /admin/reload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub stops: usize,
    pub routes: usize,
    pub trips: usize,
    pub walking_edges: usize,
    pub purged_routes: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl JourneyResponse {
    pub fn from_plan(plan: &JourneyPlan, graph: &TransitGraph) -> Self {
        let day_type = plan.day_type.as_str();
        let routes: Vec<RouteResult> = RouteResult::from_itinerary(&plan.itinerary, graph, day_type)
            .into_iter()
            .collect();
        let message = routes.is_empty().then(|| NO_ROUTE_MESSAGE.to_string());

        Self {
            routes,
            message,
            algorithm: plan.algorithm.as_str(),
            day_type,
        }
    }
}

impl RouteResult {
    /// `None` for an empty itinerary.
    pub fn from_itinerary(
        itinerary: &Itinerary,
        graph: &TransitGraph,
        day_type: &'static str,
    ) -> Option<Self> {
        let summary = itinerary.summary()?;
        Some(Self {
            summary: SummaryResult::from_summary(&summary, day_type),
            steps: itinerary.steps().iter().map(StepResult::from_step).collect(),
            legs: itinerary.legs(graph).iter().map(LegResult::from_leg).collect(),
        })
    }
}

impl SummaryResult {
    pub fn from_summary(summary: &Summary, day_type: &'static str) -> Self {
        Self {
            start: summary.start.to_string(),
            end: summary.end.to_string(),
            duration_minutes: summary.duration_minutes,
            transfers: summary.transfers,
            walking_km: round_km(summary.walking_km),
            day_type,
        }
    }
}

impl StepResult {
    pub fn from_step(step: &PathStep) -> Self {
        Self {
            trip_id: step.trip_id.clone(),
            stop_id: step.stop_id.map(|id| id.0),
            stop_name: step.stop_name.clone(),
            time: step.time.to_string(),
            lat: step.location.lat,
            lon: step.location.lon,
            walking: step.walking,
            walk_distance_km: round_km(step.walk_distance_km),
            mode: step.mode.as_str(),
        }
    }
}

impl LegResult {
    pub fn from_leg(leg: &Leg) -> Self {
        Self {
            trip_id: leg.trip_id.clone(),
            mode: leg.mode.as_str(),
            operator: leg.operator.clone(),
            line: leg.line.clone(),
            start_stop: leg.start_stop.clone(),
            start_time: leg.start_time.to_string(),
            end_stop: leg.end_stop.clone(),
            end_time: leg.end_time.to_string(),
            duration_minutes: leg.duration_minutes,
            walk_km: round_km(leg.walk_km),
            stops: leg
                .stops
                .iter()
                .map(|s| LegStopResult {
                    name: s.name.clone(),
                    time: s.time.to_string(),
                    lat: s.location.lat,
                    lon: s.location.lon,
                })
                .collect(),
        }
    }
}

impl StopsResponse {
    /// Every stop, sorted by name.
    pub fn from_graph(graph: &TransitGraph) -> Self {
        let mut stops: Vec<StopResult> = graph.stops().iter().map(StopResult::from_stop).collect();
        stops.sort_by(|a, b| a.name.cmp(&b.name));
        Self { stops }
    }
}

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        let resolved = stop.has_coordinates();
        Self {
            id: stop.id.0,
            name: stop.name.clone(),
            lat: resolved.then_some(stop.location.lat),
            lon: resolved.then_some(stop.location.lon),
        }
    }
}

impl From<GraphStats> for ReloadResponse {
    fn from(stats: GraphStats) -> Self {
        Self {
            stops: stats.stops,
            routes: stats.routes,
            trips: stats.trips,
            walking_edges: stats.walking_edges,
            purged_routes: stats.purged_routes,
        }
    }
}

/// Metres precision is plenty for display.
fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}
