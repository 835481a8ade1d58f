//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Local;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::planner::{JourneyPlanner, PlanError};
use crate::snapshot::ReloadError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stops", get(list_stops))
        .route("/journey", get(plan_journey))
        .route("/admin/reload", post(reload_network))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All known stops, sorted by name.
async fn list_stops(State(state): State<AppState>) -> Json<StopsResponse> {
    let graph = state.network.snapshot().await;
    Json(StopsResponse::from_graph(&graph))
}

/// Plan the fastest journey.
async fn plan_journey(
    State(state): State<AppState>,
    Query(params): Query<JourneyParams>,
) -> Result<Json<JourneyResponse>, AppError> {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let query = params.into_query(&state.planner, &today)?;

    let graph = state.network.snapshot().await;
    let plan = JourneyPlanner::new(&graph, state.planner).plan(&query)?;

    Ok(Json(JourneyResponse::from_plan(&plan, &graph)))
}

/// Rebuild the network from disk.
async fn reload_network(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let stats = state.network.reload().await?;
    Ok(Json(stats.into()))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Conflict { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        let message = e.to_string();
        match e {
            PlanError::Internal(_) => AppError::Internal { message },
            _ => AppError::BadRequest { message },
        }
    }
}

impl From<ReloadError> for AppError {
    fn from(e: ReloadError) -> Self {
        let message = e.to_string();
        match e {
            ReloadError::InProgress => AppError::Conflict { message },
            ReloadError::Load(_) | ReloadError::Join(_) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::graph::BuildOptions;
    use crate::planner::PlannerConfig;
    use crate::planner::testing::Network;
    use crate::snapshot::{NetworkHandle, NetworkSource};

    fn app(data_dir: &TempDir) -> Router {
        let graph = Network::new()
            .stop_at("Cape Town", -33.9225, 18.4257)
            .stop_at("Woodstock", -33.9262, 18.4468)
            .stop_at("Salt River", -33.9275, 18.4640)
            .trip(
                "0101_WEEKDAY",
                "SOUTHERN",
                &[("Cape Town", "08:00"), ("Woodstock", "08:05"), ("Salt River", "08:09")],
            )
            .build();
        let source = NetworkSource::new(data_dir.path(), BuildOptions::default());
        let state = AppState::new(
            NetworkHandle::from_graph(graph, source),
            PlannerConfig::default(),
        );
        create_router(state)
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = TempDir::new().unwrap();
        let response = app(&dir)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn stops_are_listed_by_name() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(app(&dir), "GET", "/stops").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["stops"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["CAPE TOWN", "SALT RIVER", "WOODSTOCK"]);
    }

    #[tokio::test]
    async fn journey_between_named_stops() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(
            app(&dir),
            "GET",
            "/journey?from=Cape%20Town%20Station&to=salt%20river&time=07:50&date=2024-06-12",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["algorithm"], "RAPTOR");
        assert_eq!(body["dayType"], "WEEKDAY");

        let route = &body["routes"][0];
        assert_eq!(route["steps"].as_array().unwrap().len(), 3);
        assert_eq!(route["summary"]["start"], "08:00");
        assert_eq!(route["summary"]["end"], "08:09");
        assert_eq!(route["summary"]["transfers"], 0);
        assert_eq!(route["legs"][0]["operator"], "METRORAIL");
        assert_eq!(route["steps"][0]["mode"], "TRAIN");
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn no_route_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(
            app(&dir),
            "GET",
            "/journey?from=Salt%20River&to=Cape%20Town&time=07:50&date=2024-06-12",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["routes"].as_array().unwrap().is_empty());
        assert_eq!(body["message"], NO_ROUTE_MESSAGE);
    }

    #[tokio::test]
    async fn preferences_switch_engine() {
        let dir = TempDir::new().unwrap();
        let (status, body) = call(
            app(&dir),
            "GET",
            "/journey?from=Cape%20Town&to=Woodstock&time=07:50&date=2024-06-12&modes=train",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["algorithm"], "CSA");
        assert_eq!(body["routes"][0]["summary"]["end"], "08:05");
    }

    #[tokio::test]
    async fn input_errors_are_bad_requests() {
        let dir = TempDir::new().unwrap();
        for uri in [
            "/journey?from=Atlantis&to=Woodstock&time=08:00",
            "/journey?from=Cape%20Town&to=Woodstock",
            "/journey?from=Cape%20Town&to=Woodstock&time=8am",
            "/journey?from=Cape%20Town&to=Woodstock&time=08:00&modes=ferry",
            "/journey?fromLat=-30.0&fromLng=18.0&to=Woodstock&time=08:00",
        ] {
            let (status, body) = call(app(&dir), "GET", uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn failed_reload_keeps_serving() {
        let dir = TempDir::new().unwrap();
        let router = app(&dir);

        let (status, body) = call(router.clone(), "POST", "/admin/reload").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("metrorail-stations.csv"));

        let (status, body) = call(router, "GET", "/stops").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stops"].as_array().unwrap().len(), 3);
    }
}
