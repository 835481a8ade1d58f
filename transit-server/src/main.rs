use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_server::config::ServerConfig;
use transit_server::snapshot::{NetworkHandle, NetworkSource};
use transit_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // Fail fast: serving without a network is pointless
    info!(data_dir = %config.data_dir.display(), "loading transit network");
    let source = NetworkSource::new(&config.data_dir, config.planner.build_options());
    let network = match NetworkHandle::load(source).await {
        Ok(network) => network,
        Err(e) => {
            error!(error = %e, "failed to load transit network");
            return ExitCode::FAILURE;
        }
    };

    let app = create_router(AppState::new(network, config.planner));

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind = %config.bind, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Transit journey planner listening on http://{} (GET /health, /stops, /journey; POST /admin/reload)",
        config.bind
    );

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
