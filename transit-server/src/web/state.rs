//! Application state for the web layer.

use crate::planner::PlannerConfig;
use crate::snapshot::NetworkHandle;

/// Shared application state.
///
/// Handlers take a snapshot of the network per request, so a reload never
/// changes the graph under a running query.
#[derive(Clone)]
pub struct AppState {
    /// Published network snapshot
    pub network: NetworkHandle,

    /// Journey planner configuration
    pub planner: PlannerConfig,
}

impl AppState {
    /// Create a new app state.
    pub fn new(network: NetworkHandle, planner: PlannerConfig) -> Self {
        Self { network, planner }
    }
}
