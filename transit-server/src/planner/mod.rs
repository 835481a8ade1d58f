//! Earliest-arrival journey planning.
//!
//! Two interchangeable engines answer the same question over an immutable
//! [`TransitGraph`](crate::graph::TransitGraph): a round-based search used
//! for default queries and a connection scan used when the rider restricts
//! modes or walking. Both leave per-stop labels and a predecessor arena,
//! which [`reconstruct`] turns into an [`Itinerary`].

mod config;
mod csa;
mod itinerary;
mod preferences;
mod query;
mod raptor;
mod reconstruct;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PlannerConfig;
pub use csa::{Connection, ConnectionScan, connections};
pub use itinerary::{
    DEFAULT_TRAIN_OPERATOR, Itinerary, Leg, LegStop, PathStep, SOURCE_TRIP_ID, StepMode, Summary,
    WALK_TRIP_ID,
};
pub use preferences::{PreferenceError, QueryPreferences};
pub use query::{
    DESTINATION, Endpoint, JourneyPlan, JourneyPlanner, JourneyQuery, PlanError, START_LOCATION,
};
pub use raptor::RoundBased;
pub use reconstruct::{ReconstructError, reconstruct};
pub use state::{
    Algorithm, Labels, Predecessor, SearchEngine, SearchRequest, SearchState, ServiceFilter,
    WalkLimits, WalkingStats,
};
