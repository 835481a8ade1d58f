//! Planner configuration.

use crate::graph::BuildOptions;

/// Tunables for journey planning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    /// Number of rounds of the round-based engine (vehicle boardings).
    pub max_rounds: usize,

    /// Longest unbroken walk, in kilometres. Also the walking-edge radius.
    pub max_consecutive_walk_km: f64,

    /// Total walking allowed over a whole journey, in kilometres.
    pub max_cumulative_walk_km: f64,

    pub walking_speed_kmh: f64,

    /// Search radius when snapping a coordinate to the nearest stop.
    pub stop_lookup_km: f64,

    /// Endpoint walks shorter than this are not shown.
    pub endpoint_walk_threshold_km: f64,

    /// Tolerance for comparing walking distances.
    pub walk_epsilon: f64,
}

impl PlannerConfig {
    pub fn new(
        max_rounds: usize,
        max_consecutive_walk_km: f64,
        max_cumulative_walk_km: f64,
        walking_speed_kmh: f64,
    ) -> Self {
        Self {
            max_rounds,
            max_consecutive_walk_km,
            max_cumulative_walk_km,
            walking_speed_kmh,
            ..Self::default()
        }
    }

    /// Graph construction options consistent with these limits.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            walk_radius_km: self.max_consecutive_walk_km,
            walking_speed_kmh: self.walking_speed_kmh,
            ..BuildOptions::default()
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            max_consecutive_walk_km: 0.8,
            max_cumulative_walk_km: 6.0,
            walking_speed_kmh: 5.0,
            stop_lookup_km: 0.8,
            endpoint_walk_threshold_km: 0.02, // 20 m
            walk_epsilon: 1e-6,
        }
    }
}
