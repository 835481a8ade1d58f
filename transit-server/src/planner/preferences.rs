//! Rider preferences for a single query.

use std::collections::BTreeSet;

use crate::domain::TransportMode;

use super::config::PlannerConfig;

/// Why raw preference inputs were rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferenceError {
    #[error("no selectable transport mode in {0:?}")]
    NoSelectableModes(String),

    #[error("invalid maximum walking distance: {0:?}")]
    InvalidWalkDistance(String),
}

/// Allowed modes and walking limits for one query.
///
/// Preferences are "specified" when the rider restricted modes or walking;
/// specified preferences are served by the connection-scan engine.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPreferences {
    /// `None` means every mode.
    allowed_modes: Option<BTreeSet<TransportMode>>,
    max_consecutive_walk_km: f64,
    max_cumulative_walk_km: f64,
    /// Cap on any single walking edge, only set by an explicit walk limit.
    max_single_walk_km: Option<f64>,
    walking_allowed: bool,
    specified: bool,
}

impl QueryPreferences {
    /// Default preferences: every mode, default walking caps.
    pub fn baseline(max_consecutive_walk_km: f64, max_cumulative_walk_km: f64) -> Self {
        Self {
            allowed_modes: None,
            max_consecutive_walk_km,
            max_cumulative_walk_km,
            max_single_walk_km: None,
            walking_allowed: true,
            specified: false,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::baseline(config.max_consecutive_walk_km, config.max_cumulative_walk_km)
    }

    /// Parse the optional `modes` and `maxWalkMeters` query inputs.
    ///
    /// `modes` is a comma-separated list; entries other than BUS and TRAIN
    /// are ignored, and a list with none left is an error. Listing both
    /// modes is the same as not restricting. A walking limit of zero or less
    /// disables walking; a positive limit caps every walk and clamps the
    /// consecutive and cumulative caps.
    ///
    /// ```
    /// use transit_server::domain::TransportMode;
    /// use transit_server::planner::QueryPreferences;
    ///
    /// let prefs = QueryPreferences::from_raw_inputs(Some("bus"), Some("500"), 0.8, 6.0).unwrap();
    /// assert!(prefs.allows_mode(TransportMode::Bus));
    /// assert!(!prefs.allows_mode(TransportMode::Train));
    /// assert_eq!(prefs.max_cumulative_walk_km(), 0.5);
    /// assert!(prefs.is_specified());
    /// ```
    pub fn from_raw_inputs(
        modes: Option<&str>,
        max_walk_meters: Option<&str>,
        default_consecutive_km: f64,
        default_cumulative_km: f64,
    ) -> Result<Self, PreferenceError> {
        let mut prefs = Self::baseline(default_consecutive_km, default_cumulative_km);

        if let Some(raw) = modes.map(str::trim).filter(|m| !m.is_empty()) {
            let parsed: BTreeSet<TransportMode> = raw
                .split(',')
                .filter_map(|token| token.parse().ok())
                .collect();
            if parsed.is_empty() {
                return Err(PreferenceError::NoSelectableModes(raw.to_string()));
            }
            if parsed.len() < TransportMode::SELECTABLE.len() {
                prefs.allowed_modes = Some(parsed);
                prefs.specified = true;
            }
        }

        if let Some(raw) = max_walk_meters.map(str::trim).filter(|m| !m.is_empty()) {
            let meters: f64 = raw
                .parse()
                .ok()
                .filter(|m: &f64| m.is_finite())
                .ok_or_else(|| PreferenceError::InvalidWalkDistance(raw.to_string()))?;

            prefs.specified = true;
            if meters <= 0.0 {
                prefs.walking_allowed = false;
                prefs.max_consecutive_walk_km = 0.0;
                prefs.max_cumulative_walk_km = 0.0;
                prefs.max_single_walk_km = Some(0.0);
            } else {
                let km = meters / 1000.0;
                prefs.max_single_walk_km = Some(km);
                prefs.max_consecutive_walk_km = default_consecutive_km.min(km);
                prefs.max_cumulative_walk_km = default_cumulative_km.min(km);
            }
        }

        Ok(prefs)
    }

    pub fn allows_mode(&self, mode: TransportMode) -> bool {
        self.allowed_modes
            .as_ref()
            .is_none_or(|modes| modes.contains(&mode))
    }

    /// The explicit mode restriction, if any.
    pub fn allowed_modes(&self) -> Option<&BTreeSet<TransportMode>> {
        self.allowed_modes.as_ref()
    }

    pub fn max_consecutive_walk_km(&self) -> f64 {
        self.max_consecutive_walk_km
    }

    pub fn max_cumulative_walk_km(&self) -> f64 {
        self.max_cumulative_walk_km
    }

    pub fn max_single_walk_km(&self) -> Option<f64> {
        self.max_single_walk_km
    }

    pub fn allows_walking(&self) -> bool {
        self.walking_allowed
    }

    pub fn is_specified(&self) -> bool {
        self.specified
    }
}

impl Default for QueryPreferences {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}
