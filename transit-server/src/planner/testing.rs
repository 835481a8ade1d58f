//! Small hand-built networks for planner tests.

use crate::domain::{Coordinates, DayType, ServiceTime, TransportMode};
use crate::graph::{GraphBuilder, TransitGraph, TripRecord};

use super::config::PlannerConfig;

pub(crate) fn hm(s: &str) -> ServiceTime {
    ServiceTime::parse_hhmm(s).unwrap()
}

/// Fluent builder over [`GraphBuilder`] for test networks.
///
/// Stops placed with [`Network::stop`] are spread roughly 5 km apart so no
/// walking edges appear unless a test asks for them with [`Network::stop_at`].
pub(crate) struct Network {
    builder: GraphBuilder,
    placed: usize,
}

impl Network {
    pub fn new() -> Self {
        Self {
            builder: GraphBuilder::new(PlannerConfig::default().build_options()),
            placed: 0,
        }
    }

    pub fn stop(mut self, name: &str) -> Self {
        let lat = -33.5 - 0.05 * self.placed as f64;
        self.placed += 1;
        self.stop_at(name, lat, 18.5)
    }

    /// Declare a stop at a fixed point. It exists even if no trip calls there.
    pub fn stop_at(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.builder
            .coordinates_mut()
            .insert_named(name, Coordinates::new(lat, lon));
        self.builder.stop_for(name);
        self
    }

    pub fn trip(self, id: &str, route: &str, calls: &[(&str, &str)]) -> Self {
        self.trip_with(id, route, DayType::Weekday, TransportMode::Train, calls)
    }

    pub fn bus(self, id: &str, route: &str, calls: &[(&str, &str)]) -> Self {
        self.trip_with(id, route, DayType::Weekday, TransportMode::Bus, calls)
    }

    pub fn trip_with(
        mut self,
        id: &str,
        route: &str,
        day_type: DayType,
        mode: TransportMode,
        calls: &[(&str, &str)],
    ) -> Self {
        self.builder.add_trip(TripRecord {
            id: id.to_string(),
            base_id: id.to_string(),
            route: route.to_string(),
            day_type,
            mode,
            calls: calls
                .iter()
                .map(|(name, time)| (name.to_string(), hm(time)))
                .collect(),
            reversed: false,
        });
        self
    }

    pub fn inbound(mut self, id: &str, route: &str, calls: &[(&str, &str)]) -> Self {
        self.builder.add_trip(TripRecord {
            id: id.to_string(),
            base_id: id.to_string(),
            route: route.to_string(),
            day_type: DayType::Weekday,
            mode: TransportMode::Train,
            calls: calls
                .iter()
                .map(|(name, time)| (name.to_string(), hm(time)))
                .collect(),
            reversed: true,
        });
        self
    }

    pub fn operator(mut self, route: &str, operator: &str) -> Self {
        self.builder.register_route(route, Some(operator));
        self
    }

    pub fn build(self) -> TransitGraph {
        self.builder.build()
    }
}
