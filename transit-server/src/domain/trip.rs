//! Trips, routes and walking edges.

use super::{DayType, ServiceTime, StopId, TransportMode};

/// Index of a trip inside a graph snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TripIdx(pub usize);

/// One scheduled call: a stop and the time the vehicle is there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    pub stop: StopId,
    pub time: ServiceTime,
}

impl StopTime {
    pub fn new(stop: StopId, time: ServiceTime) -> Self {
        Self { stop, time }
    }
}

/// One scheduled run of a vehicle along a route.
///
/// Train and bus runs differ only in their mode tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    /// Unique trip identifier, e.g. `"0401_WEEKDAY"` or `"BUS_T01_SATURDAY_3"`.
    pub id: String,
    /// Identifier as printed in the source timetable (train number or route number).
    pub base_id: String,
    pub route: String,
    pub day_type: DayType,
    pub mode: TransportMode,
    /// Ordered calls, non-decreasing in time.
    pub stop_times: Vec<StopTime>,
}

impl Trip {
    /// Position of the first call at `stop`.
    pub fn position_of(&self, stop: StopId) -> Option<usize> {
        self.stop_times.iter().position(|st| st.stop == stop)
    }

    /// Time of the first call at `stop`.
    pub fn time_at(&self, stop: StopId) -> Option<ServiceTime> {
        self.position_of(stop).map(|idx| self.stop_times[idx].time)
    }

    pub fn first_departure(&self) -> Option<ServiceTime> {
        self.stop_times.first().map(|st| st.time)
    }
}

/// An ordered, de-duplicated set of stops served by a route's trips.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub id: String,
    pub stops: Vec<StopId>,
    /// Operating agency label, when the source file carries one.
    pub operator: Option<String>,
}

impl Route {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stops: Vec::new(),
            operator: None,
        }
    }

    /// Append a stop unless it is already on the route.
    pub fn add_stop(&mut self, stop: StopId) {
        if !self.stops.contains(&stop) {
            self.stops.push(stop);
        }
    }
}

/// A directed, time-costed walking link between two nearby stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingEdge {
    pub from: StopId,
    pub to: StopId,
    pub minutes: u32,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> Trip {
        Trip {
            id: "T1_WEEKDAY".to_string(),
            base_id: "T1".to_string(),
            route: "R1".to_string(),
            day_type: DayType::Weekday,
            mode: TransportMode::Train,
            stop_times: vec![
                StopTime::new(StopId(0), ServiceTime::from_hm(8, 0)),
                StopTime::new(StopId(1), ServiceTime::from_hm(8, 10)),
                StopTime::new(StopId(2), ServiceTime::from_hm(8, 25)),
            ],
        }
    }

    #[test]
    fn positions_and_times() {
        let trip = trip();
        assert_eq!(trip.position_of(StopId(1)), Some(1));
        assert_eq!(trip.position_of(StopId(9)), None);
        assert_eq!(trip.time_at(StopId(2)), Some(ServiceTime::from_hm(8, 25)));
        assert_eq!(trip.first_departure(), Some(ServiceTime::from_hm(8, 0)));
    }

    #[test]
    fn route_stops_are_deduplicated() {
        let mut route = Route::new("R1");
        route.add_stop(StopId(3));
        route.add_stop(StopId(1));
        route.add_stop(StopId(3));
        assert_eq!(route.stops, vec![StopId(3), StopId(1)]);
    }
}
