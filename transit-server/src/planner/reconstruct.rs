//! Turning search labels into an itinerary.

use std::collections::BTreeSet;

use crate::domain::{ServiceTime, Stop, StopId, TripIdx};
use crate::graph::TransitGraph;

use super::itinerary::{Itinerary, PathStep};
use super::state::{Labels, Predecessor};

/// The predecessor chain does not describe a real journey.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconstructError {
    #[error("stop {0} is reached but has no predecessor")]
    MissingPredecessor(StopId),

    #[error("predecessor chain revisits stop {0}")]
    Cycle(StopId),

    #[error("unknown trip index {0:?}")]
    UnknownTrip(TripIdx),

    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    #[error("trip {trip} has no ride from {from} at {board} to {to} at {arrival}")]
    RideNotOnTrip {
        trip: String,
        from: StopId,
        to: StopId,
        board: ServiceTime,
        arrival: ServiceTime,
    },
}

/// Walk the predecessor chain back from `target` and emit the journey
/// forwards. An unreached target yields an empty itinerary.
pub fn reconstruct(
    graph: &TransitGraph,
    labels: &Labels,
    source: StopId,
    target: StopId,
    departure: ServiceTime,
) -> Result<Itinerary, ReconstructError> {
    let source_stop = stop(graph, source)?;
    if source == target {
        return Ok(Itinerary::new(vec![PathStep::source(source_stop, departure)]));
    }
    if labels.arrival(target).is_none() {
        return Ok(Itinerary::empty());
    }

    let mut segments = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = target;
    while current != source {
        if !seen.insert(current) {
            return Err(ReconstructError::Cycle(current));
        }
        let step = labels
            .predecessor(current)
            .ok_or(ReconstructError::MissingPredecessor(current))?;
        segments.push(segment(graph, step, current)?);
        current = step.from_stop();
    }

    let mut steps: Vec<PathStep> = Vec::new();
    for segment in segments.into_iter().rev() {
        // hop-by-hop rides on the same trip share their junction call
        let continues_ride = match (steps.last(), segment.first()) {
            (Some(prev), Some(next)) => {
                !prev.walking
                    && !next.walking
                    && prev.trip_id == next.trip_id
                    && prev.stop_id == next.stop_id
            }
            _ => false,
        };
        let skip = usize::from(continues_ride);
        steps.extend(segment.into_iter().skip(skip));
    }

    if steps.first().and_then(|s| s.stop_id) != Some(source) {
        let time = steps.first().map_or(departure, |s| s.time);
        steps.insert(0, PathStep::source(source_stop, time));
    }
    Ok(Itinerary::new(steps))
}

fn stop(graph: &TransitGraph, id: StopId) -> Result<&Stop, ReconstructError> {
    graph.stop(id).ok_or(ReconstructError::UnknownStop(id))
}

/// Forward steps for the hop that reached `to`.
fn segment(
    graph: &TransitGraph,
    step: &Predecessor,
    to: StopId,
) -> Result<Vec<PathStep>, ReconstructError> {
    match *step {
        Predecessor::Walk {
            from,
            depart,
            arrival,
            distance_km,
        } => Ok(vec![
            PathStep::walk(stop(graph, from)?, depart, distance_km),
            PathStep::walk(stop(graph, to)?, arrival, distance_km),
        ]),
        Predecessor::Ride {
            trip,
            from,
            board_time,
            arrival,
        } => {
            let trip_data = graph.trip(trip).ok_or(ReconstructError::UnknownTrip(trip))?;
            let not_on_trip = || ReconstructError::RideNotOnTrip {
                trip: trip_data.id.clone(),
                from,
                to,
                board: board_time,
                arrival,
            };
            let calls = &trip_data.stop_times;
            let board = calls
                .iter()
                .position(|st| st.stop == from && st.time == board_time)
                .ok_or_else(not_on_trip)?;
            let alight = calls[board + 1..]
                .iter()
                .position(|st| st.stop == to && st.time == arrival)
                .map(|offset| board + 1 + offset)
                .ok_or_else(not_on_trip)?;

            calls[board..=alight]
                .iter()
                .map(|st| stop(graph, st.stop).map(|s| PathStep::ride(trip_data, s, st.time)))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayType;
    use crate::planner::csa::ConnectionScan;
    use crate::planner::preferences::QueryPreferences;
    use crate::planner::raptor::RoundBased;
    use crate::planner::state::{SearchEngine, SearchRequest, SearchState, ServiceFilter, WalkLimits};
    use crate::planner::testing::{Network, hm};

    fn request(graph: &TransitGraph, from: &str, to: &str, at: &str) -> SearchRequest {
        SearchRequest {
            source: graph.stop_id(from).unwrap(),
            target: graph.stop_id(to).unwrap(),
            departure: hm(at),
            filter: ServiceFilter::for_day(DayType::Weekday),
            limits: WalkLimits::from_preferences(&QueryPreferences::default(), 1e-6),
            origin_walk_km: 0.0,
        }
    }

    fn run(graph: &TransitGraph, engine: &dyn SearchEngine, req: &SearchRequest) -> Itinerary {
        let labels = engine.search(graph, req);
        reconstruct(graph, &labels, req.source, req.target, req.departure).unwrap()
    }

    fn names(itinerary: &Itinerary) -> Vec<(String, String, String)> {
        itinerary
            .steps()
            .iter()
            .map(|s| (s.trip_id.clone(), s.stop_name.clone(), s.time.to_string()))
            .collect()
    }

    fn line() -> TransitGraph {
        Network::new()
            .stop("A")
            .stop("B")
            .stop("C")
            .stop("D")
            .trip(
                "T1",
                "R1",
                &[("A", "08:00"), ("B", "08:10"), ("C", "08:20"), ("D", "08:30")],
            )
            .build()
    }

    #[test]
    fn ride_emits_every_intermediate_call() {
        let graph = line();
        let req = request(&graph, "B", "D", "08:00");
        let expected = vec![
            ("T1".to_string(), "B".to_string(), "08:10".to_string()),
            ("T1".to_string(), "C".to_string(), "08:20".to_string()),
            ("T1".to_string(), "D".to_string(), "08:30".to_string()),
        ];
        assert_eq!(names(&run(&graph, &RoundBased::new(5), &req)), expected);
        // hop-by-hop predecessors merge back into one ride
        assert_eq!(names(&run(&graph, &ConnectionScan, &req)), expected);
    }

    #[test]
    fn walk_emits_two_steps() {
        let graph = Network::new()
            .stop_at("A", -33.90, 18.40)
            .stop_at("B", -33.95, 18.40)
            .stop_at("C", -33.953, 18.40)
            .trip("T1", "R1", &[("A", "08:00"), ("B", "08:20")])
            .trip("T2", "R2", &[("C", "09:00"), ("A", "09:40")])
            .build();
        let req = request(&graph, "A", "C", "07:55");
        let itinerary = run(&graph, &RoundBased::new(5), &req);

        let steps = itinerary.steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].stop_name, "A");
        assert_eq!(steps[2].trip_id, "WALK");
        assert_eq!(steps[2].stop_name, "B");
        assert_eq!(steps[2].time, hm("08:20"));
        assert!(steps[3].walking);
        assert_eq!(steps[3].stop_name, "C");
        assert_eq!(steps[3].time, hm("08:25"));
        assert_eq!(steps[2].walk_distance_km, steps[3].walk_distance_km);
        assert!(!steps[1].walking);
        assert_eq!(steps[1].walk_distance_km, 0.0);
    }

    #[test]
    fn unreached_target_is_empty() {
        let graph = line();
        let req = request(&graph, "D", "A", "08:00");
        assert!(run(&graph, &RoundBased::new(5), &req).is_empty());
    }

    #[test]
    fn source_equals_target() {
        let graph = line();
        let req = request(&graph, "C", "C", "07:30");
        let itinerary = run(&graph, &RoundBased::new(5), &req);
        assert_eq!(
            names(&itinerary),
            vec![("SOURCE".to_string(), "C".to_string(), "07:30".to_string())]
        );
    }

    #[test]
    fn broken_chains_are_errors() {
        let graph = line();
        let a = graph.stop_id("A").unwrap();
        let b = graph.stop_id("B").unwrap();
        let c = graph.stop_id("C").unwrap();

        let mut labels = Labels::new(graph.stop_count(), a, hm("08:00"), 1e-6);
        labels.relax(
            c,
            SearchState::at(hm("08:20"), 0.0, 0.0),
            Predecessor::Ride {
                trip: TripIdx(0),
                from: b,
                board_time: hm("08:11"),
                arrival: hm("08:20"),
            },
        );
        assert!(matches!(
            reconstruct(&graph, &labels, a, c, hm("08:00")),
            Err(ReconstructError::RideNotOnTrip { .. })
        ));

        let mut orphan = Labels::new(graph.stop_count(), a, hm("08:00"), 1e-6);
        orphan.relax(
            c,
            SearchState::at(hm("08:20"), 0.0, 0.0),
            Predecessor::Ride {
                trip: TripIdx(0),
                from: b,
                board_time: hm("08:10"),
                arrival: hm("08:20"),
            },
        );
        assert_eq!(
            reconstruct(&graph, &orphan, a, c, hm("08:00")),
            Err(ReconstructError::MissingPredecessor(b))
        );
    }
}
