//! Round-based earliest-arrival search.
//!
//! Each round scans every route serving a stop improved in the previous
//! round, so round `k` finds journeys with at most `k + 1` boardings.
//! Footpaths are relaxed from the source before the first round and from
//! every stop a round's rides improved, within that same round.

use std::collections::BTreeSet;

use tracing::trace;

use crate::domain::{StopId, Trip, TripIdx};
use crate::graph::TransitGraph;

use super::state::{Algorithm, Labels, Predecessor, SearchEngine, SearchRequest, SearchState};

/// Round-based engine, bounded by `max_rounds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundBased {
    pub max_rounds: usize,
}

impl RoundBased {
    pub fn new(max_rounds: usize) -> Self {
        Self { max_rounds }
    }

    /// Trips of `route` admitted by the filter that call at `stop`, ordered
    /// by their time there.
    fn boardable_trips<'g>(
        graph: &'g TransitGraph,
        request: &SearchRequest,
        route: &str,
        stop: StopId,
    ) -> Vec<(TripIdx, &'g Trip, usize)> {
        let mut trips: Vec<(TripIdx, &Trip, usize)> = graph
            .trips_on_route(route)
            .iter()
            .filter_map(|&idx| graph.trip(idx).map(|trip| (idx, trip)))
            .filter(|(_, trip)| request.filter.admits(trip))
            .filter_map(|(idx, trip)| trip.position_of(stop).map(|pos| (idx, trip, pos)))
            .collect();
        trips.sort_by_key(|(idx, trip, pos)| (trip.stop_times[*pos].time, *idx));
        trips
    }

    /// Ride every boardable trip of every route through `stop`.
    fn scan_routes(
        graph: &TransitGraph,
        request: &SearchRequest,
        stop: StopId,
        labels: &mut Labels,
        next_marked: &mut BTreeSet<StopId>,
    ) {
        for route in graph.routes_serving(stop) {
            for (idx, trip, pos) in Self::boardable_trips(graph, request, route, stop) {
                let board_time = trip.stop_times[pos].time;
                let ready_at = if stop == request.source {
                    Some(request.departure)
                } else {
                    labels.arrival(stop)
                };
                if ready_at.is_none_or(|ready| board_time < ready) {
                    continue;
                }
                if trip
                    .stop_times
                    .get(pos + 1)
                    .is_some_and(|next| next.time <= board_time)
                {
                    continue;
                }

                let carried_walk = labels.state(stop).total_walk_km;
                for call in &trip.stop_times[pos + 1..] {
                    if call.time <= board_time {
                        continue;
                    }
                    let candidate = SearchState::at(call.time, carried_walk, 0.0);
                    let ride = Predecessor::Ride {
                        trip: idx,
                        from: stop,
                        board_time,
                        arrival: call.time,
                    };
                    if labels.relax(call.stop, candidate, ride) {
                        next_marked.insert(call.stop);
                    }
                }
            }
        }
    }
}

impl SearchEngine for RoundBased {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RoundBased
    }

    fn search(&self, graph: &TransitGraph, request: &SearchRequest) -> Labels {
        let mut labels = request.labels(graph);
        let mut marked = BTreeSet::from([request.source]);
        marked.extend(labels.relax_footpaths(graph, request, &[request.source]));

        for round in 0..self.max_rounds {
            let mut next_marked = BTreeSet::new();
            for &stop in &marked {
                Self::scan_routes(graph, request, stop, &mut labels, &mut next_marked);
            }
            // Walking after a ride belongs to the same round.
            let ridden: Vec<StopId> = next_marked.iter().copied().collect();
            next_marked.extend(labels.relax_footpaths(graph, request, &ridden));

            trace!(round, improved = next_marked.len(), "round finished");
            if next_marked.is_empty() {
                break;
            }
            marked = next_marked;
        }
        labels
    }
}
