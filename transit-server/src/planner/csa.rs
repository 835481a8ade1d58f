//! Connection-scan earliest-arrival search.
//!
//! Every admitted trip is flattened into elementary hops which are scanned
//! once in departure order. Footpaths are propagated breadth-first after
//! the source is seeded and after every improvement a hop makes.

use tracing::trace;

use crate::domain::{ServiceTime, StopId, TripIdx};
use crate::graph::TransitGraph;

use super::state::{Algorithm, Labels, Predecessor, SearchEngine, SearchRequest, SearchState};

/// One hop between consecutive calls of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub trip: TripIdx,
    pub from: StopId,
    pub to: StopId,
    pub departure: ServiceTime,
    pub arrival: ServiceTime,
}

/// Hops of every trip the request admits, sorted by departure then arrival.
/// Hops that do not move forward in time are dropped.
pub fn connections(graph: &TransitGraph, request: &SearchRequest) -> Vec<Connection> {
    let mut connections: Vec<Connection> = graph
        .trips()
        .iter()
        .enumerate()
        .filter(|(_, trip)| request.filter.admits(trip))
        .flat_map(|(idx, trip)| {
            trip.stop_times.windows(2).filter_map(move |pair| {
                (pair[1].time > pair[0].time).then_some(Connection {
                    trip: TripIdx(idx),
                    from: pair[0].stop,
                    to: pair[1].stop,
                    departure: pair[0].time,
                    arrival: pair[1].time,
                })
            })
        })
        .collect();
    connections.sort_by_key(|c| (c.departure, c.arrival));
    connections
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionScan;

impl SearchEngine for ConnectionScan {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ConnectionScan
    }

    fn search(&self, graph: &TransitGraph, request: &SearchRequest) -> Labels {
        let mut labels = request.labels(graph);
        labels.relax_footpaths(graph, request, &[request.source]);

        let connections = connections(graph, request);
        let mut scanned = 0usize;
        for connection in &connections {
            if labels
                .arrival(request.target)
                .is_some_and(|best| connection.departure > best)
            {
                break;
            }
            scanned += 1;

            let from = labels.state(connection.from);
            if from.arrival.is_none_or(|ready| ready > connection.departure) {
                continue;
            }

            let candidate = SearchState::at(connection.arrival, from.total_walk_km, 0.0);
            let ride = Predecessor::Ride {
                trip: connection.trip,
                from: connection.from,
                board_time: connection.departure,
                arrival: connection.arrival,
            };
            if labels.relax(connection.to, candidate, ride) {
                labels.relax_footpaths(graph, request, &[connection.to]);
            }
        }
        trace!(scanned, total = connections.len(), "connection scan finished");
        labels
    }
}
