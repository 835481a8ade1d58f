//! Walking connections between nearby stops.
//!
//! Stops close enough to walk between give transfers that no timetable
//! shows (a train station and the bus stop across the road). Edges are
//! derived from pairwise great-circle distance and stored per origin stop.

use crate::domain::{Stop, StopId, WalkingEdge};
use crate::geo::{haversine_km, walk_minutes};

/// Directed walking edges, indexed by origin stop.
///
/// Connections are symmetric: if you can walk from A to B, you can walk from
/// B to A with the same distance and time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkingGraph {
    edges: Vec<Vec<WalkingEdge>>,
}

impl WalkingGraph {
    /// Build edges between every pair of resolved stops at most
    /// `max_distance_km` apart.
    ///
    /// Pairs are visited in stop-id order, so the per-stop edge lists depend
    /// only on the stops, not on how they were collected.
    pub fn build(stops: &[Stop], max_distance_km: f64, speed_kmh: f64) -> Self {
        let mut graph = Self {
            edges: vec![Vec::new(); stops.len()],
        };

        let mut located: Vec<&Stop> = stops.iter().filter(|s| s.has_coordinates()).collect();
        located.sort_by_key(|s| s.id);

        for (i, a) in located.iter().enumerate() {
            for b in &located[i + 1..] {
                let distance_km = haversine_km(a.location, b.location);
                if distance_km == 0.0 || distance_km > max_distance_km {
                    continue;
                }
                let minutes = walk_minutes(distance_km, speed_kmh);
                graph.add(a.id, b.id, minutes, distance_km);
            }
        }

        graph
    }

    /// Add a walking connection in both directions.
    pub fn add(&mut self, from: StopId, to: StopId, minutes: u32, distance_km: f64) {
        let needed = from.index().max(to.index()) + 1;
        if self.edges.len() < needed {
            self.edges.resize_with(needed, Vec::new);
        }
        self.edges[from.index()].push(WalkingEdge {
            from,
            to,
            minutes,
            distance_km,
        });
        self.edges[to.index()].push(WalkingEdge {
            from: to,
            to: from,
            minutes,
            distance_km,
        });
    }

    /// Edges leaving `from`.
    pub fn from(&self, from: StopId) -> &[WalkingEdge] {
        self.edges
            .get(from.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The edge between two stops, if they are walkable.
    pub fn get(&self, from: StopId, to: StopId) -> Option<&WalkingEdge> {
        self.from(from).iter().find(|e| e.to == to)
    }

    pub fn is_walkable(&self, from: StopId, to: StopId) -> bool {
        self.get(from, to).is_some()
    }

    /// Number of directed edges.
    pub fn len(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.iter().all(Vec::is_empty)
    }
}
