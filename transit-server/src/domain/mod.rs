//! Domain types for the transit journey planner.
//!
//! These are the shared vocabulary of the graph builder, the search engines
//! and the web layer. Stops, routes, trips and walking edges are built once
//! per dataset load and never mutated afterwards.

mod service;
mod stop;
mod time;
mod trip;

pub use service::{DayType, TransportMode, UnknownMode};
pub use stop::{Coordinates, Stop, StopId, normalize_stop_name};
pub use time::{MAX_SCHEDULE_HOUR, MAX_SERVICE_HOUR, ServiceTime, TimeError};
pub use trip::{Route, StopTime, Trip, TripIdx, WalkingEdge};
