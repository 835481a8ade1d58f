//! Transit journey planner server.
//!
//! Loads a city's timetable dataset into an immutable multimodal graph and
//! answers "what is the earliest I can get from here to there?" over HTTP,
//! combining scheduled trains and buses with short walks between stops.

pub mod calendar;
pub mod config;
pub mod domain;
pub mod geo;
pub mod graph;
pub mod planner;
pub mod snapshot;
pub mod web;
