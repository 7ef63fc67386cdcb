//! Departure dashboard for the Řež commute.
//!
//! Polls the Golemio PID departure boards for train S4 and bus 371, filters
//! them by line and headsign direction, and estimates travel times by
//! pairing departures with arrivals of the same trip.

pub mod boards;
pub mod cache;
pub mod dashboard;
pub mod domain;
pub mod pid;
pub mod travel;
pub mod web;
