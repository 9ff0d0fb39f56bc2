//! REST calls against the arena API.

pub mod ratings;
