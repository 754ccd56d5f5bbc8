//! Integration and property-based tests exercising `waypoint` end to end
//! through the public façade, plus shared grammar fixtures used by both.

pub mod utils;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
