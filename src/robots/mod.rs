//! Robots.txt handling module
//!
//! This module provides the politeness gate: fetching robots.txt once per
//! origin, caching the parsed policy for the rest of the run, and refusing
//! URLs the policy or the configured ignore-list excludes.

mod gate;
mod parser;

pub use gate::{fetch_robots, PolicyFetchError, PolitenessGate};
pub use parser::ParsedRobots;
