//! Probe session: frame publishers, delivery, and the configured lookups.

mod broadcaster;
mod report;
mod runner;

pub use report::{ProbeReport, QueryReport};
pub use runner::{ProbeSession, SessionConfig};
