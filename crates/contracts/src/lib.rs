//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Data time (`Timestamp`, nanoseconds since the UNIX epoch) stamps transforms
//! - `LookupTime::Latest` requests the newest time a frame chain is known at
//! - Lookup deadlines run on the wall clock and never mix with data time

mod blueprint;
mod error;
mod frame_id;
mod liveness;
mod lookup_config;
mod outcome;
mod store;
mod time;
mod transform;

pub use blueprint::*;
pub use error::*;
pub use frame_id::FrameId;
pub use liveness::{AlwaysRunning, Liveness, ShutdownFlag};
pub use lookup_config::*;
pub use outcome::*;
pub use store::{EventPump, NoPump, TransformStore};
pub use time::{LookupTime, Timestamp};
pub use transform::*;
