//! Command implementations.

mod info;
mod probe;
mod validate;

pub use info::run_info;
pub use probe::run_probe;
pub use validate::run_validate;
