//! # Bounded Lookup
//!
//! 有界等待的坐标变换查询。
//!
//! 在截止时间内轮询 `TransformStore`，直到它能回答、超时或宿主进程关闭，
//! 失败时附带诊断信息（最新可用时间）。查询本身从不返回 `Err`，
//! 所有失败都以 `LookupOutcome::Failure` 返回。
//!
//! ## 使用示例
//!
//! ```ignore
//! use bounded_lookup::BoundedTransformLookup;
//!
//! let lookup = BoundedTransformLookup::new(&buffer, &shutdown).with_config(config.lookup);
//! let outcome = lookup
//!     .lookup(&"map".into(), &"laser".into(), LookupTime::Latest, Duration::from_millis(200))
//!     .await;
//! ```

mod lookup;

pub use lookup::BoundedTransformLookup;

// Re-export contracts types
pub use contracts::{
    AlwaysRunning, EventPump, FailureCause, Liveness, LookupConfig, LookupFailure, LookupOutcome,
    LookupTime, NoPump, ShutdownFlag, TransformStore,
};
