//! # Transform Buffer
//!
//! 时间索引的坐标变换存储，`TransformStore` 的参考实现。
//!
//! 负责：
//! - 每个 frame 的历史（保留窗口 + 容量上限）
//! - 静态 transform
//! - 沿 frame 树组合、插值（不外推）
//! - `TransformListener` 投递队列
//!
//! ## 使用示例
//!
//! ```ignore
//! use transform_buffer::{TransformBuffer, TransformListener};
//!
//! let buffer = Arc::new(TransformBuffer::new(BufferConfig::default()));
//! let (listener, publisher) = TransformListener::new(buffer.clone());
//! tokio::spawn(listener.run());
//!
//! publisher.publish(StampedTransform::new(stamp, "map", "base_link", tf));
//! ```

mod buffer;
mod history;
mod listener;
mod math;

pub use buffer::{BufferStats, TransformBuffer};
pub use listener::{TransformListener, TransformMessage, TransformPublisher};

// Re-export contracts types
pub use contracts::{BufferConfig, StampedTransform, TransformError, TransformStore};
