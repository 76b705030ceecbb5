//! Lookup 指标收集模块
//!
//! 记录 bounded lookup 的结果、等待时间与轮询次数，以及 transform buffer 的状态。

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::LookupOutcome;
use metrics::{counter, gauge, histogram};

/// Outcome label for a successful lookup
pub const OUTCOME_SUCCESS: &str = "success";

/// 记录一次 lookup 的结果
///
/// `outcome` 取 `"success"` 或 `FailureCause::label()`。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_lookup;
///
/// let outcome = lookup.lookup(&target, &source, time, timeout).await;
/// record_lookup(outcome_label(&outcome), waited, polls);
/// ```
pub fn record_lookup(outcome: &'static str, wait: Duration, polls: u32) {
    counter!("tf_wait_lookups_total", "outcome" => outcome).increment(1);
    histogram!("tf_wait_lookup_wait_ms").record(wait.as_secs_f64() * 1000.0);
    histogram!("tf_wait_lookup_polls").record(f64::from(polls));
}

/// Stable label of an outcome
pub fn outcome_label(outcome: &LookupOutcome) -> &'static str {
    match outcome {
        LookupOutcome::Success(_) => OUTCOME_SUCCESS,
        LookupOutcome::Failure(failure) => failure.cause.label(),
    }
}

/// 记录 transform 消息接收
pub fn record_transform_received(kind: &'static str) {
    counter!("tf_wait_transforms_received_total", "kind" => kind).increment(1);
}

/// 记录被 buffer 拒绝的 transform
pub fn record_transform_rejected(reason: &'static str) {
    counter!("tf_wait_transforms_rejected_total", "reason" => reason).increment(1);
}

/// 记录 buffer 状态
pub fn record_buffer_stats(frames: usize, samples: usize) {
    gauge!("tf_wait_buffer_frames").set(frames as f64);
    gauge!("tf_wait_buffer_samples").set(samples as f64);
}

/// Lookup 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LookupMetricsAggregator {
    /// 总 lookup 数
    pub total_lookups: u64,

    /// 成功数
    pub successes: u64,

    /// 按失败原因计数
    pub failures: BTreeMap<&'static str, u64>,

    /// 等待时间统计 (ms)
    pub wait_stats: RunningStats,

    /// 成功 lookup 的等待时间统计 (ms)
    pub success_wait_stats: RunningStats,
}

impl LookupMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, outcome: &LookupOutcome, wait: Duration) {
        let wait_ms = wait.as_secs_f64() * 1000.0;
        self.total_lookups += 1;
        self.wait_stats.push(wait_ms);

        match outcome {
            LookupOutcome::Success(_) => {
                self.successes += 1;
                self.success_wait_stats.push(wait_ms);
            }
            LookupOutcome::Failure(failure) => {
                *self.failures.entry(failure.cause.label()).or_insert(0) += 1;
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> LookupSummary {
        LookupSummary {
            total_lookups: self.total_lookups,
            successes: self.successes,
            success_rate: if self.total_lookups > 0 {
                self.successes as f64 / self.total_lookups as f64 * 100.0
            } else {
                0.0
            },
            failures: self.failures.clone(),
            wait_ms: StatsSummary::from(&self.wait_stats),
            success_wait_ms: StatsSummary::from(&self.success_wait_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct LookupSummary {
    pub total_lookups: u64,
    pub successes: u64,
    pub success_rate: f64,
    pub failures: BTreeMap<&'static str, u64>,
    pub wait_ms: StatsSummary,
    pub success_wait_ms: StatsSummary,
}

impl std::fmt::Display for LookupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Lookup Summary ===")?;
        writeln!(f, "Total lookups: {}", self.total_lookups)?;
        writeln!(
            f,
            "Succeeded: {} ({:.2}%)",
            self.successes, self.success_rate
        )?;
        writeln!(f, "Wait (ms): {}", self.wait_ms)?;
        writeln!(f, "Wait until success (ms): {}", self.success_wait_ms)?;

        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for (cause, count) in &self.failures {
                writeln!(f, "  {}: {}", cause, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
