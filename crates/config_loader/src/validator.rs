//! 配置校验模块
//!
//! 校验规则：
//! - poll_interval_ms > 0
//! - cache_time_s > 0, max_samples > 0
//! - frame id 非空，且不能以自身为 parent
//! - 每个 child 只能有一个 parent (static + broadcaster 合并检查)
//! - 0 < frequency_hz <= 1e9 (周期至少 1ns)
//! - 至少一个 query

use std::collections::HashMap;

use contracts::{BroadcasterConfig, ContractError, FrameId, ProbeBlueprint};

/// 校验 ProbeBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    validate_lookup(blueprint)?;
    validate_buffer(blueprint)?;
    validate_edges(blueprint)?;
    validate_broadcaster_frequencies(blueprint)?;
    validate_queries(blueprint)?;
    Ok(())
}

fn validate_lookup(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    if blueprint.lookup.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "lookup.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_buffer(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    let buffer = &blueprint.buffer;

    if !(buffer.cache_time_s.is_finite() && buffer.cache_time_s > 0.0) {
        return Err(ContractError::config_validation(
            "buffer.cache_time_s",
            format!("cache_time_s must be > 0, got {}", buffer.cache_time_s),
        ));
    }
    if buffer.max_samples == 0 {
        return Err(ContractError::config_validation(
            "buffer.max_samples",
            "max_samples must be > 0",
        ));
    }
    Ok(())
}

/// 校验 frame 拓扑：static_transforms 与 broadcasters 共同构成 frame 树
fn validate_edges(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    let statics = blueprint
        .static_transforms
        .iter()
        .enumerate()
        .map(|(idx, st)| (format!("static_transforms[{idx}]"), &st.parent, &st.child));
    let broadcasters = blueprint
        .broadcasters
        .iter()
        .enumerate()
        .map(|(idx, b)| (format!("broadcasters[{idx}]"), &b.parent, &b.child));

    let mut parents: HashMap<&FrameId, &FrameId> = HashMap::new();
    for (field, parent, child) in statics.chain(broadcasters) {
        if parent.is_empty() || child.is_empty() {
            return Err(ContractError::config_validation(
                field,
                "frame id cannot be empty",
            ));
        }
        if parent == child {
            return Err(ContractError::config_validation(
                field,
                format!("frame '{child}' cannot be its own parent"),
            ));
        }
        if let Some(existing) = parents.insert(child, parent) {
            return Err(ContractError::config_validation(
                field,
                format!("frame '{child}' already has parent '{existing}'"),
            ));
        }
    }
    Ok(())
}

/// 校验 broadcaster 发布频率
fn validate_broadcaster_frequencies(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    for (idx, broadcaster) in blueprint.broadcasters.iter().enumerate() {
        if !(broadcaster.frequency_hz.is_finite() && broadcaster.frequency_hz > 0.0) {
            return Err(ContractError::config_validation(
                format!("broadcasters[{idx}].frequency_hz"),
                format!("frequency_hz must be > 0, got {}", broadcaster.frequency_hz),
            ));
        }
        if broadcaster.frequency_hz > BroadcasterConfig::MAX_FREQUENCY_HZ {
            return Err(ContractError::config_validation(
                format!("broadcasters[{idx}].frequency_hz"),
                format!(
                    "frequency_hz must be <= {}, got {}",
                    BroadcasterConfig::MAX_FREQUENCY_HZ,
                    broadcaster.frequency_hz
                ),
            ));
        }
    }
    Ok(())
}

fn validate_queries(blueprint: &ProbeBlueprint) -> Result<(), ContractError> {
    if blueprint.queries.is_empty() {
        return Err(ContractError::config_validation(
            "queries",
            "at least one query is required",
        ));
    }
    for (idx, query) in blueprint.queries.iter().enumerate() {
        if query.target.is_empty() || query.source.is_empty() {
            return Err(ContractError::config_validation(
                format!("queries[{idx}]"),
                "frame id cannot be empty",
            ));
        }
    }
    Ok(())
}
