//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::{BufferConfig, LookupConfig, ProbeBlueprint, QueryTime};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    lookup: LookupConfig,
    buffer: BufferConfig,
    frames: Vec<FrameInfo>,
    queries: Vec<QueryInfo>,
}

#[derive(Serialize)]
struct FrameInfo {
    child: String,
    parent: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_hz: Option<f64>,
}

#[derive(Serialize)]
struct QueryInfo {
    target: String,
    source: String,
    time: QueryTime,
    timeout_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn frames(blueprint: &ProbeBlueprint) -> Vec<FrameInfo> {
    let statics = blueprint.static_transforms.iter().map(|st| FrameInfo {
        child: st.child.to_string(),
        parent: st.parent.to_string(),
        kind: "static",
        frequency_hz: None,
    });
    let broadcasters = blueprint.broadcasters.iter().map(|b| FrameInfo {
        child: b.child.to_string(),
        parent: b.parent.to_string(),
        kind: "broadcast",
        frequency_hz: Some(b.frequency_hz),
    });
    statics.chain(broadcasters).collect()
}

fn build_config_info(blueprint: &ProbeBlueprint) -> ConfigInfo {
    let default_timeout = blueprint.lookup.default_timeout_ms;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        lookup: blueprint.lookup,
        buffer: blueprint.buffer,
        frames: frames(blueprint),
        queries: blueprint
            .queries
            .iter()
            .map(|q| QueryInfo {
                target: q.target.to_string(),
                source: q.source.to_string(),
                time: q.time,
                timeout_ms: q.timeout_ms.unwrap_or(default_timeout),
            })
            .collect(),
    }
}

fn print_config_info(blueprint: &ProbeBlueprint) {
    println!("=== tf-wait Configuration ===\n");

    println!("Lookup");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Poll interval: {} ms", blueprint.lookup.poll_interval_ms);
    println!("   ├─ Default timeout: {} ms", blueprint.lookup.default_timeout_ms);
    println!("   ├─ Buffer retention: {} s", blueprint.buffer.cache_time_s);
    println!("   └─ Buffer capacity: {} samples/frame", blueprint.buffer.max_samples);

    // Frame tree, children grouped under their parent
    let frames = frames(blueprint);
    let mut tree: BTreeMap<&str, Vec<&FrameInfo>> = BTreeMap::new();
    for frame in &frames {
        tree.entry(frame.parent.as_str()).or_default().push(frame);
    }

    println!("\nFrames ({})", frames.len());
    for (parent, children) in &tree {
        println!("   {}", parent);
        for (i, frame) in children.iter().enumerate() {
            let prefix = if i == children.len() - 1 { "└─" } else { "├─" };
            match frame.frequency_hz {
                Some(hz) => println!("   {} {} ({}, {} Hz)", prefix, frame.child, frame.kind, hz),
                None => println!("   {} {} ({})", prefix, frame.child, frame.kind),
            }
        }
    }

    println!("\nQueries ({})", blueprint.queries.len());
    for (i, query) in blueprint.queries.iter().enumerate() {
        let prefix = if i == blueprint.queries.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} -> {} at {:?}, timeout {} ms",
            prefix,
            query.source,
            query.target,
            query.time,
            query.timeout_ms.unwrap_or(blueprint.lookup.default_timeout_ms)
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_build_config_info() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[lookup]
default_timeout_ms = 300

[[static_transforms]]
parent = "base_link"
child = "laser"

[[broadcasters]]
parent = "map"
child = "base_link"
frequency_hz = 20.0

[[queries]]
target = "map"
source = "laser"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&blueprint);
        assert_eq!(info.frames.len(), 2);
        assert_eq!(info.frames[1].kind, "broadcast");
        assert_eq!(info.frames[1].frequency_hz, Some(20.0));
        assert_eq!(info.queries[0].timeout_ms, 300);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["lookup"]["poll_interval_ms"], 5);
        assert!(json["frames"][0].get("frequency_hz").is_none());
    }
}
