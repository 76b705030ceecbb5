//! `validate` command implementation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::ProbeBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    static_count: usize,
    broadcaster_count: usize,
    query_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    // Check file exists
    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    static_count: blueprint.static_transforms.len(),
                    broadcaster_count: blueprint.broadcasters.len(),
                    query_count: blueprint.queries.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &ProbeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    let published: HashSet<&str> = blueprint
        .static_transforms
        .iter()
        .flat_map(|st| [st.parent.as_str(), st.child.as_str()])
        .chain(
            blueprint
                .broadcasters
                .iter()
                .flat_map(|b| [b.parent.as_str(), b.child.as_str()]),
        )
        .collect();

    for (idx, query) in blueprint.queries.iter().enumerate() {
        for frame in [&query.target, &query.source] {
            if !published.contains(frame.as_str()) {
                warnings.push(format!(
                    "queries[{idx}]: frame '{frame}' is never published - lookup will time out"
                ));
            }
        }
        if query.timeout_ms == Some(0) {
            warnings.push(format!(
                "queries[{idx}]: timeout_ms = 0 allows at most one poll"
            ));
        }
    }

    if blueprint.lookup.poll_interval_ms > blueprint.lookup.default_timeout_ms {
        warnings.push(
            "lookup.poll_interval_ms exceeds default_timeout_ms - lookups poll at most twice"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Static transforms: {}", summary.static_count);
            println!("  Broadcasters: {}", summary.broadcaster_count);
            println!("  Queries: {}", summary.query_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
