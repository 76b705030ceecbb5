//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, ProbeBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<ProbeBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<ProbeBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<ProbeBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::QueryTime;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[[static_transforms]]
parent = "base_link"
child = "laser"
translation = [0.2, 0.0, 0.3]

[[queries]]
target = "base_link"
source = "laser"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.static_transforms.len(), 1);
        assert_eq!(bp.static_transforms[0].translation, [0.2, 0.0, 0.3]);
        assert_eq!(bp.queries[0].time, QueryTime::Latest);
        assert_eq!(bp.lookup.poll_interval_ms, 5);
    }

    #[test]
    fn test_parse_toml_query_times() {
        let content = r#"
[[queries]]
target = "map"
source = "base_link"
time = "start"

[[queries]]
target = "map"
source = "base_link"
time = { offset_ms = -20 }
timeout_ms = 50
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.queries[0].time, QueryTime::Start);
        assert_eq!(bp.queries[1].time, QueryTime::OffsetMs(-20));
        assert_eq!(bp.queries[1].timeout_ms, Some(50));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "lookup": { "poll_interval_ms": 2, "default_timeout_ms": 250 },
            "broadcasters": [{
                "parent": "map",
                "child": "base_link",
                "frequency_hz": 50.0,
                "velocity": [1.0, 0.0, 0.0]
            }],
            "queries": [{ "target": "map", "source": "base_link", "time": "latest" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.lookup.default_timeout_ms, 250);
        assert_eq!(bp.broadcasters[0].start_delay_ms, 0);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_queries_is_parse_error() {
        let result = parse_toml("[lookup]\npoll_interval_ms = 5\n");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
