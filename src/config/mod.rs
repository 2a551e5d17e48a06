pub mod validation;

use serde::{Deserialize, Serialize};

use self::validation::validate_toolset;

/// Error type for toolset loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Toolset validation error: {0}")]
    Validation(String),
}

/// One tool tag and its parameter tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// The set of tool tags a parser accepts.
///
/// An empty toolset is legal: every tag-shaped sequence is then recovered
/// as literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsetConfig {
    pub tools: Vec<ToolConfig>,
}

impl ToolsetConfig {
    /// Convenience constructor from `(tool, params)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        Self {
            tools: pairs
                .iter()
                .map(|(name, params)| ToolConfig {
                    name: (*name).to_string(),
                    params: params.iter().map(|param| (*param).to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// Parser behavior flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Suppress advisory error events and absorb malformed tokens silently.
    ///
    /// Meant for tool payloads (diff blocks in particular) that legitimately
    /// contain angle brackets and tag-like sequences inside parameter
    /// values. Recovery behavior is identical in both modes.
    #[serde(default)]
    pub relaxed_mode: bool,
}

/// Parse a toolset from YAML text and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] when parsing fails, or
/// [`ConfigError::Validation`] when a naming or uniqueness rule is violated.
pub fn load_toolset_str(contents: &str) -> Result<ToolsetConfig, ConfigError> {
    let toolset: ToolsetConfig = serde_yaml::from_str(contents)?;
    validate_toolset(&toolset)?;
    Ok(toolset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = "\
tools:
  - name: read_file
    params: [path, start_line, end_line]
  - name: attempt_completion
    params:
      - result
  - name: list_files
";

    #[test]
    fn load_sample_toolset() {
        let toolset = load_toolset_str(SAMPLE_YAML).expect("sample toolset loads");
        assert_eq!(toolset.tools.len(), 3);
        assert_eq!(toolset.tools[0].name, "read_file");
        assert_eq!(toolset.tools[0].params.len(), 3);
        assert_eq!(toolset.tools[1].params, vec!["result".to_string()]);
        assert!(toolset.tools[2].params.is_empty());
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let err = load_toolset_str("tools: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn from_pairs_round_trips_through_yaml() {
        let toolset = ToolsetConfig::from_pairs(&[("read_file", &["path"][..])]);
        let yaml = serde_yaml::to_string(&toolset).unwrap();
        let back = load_toolset_str(&yaml).unwrap();
        assert_eq!(back, toolset);
    }

    #[test]
    fn parser_options_default_is_strict() {
        let options = ParserOptions::default();
        assert!(!options.relaxed_mode);
        let parsed: ParserOptions = serde_yaml::from_str("{}").unwrap();
        assert!(!parsed.relaxed_mode);
    }
}
