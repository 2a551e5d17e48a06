use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::{ConfigError, ToolsetConfig};

static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_-]*$").expect("tag name pattern"));

/// Validate a toolset, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any toolset invariant is violated.
pub fn validate_toolset(toolset: &ToolsetConfig) -> Result<(), ConfigError> {
    validate_tool_names(toolset)?;
    validate_param_names(toolset)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_tag_name(context: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(validation_err(format!("{context}: name cannot be empty")));
    }
    if !TAG_NAME_RE.is_match(name) {
        return Err(validation_err(format!(
            "{context}: '{name}' is not a valid tag name (expected [A-Za-z_][A-Za-z0-9_-]*)"
        )));
    }
    Ok(())
}

fn validate_tool_names(toolset: &ToolsetConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for tool in &toolset.tools {
        validate_tag_name("Tool", &tool.name)?;
        if !seen.insert(tool.name.as_str()) {
            return Err(validation_err(format!(
                "Duplicate tool entry '{}'",
                tool.name
            )));
        }
    }
    Ok(())
}

fn validate_param_names(toolset: &ToolsetConfig) -> Result<(), ConfigError> {
    for tool in &toolset.tools {
        let mut seen = HashSet::new();
        for param in &tool.params {
            validate_tag_name(&format!("Tool '{}': parameter", tool.name), param)?;
            if !seen.insert(param.as_str()) {
                return Err(validation_err(format!(
                    "Tool '{}': duplicate parameter entry '{param}'",
                    tool.name
                )));
            }
        }
    }
    Ok(())
}
