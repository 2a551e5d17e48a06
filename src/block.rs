use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Parameter name → raw string value, exactly as collected from the stream.
pub type ParamMap = FxHashMap<String, String>;

/// A single emitted content item.
///
/// Blocks marked `partial` are chunk-boundary snapshots that may still grow;
/// the same logical block is re-published until its closing boundary is seen.
/// Once delivered, a block is never mutated by the parser — parameter maps
/// are defensive copies of the working state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Free-form prose outside any tool invocation, whitespace-trimmed.
    Text { content: String, partial: bool },
    /// An assembled tool invocation.
    ToolUse {
        name: String,
        params: ParamMap,
        partial: bool,
    },
}

impl ContentBlock {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        match self {
            ContentBlock::Text { partial, .. } | ContentBlock::ToolUse { partial, .. } => *partial,
        }
    }
}

/// Category of a parse anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Opening tag that matches no tool (at the root) or no parameter
    /// (inside a tool).
    UnknownTag,
    /// Whitespace after `<`, or attempted attributes inside a tag.
    MalformedTag,
    /// `</…>` while no tag is open.
    StrayClosingTag,
    /// `</x>` while the open tag is `y`.
    MismatchedClosingTag,
    /// A character where the grammar allows none.
    UnexpectedCharacter,
}

/// An advisory diagnostic published on the `error` callback.
///
/// Diagnostics never abort the parse; the offending characters are recovered
/// verbatim into the nearest text or parameter-value buffer. `message`
/// starts with a stable per-kind prefix so hosts may match on it without
/// depending on the full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_serde_round_trip() {
        let block = ContentBlock::Text {
            content: "hello".to_string(),
            partial: true,
        };
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        let back: ContentBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn tool_use_block_serializes_params() {
        let mut params = ParamMap::default();
        params.insert("path".to_string(), "a.txt".to_string());
        let block = ContentBlock::ToolUse {
            name: "read_file".to_string(),
            params,
            partial: false,
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["name"], "read_file");
        assert_eq!(json["params"]["path"], "a.txt");
        assert_eq!(json["partial"], false);
    }

    #[test]
    fn is_partial_reflects_flag() {
        let block = ContentBlock::Text {
            content: String::new(),
            partial: true,
        };
        assert!(block.is_partial());
        let block = ContentBlock::ToolUse {
            name: "x".to_string(),
            params: ParamMap::default(),
            partial: false,
        };
        assert!(!block.is_partial());
    }
}
