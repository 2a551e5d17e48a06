use crate::block::ParamMap;
use crate::schema::{NodeId, ToolSchema};

/// The tool invocation currently being assembled.
#[derive(Debug, Clone)]
pub(crate) struct ToolUseBuilder {
    pub name: String,
    pub params: ParamMap,
}

/// All mutable parsing state, owned by one parser instance.
///
/// At most one of `text_buffer` / `param_value_buffer` fills at a time on
/// well-formed input; `current_tool_use` is present exactly while
/// `current_node` sits at or below a tool node.
#[derive(Debug)]
pub(crate) struct ParserContext {
    /// Characters accumulated outside any tool.
    pub text_buffer: String,
    /// Characters of the opening tag name being read.
    pub tag_buffer: String,
    /// Characters of the closing tag name being read.
    pub closing_tag_buffer: String,
    /// Characters of the parameter value being read.
    pub param_value_buffer: String,
    /// Position in the schema tree; starts at the root.
    pub current_node: NodeId,
    pub current_tool_use: Option<ToolUseBuilder>,
    pub current_param_name: Option<String>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self {
            text_buffer: String::new(),
            tag_buffer: String::new(),
            closing_tag_buffer: String::new(),
            param_value_buffer: String::new(),
            current_node: ToolSchema::ROOT,
            current_tool_use: None,
            current_param_name: None,
        }
    }

    /// Restore the post-construction condition so the parser can be reused.
    pub fn reset(&mut self) {
        self.text_buffer.clear();
        self.tag_buffer.clear();
        self.closing_tag_buffer.clear();
        self.param_value_buffer.clear();
        self.current_node = ToolSchema::ROOT;
        self.current_tool_use = None;
        self.current_param_name = None;
    }

    /// The buffer that absorbs recovered literal characters in the current
    /// context: the open parameter's value when one is open, prose otherwise.
    pub fn recovery_buffer(&mut self) -> &mut String {
        if self.current_param_name.is_some() {
            &mut self.param_value_buffer
        } else {
            &mut self.text_buffer
        }
    }
}
