use crate::block::{ContentBlock, DiagnosticKind, ParamMap};
use crate::schema::ToolSchema;

use super::context::ToolUseBuilder;
use super::StreamingToolParser;

/// Identifier for the active transition function.
///
/// All mutable state lives in the parser context; a state is nothing but a
/// label selecting how the next character is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    /// Outside any tool, accumulating prose.
    Text,
    /// Immediately after `<`.
    TagOpening,
    /// Reading an opening tag name.
    TagName,
    /// Inside a tool or parameter, accumulating content.
    TextContent,
    /// Reading a closing tag name after `</`.
    ClosingTag,
}

impl StreamingToolParser {
    /// Advance the machine by one character.
    pub(crate) fn step(&mut self, ch: char) {
        match self.state {
            ParseState::Text => self.on_text(ch),
            ParseState::TagOpening => self.on_tag_opening(ch),
            ParseState::TagName => self.on_tag_name(ch),
            ParseState::TextContent => self.on_text_content(ch),
            ParseState::ClosingTag => self.on_closing_tag(ch),
        }
    }

    fn on_text(&mut self, ch: char) {
        if ch == '<' {
            self.flush_text_block();
            self.ctx.tag_buffer.clear();
            self.state = ParseState::TagOpening;
        } else if self.schema.allows_text(self.ctx.current_node) {
            self.ctx.text_buffer.push(ch);
        } else if ch.is_whitespace() {
            // tolerated between structural tags
        } else {
            self.report(
                DiagnosticKind::UnexpectedCharacter,
                "Unexpected character outside of allowed text content".to_string(),
            );
            self.ctx.text_buffer.push(ch);
        }
    }

    fn on_tag_opening(&mut self, ch: char) {
        if ch == '/' {
            if self.schema.node(self.ctx.current_node).parent().is_some() {
                self.ctx.closing_tag_buffer.clear();
                self.state = ParseState::ClosingTag;
            } else {
                self.report(
                    DiagnosticKind::StrayClosingTag,
                    "Closing tag without matching opening tag".to_string(),
                );
                self.ctx.text_buffer.push_str("</");
                self.state = ParseState::Text;
            }
        } else if ch.is_whitespace() {
            self.report(
                DiagnosticKind::MalformedTag,
                "Unexpected whitespace after '<'".to_string(),
            );
            let mut literal = String::from("<");
            literal.push(ch);
            self.recover_literal(&literal);
        } else {
            self.state = ParseState::TagName;
            self.append_tag_char(ch);
        }
    }

    fn on_tag_name(&mut self, ch: char) {
        if ch == '>' {
            if let Some(id) = self
                .schema
                .child_named(self.ctx.current_node, &self.ctx.tag_buffer)
            {
                self.open_node(id);
            } else {
                self.handle_invalid_tag(Some('>'));
            }
        } else if ch.is_whitespace() {
            // A known name followed by whitespace means attributes are being
            // attempted; the tag is discarded as invalid either way.
            if self
                .schema
                .child_named(self.ctx.current_node, &self.ctx.tag_buffer)
                .is_some()
            {
                self.report(
                    DiagnosticKind::MalformedTag,
                    "Unexpected whitespace in parameter tag".to_string(),
                );
            }
            self.handle_invalid_tag(Some(ch));
        } else {
            self.append_tag_char(ch);
        }
    }

    fn on_text_content(&mut self, ch: char) {
        if ch == '<' {
            self.ctx.tag_buffer.clear();
            self.state = ParseState::TagOpening;
        } else if self.ctx.current_param_name.is_some() {
            self.ctx.param_value_buffer.push(ch);
        } else if self.schema.allows_text(self.ctx.current_node) {
            self.ctx.text_buffer.push(ch);
        } else if ch.is_whitespace() {
            // whitespace between parameter tags inside a tool
        } else {
            let context = self.schema.node(self.ctx.current_node).name().to_string();
            self.report(
                DiagnosticKind::UnexpectedCharacter,
                format!("Unexpected character in <{context}> context"),
            );
            self.ctx.text_buffer.push(ch);
        }
    }

    fn on_closing_tag(&mut self, ch: char) {
        if ch == '>' {
            let closes_current = self.ctx.closing_tag_buffer
                == self.schema.node(self.ctx.current_node).name();
            if closes_current {
                self.close_current_node();
            } else {
                self.handle_mismatched_closing(true);
            }
        } else {
            self.ctx.closing_tag_buffer.push(ch);
            let still_prefix = self
                .schema
                .node(self.ctx.current_node)
                .name()
                .starts_with(self.ctx.closing_tag_buffer.as_str());
            if !still_prefix {
                self.handle_mismatched_closing(false);
            }
        }
    }

    // -- opening tags -------------------------------------------------------

    /// Append one character to the opening tag name and bail out as soon as
    /// no schema child can match the accumulated prefix.
    fn append_tag_char(&mut self, ch: char) {
        self.ctx.tag_buffer.push(ch);
        if !self
            .schema
            .has_child_with_prefix(self.ctx.current_node, &self.ctx.tag_buffer)
        {
            self.handle_invalid_tag(None);
        }
    }

    fn open_node(&mut self, id: crate::schema::NodeId) {
        if self.schema.is_tool(id) {
            self.ctx.current_tool_use = Some(ToolUseBuilder {
                name: self.schema.node(id).name().to_string(),
                params: ParamMap::default(),
            });
        } else {
            self.ctx.current_param_name = Some(self.schema.node(id).name().to_string());
            self.ctx.param_value_buffer.clear();
        }
        self.ctx.current_node = id;
        self.ctx.tag_buffer.clear();
        self.state = ParseState::TextContent;
    }

    /// Recover a buffered name that cannot match any child of the current
    /// node: the literal characters flow back into the surrounding content.
    fn handle_invalid_tag(&mut self, terminator: Option<char>) {
        let name = std::mem::take(&mut self.ctx.tag_buffer);
        let mut literal = String::with_capacity(name.len() + 2);
        literal.push('<');
        literal.push_str(&name);
        if let Some(term) = terminator {
            literal.push(term);
        }

        if self.ctx.current_node == ToolSchema::ROOT {
            self.report(
                DiagnosticKind::UnknownTag,
                format!("Invalid tool name: {name}"),
            );
            self.ctx.text_buffer.push_str(&literal);
            self.state = ParseState::Text;
        } else if self.schema.is_tool(self.ctx.current_node) {
            let tool = self.schema.node(self.ctx.current_node).name().to_string();
            self.report(
                DiagnosticKind::UnknownTag,
                format!("Invalid param name: {name} for tool {tool}"),
            );
            self.recover_literal(&literal);
        } else {
            self.report(
                DiagnosticKind::UnknownTag,
                format!("Invalid tag name: {name}"),
            );
            self.recover_literal(&literal);
        }
        tracing::debug!(tag = %name, "unmatched opening tag absorbed as literal content");
    }

    /// Absorb `literal` into the buffer for the current context and resume
    /// collecting content there.
    fn recover_literal(&mut self, literal: &str) {
        self.ctx.recovery_buffer().push_str(literal);
        self.state = if self.ctx.current_node == ToolSchema::ROOT {
            ParseState::Text
        } else {
            ParseState::TextContent
        };
    }

    // -- closing tags -------------------------------------------------------

    fn close_current_node(&mut self) {
        self.ctx.closing_tag_buffer.clear();
        if let Some(param_name) = self.ctx.current_param_name.take() {
            let value = std::mem::take(&mut self.ctx.param_value_buffer);
            if let Some(tool) = self.ctx.current_tool_use.as_mut() {
                tool.params.insert(param_name, value);
            }
            if let Some(parent) = self.schema.node(self.ctx.current_node).parent() {
                self.ctx.current_node = parent;
            }
            self.state = ParseState::TextContent;
        } else if let Some(tool) = self.ctx.current_tool_use.take() {
            self.events.block(ContentBlock::ToolUse {
                name: tool.name,
                params: tool.params,
                partial: false,
            });
            self.ctx.current_node = ToolSchema::ROOT;
            self.state = ParseState::Text;
        } else {
            // ClosingTag is only reachable below the root; nothing to close
            // means the context was already torn down by recovery.
            self.ctx.current_node = ToolSchema::ROOT;
            self.state = ParseState::Text;
        }
    }

    /// Recover a closing tag that does not match the open node. The literal
    /// flows into the open parameter's value when one is open; otherwise the
    /// open tool takes no text, so the machine drops back to prose at the
    /// root and the in-flight tool-use is abandoned (its last partial
    /// snapshot remains the final observation).
    fn handle_mismatched_closing(&mut self, terminated: bool) {
        let expected = self.schema.node(self.ctx.current_node).name().to_string();
        let actual = std::mem::take(&mut self.ctx.closing_tag_buffer);
        self.report(
            DiagnosticKind::MismatchedClosingTag,
            format!("Mismatched closing tag: expected </{expected}> but got </{actual}>"),
        );

        let mut literal = String::with_capacity(actual.len() + 3);
        literal.push_str("</");
        literal.push_str(&actual);
        if terminated {
            literal.push('>');
        }

        if self.ctx.current_param_name.is_some() {
            self.ctx.param_value_buffer.push_str(&literal);
            self.state = ParseState::TextContent;
        } else {
            tracing::debug!(expected = %expected, "abandoning open tool after unmatched closing tag");
            self.ctx.text_buffer.push_str(&literal);
            self.ctx.current_tool_use = None;
            self.ctx.current_node = ToolSchema::ROOT;
            self.state = ParseState::Text;
        }
    }

    // -- shared -------------------------------------------------------------

    /// Emit the pending prose as a finalized text block (trimmed; only if
    /// non-empty after the trim) and clear the buffer.
    pub(crate) fn flush_text_block(&mut self) {
        let trimmed = self.ctx.text_buffer.trim();
        if !trimmed.is_empty() {
            let content = trimmed.to_string();
            self.events.block(ContentBlock::Text {
                content,
                partial: false,
            });
        }
        self.ctx.text_buffer.clear();
    }
}
