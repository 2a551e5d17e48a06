//! Streaming tool-invocation parser.
//!
//! Consumes model output chunk by chunk — chunk boundaries land at arbitrary
//! offsets, including mid-tag — and publishes typed content blocks as soon
//! as they are discernible. Incomplete blocks are re-published as `partial`
//! snapshots at chunk boundaries so downstream consumers can render
//! progressively.
//!
//! The parser is single-threaded and cooperative: one caller drives it
//! synchronously through [`StreamingToolParser::process_chunk`] and
//! [`StreamingToolParser::finalize`]. It performs no I/O, never returns an
//! error, and never panics on malformed input; anomalies surface as advisory
//! diagnostics on the `error` callback while the offending characters are
//! recovered as literal content.

mod context;
mod states;

use memchr::memchr;

use crate::block::{ContentBlock, DiagnosticKind, ParseDiagnostic};
use crate::config::ParserOptions;
use crate::schema::ToolSchema;

use self::context::ParserContext;
use self::states::ParseState;

type BlockHandler = Box<dyn FnMut(ContentBlock)>;
type ErrorHandler = Box<dyn FnMut(ParseDiagnostic)>;

/// Publishes blocks and diagnostics to the registered handlers.
#[derive(Default)]
struct EventSink {
    on_block: Option<BlockHandler>,
    on_error: Option<ErrorHandler>,
}

impl EventSink {
    fn block(&mut self, block: ContentBlock) {
        if let Some(handler) = self.on_block.as_mut() {
            handler(block);
        }
    }

    fn error(&mut self, diagnostic: ParseDiagnostic) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(diagnostic);
        }
    }
}

/// Incremental parser for the `<tool><param>value</param></tool>` grammar.
///
/// One instance handles one logical stream at a time; [`finalize`] resets it
/// for reuse. Event delivery order is a deterministic function of the
/// characters consumed — only the number and placement of `partial`
/// snapshots depend on how the stream is chunked.
///
/// [`finalize`]: StreamingToolParser::finalize
pub struct StreamingToolParser {
    schema: ToolSchema,
    options: ParserOptions,
    state: ParseState,
    ctx: ParserContext,
    events: EventSink,
}

impl StreamingToolParser {
    #[must_use]
    pub fn new(schema: ToolSchema, options: ParserOptions) -> Self {
        Self {
            schema,
            options,
            state: ParseState::Text,
            ctx: ParserContext::new(),
            events: EventSink::default(),
        }
    }

    /// Register the handler that receives content blocks.
    pub fn on_block(&mut self, handler: impl FnMut(ContentBlock) + 'static) {
        self.events.on_block = Some(Box::new(handler));
    }

    /// Register the handler that receives advisory diagnostics.
    pub fn on_error(&mut self, handler: impl FnMut(ParseDiagnostic) + 'static) {
        self.events.on_error = Some(Box::new(handler));
    }

    /// Consume one chunk of model output.
    ///
    /// May synchronously publish any number of `block` and `error` events.
    /// Ends by publishing at most one `partial` snapshot of whatever is
    /// still in flight.
    pub fn process_chunk(&mut self, chunk: &str) {
        let bytes = chunk.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() {
            // Bulk-scan runs that cannot change state: prose and parameter
            // values both end only at '<'. '<' is ASCII, so the scan always
            // stops on a character boundary.
            match self.state {
                ParseState::Text if self.schema.allows_text(self.ctx.current_node) => {
                    let run = memchr(b'<', &bytes[i..]).unwrap_or(bytes.len() - i);
                    if run > 0 {
                        self.ctx.text_buffer.push_str(&chunk[i..i + run]);
                        i += run;
                        continue;
                    }
                }
                ParseState::TextContent if self.ctx.current_param_name.is_some() => {
                    let run = memchr(b'<', &bytes[i..]).unwrap_or(bytes.len() - i);
                    if run > 0 {
                        self.ctx.param_value_buffer.push_str(&chunk[i..i + run]);
                        i += run;
                        continue;
                    }
                }
                _ => {}
            }

            let Some(ch) = chunk[i..].chars().next() else {
                break;
            };
            i += ch.len_utf8();
            self.step(ch);
        }
        self.emit_chunk_snapshot();
    }

    /// Signal end of stream.
    ///
    /// Pending trailing prose is emitted as a final block; a still-open
    /// tool-use is not re-emitted — its last `partial` snapshot remains the
    /// final observation. Afterwards the parser is back in its
    /// post-construction state and may be fed a new stream.
    pub fn finalize(&mut self) {
        if self.state == ParseState::Text {
            self.flush_text_block();
        }
        self.ctx.reset();
        self.state = ParseState::Text;
    }

    /// Publish one `partial` snapshot of whatever is in flight, if anything.
    fn emit_chunk_snapshot(&mut self) {
        if self.state == ParseState::Text {
            let trimmed = self.ctx.text_buffer.trim();
            if !trimmed.is_empty() {
                let content = trimmed.to_string();
                self.events.block(ContentBlock::Text {
                    content,
                    partial: true,
                });
            }
        } else if let Some(tool) = self.ctx.current_tool_use.as_ref() {
            // The published map is a copy; the working map is untouched
            // until the open parameter actually closes.
            let mut params = tool.params.clone();
            if let Some(param_name) = self.ctx.current_param_name.as_ref() {
                params.insert(param_name.clone(), self.ctx.param_value_buffer.clone());
            }
            let name = tool.name.clone();
            self.events.block(ContentBlock::ToolUse {
                name,
                params,
                partial: true,
            });
        }
    }

    /// Publish an advisory diagnostic, unless relaxed mode absorbs it.
    pub(crate) fn report(&mut self, kind: DiagnosticKind, message: String) {
        if self.options.relaxed_mode {
            tracing::trace!(?kind, %message, "suppressed parse diagnostic");
            return;
        }
        self.events.error(ParseDiagnostic { kind, message });
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
