//! State machine for translating `OpenAI` streaming chunks into Claude SSE events.
//!
//! [`openai_chunk_to_claude`] is called once per upstream chunk. Everything it
//! needs to remember between calls lives in the caller-owned [`ExchangeContext`],
//! so independent exchanges never share state and a context can be built by
//! hand to resume from any point. [`StreamTranslator`] owns one context and does
//! the bookkeeping a relay loop would otherwise repeat (response counting and
//! the terminal call).
//!
//! Block framing: at most one content block is open at a time. Whenever the
//! kind of content changes (text, thinking, tool call) the open block is
//! stopped and a new one is started at the next index, so indices are handed
//! out once each, in order.

use serde_json::{Map, Value};

use super::anthropic_types::{
    Delta, DeltaUsage, MessageDeltaBody, MessagesResponse, ResponseContentBlock, StreamEvent, Usage,
};
use super::openai_types::{ChatCompletionChunk, ChatUsage, ChunkToolCall};
use super::response::map_finish_reason;

/// Kind of content a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Thinking,
    Tools,
}

/// Content-block bookkeeping for one exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionState {
    /// Index of the open block, or of the next block when none is open.
    pub index: usize,
    /// Kind of the open block; `None` before the first block and after the final stop.
    pub last_kind: Option<BlockKind>,
    /// Upstream id of the call the open `tool_use` block belongs to.
    pub tool_call_id: Option<String>,
    /// Upstream position of that call within the chunk's `tool_calls`.
    pub tool_call_index: Option<u64>,
    /// Token usage reported by the upstream, if any.
    pub usage: Option<ChatUsage>,
}

impl ConversionState {
    fn close_block(&mut self, events: &mut Vec<StreamEvent>) {
        if self.last_kind.take().is_some() {
            events.push(StreamEvent::ContentBlockStop { index: self.index });
            self.index += 1;
            self.tool_call_id = None;
            self.tool_call_index = None;
        }
    }

    fn open_block(
        &mut self,
        kind: BlockKind,
        content_block: ResponseContentBlock,
        events: &mut Vec<StreamEvent>,
    ) {
        self.close_block(events);
        events.push(StreamEvent::ContentBlockStart {
            index: self.index,
            content_block,
        });
        self.last_kind = Some(kind);
    }

    fn delta(&self, delta: Delta) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index: self.index,
            delta,
        }
    }

    /// A parallel call started: the fragment sits at another position, or it
    /// carries an id that is not the open call's. Ids only appear on a call's
    /// first fragment.
    fn is_new_call(&self, call: &ChunkToolCall) -> bool {
        if self.tool_call_index.is_some_and(|open| open != call.index) {
            return true;
        }
        match call.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.tool_call_id.as_deref() != Some(id),
            None => false,
        }
    }
}

/// Per-exchange context threaded through every chunk call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeContext {
    /// 1-based number of the current call; the opening frame is emitted on 1.
    pub send_response_count: u64,
    /// Set on the terminal call.
    pub done: bool,
    /// Last finish reason the upstream reported.
    pub finish_reason: Option<String>,
    /// Input token count known before the stream starts.
    pub prompt_tokens: u64,
    pub convert: ConversionState,
}

impl ExchangeContext {
    pub fn new(prompt_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            ..Self::default()
        }
    }
}

/// Translate one upstream chunk, returning the Claude events it produces in
/// the order they must be sent.
///
/// The caller sets `send_response_count` (1 for the first chunk) and `done`
/// (for the terminal call) before each call, and must not call this
/// concurrently for the same context.
pub fn openai_chunk_to_claude(
    chunk: &ChatCompletionChunk,
    ctx: &mut ExchangeContext,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(ref usage) = chunk.usage {
        ctx.convert.usage = Some(usage.clone());
    }

    if ctx.send_response_count == 1 {
        events.push(message_start(chunk, ctx.prompt_tokens));
    }

    if ctx.done {
        if let Some(reason) = chunk.finish_reason() {
            ctx.finish_reason = Some(reason.to_string());
        }
        finish_message(ctx, &mut events);
        return events;
    }

    let Some(choice) = chunk.choices.first() else {
        return events;
    };

    // The closing frame waits for the terminal call, which carries the usage.
    // A tool call that arrives whole on the opening chunk still gets its block.
    if let Some(reason) = choice.finish_reason.as_deref().filter(|r| !r.is_empty()) {
        ctx.finish_reason = Some(reason.to_string());
        if ctx.send_response_count != 1 || chunk.first_tool_call().is_none() {
            return events;
        }
    }

    let delta = &choice.delta;
    let state = &mut ctx.convert;

    if let Some(call) = chunk.first_tool_call() {
        if state.last_kind != Some(BlockKind::Tools) || state.is_new_call(call) {
            state.open_block(BlockKind::Tools, tool_use_block(call), &mut events);
            state.tool_call_id = call.id.clone().filter(|id| !id.is_empty());
            state.tool_call_index = Some(call.index);
        }
        events.push(state.delta(Delta::InputJsonDelta {
            partial_json: call.arguments().to_string(),
        }));
    } else if let Some(thinking) = delta.reasoning_text() {
        if state.last_kind != Some(BlockKind::Thinking) {
            let block = ResponseContentBlock::Thinking {
                thinking: String::new(),
            };
            state.open_block(BlockKind::Thinking, block, &mut events);
        }
        events.push(state.delta(Delta::ThinkingDelta {
            thinking: thinking.to_string(),
        }));
    } else if let Some(text) = delta.text() {
        if state.last_kind != Some(BlockKind::Text) {
            let block = ResponseContentBlock::Text {
                text: String::new(),
            };
            state.open_block(BlockKind::Text, block, &mut events);
        }
        events.push(state.delta(Delta::TextDelta {
            text: text.to_string(),
        }));
    }

    events
}

fn message_start(chunk: &ChatCompletionChunk, prompt_tokens: u64) -> StreamEvent {
    let id = if chunk.id.is_empty() {
        format!("msg_{}", uuid::Uuid::new_v4().simple())
    } else {
        chunk.id.clone()
    };

    StreamEvent::MessageStart {
        message: MessagesResponse {
            id,
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            content: Vec::new(),
            model: chunk.model.clone(),
            stop_reason: None,
            stop_sequence: None,
            usage: Usage {
                input_tokens: prompt_tokens,
                output_tokens: 0,
            },
        },
    }
}

fn tool_use_block(call: &ChunkToolCall) -> ResponseContentBlock {
    ResponseContentBlock::ToolUse {
        id: call.id.clone().unwrap_or_default(),
        name: call.name().to_string(),
        input: Value::Object(Map::new()),
    }
}

fn finish_message(ctx: &mut ExchangeContext, events: &mut Vec<StreamEvent>) {
    ctx.convert.close_block(events);

    if let Some(ref usage) = ctx.convert.usage {
        let reason = ctx.finish_reason.as_deref().unwrap_or("stop");
        events.push(StreamEvent::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(map_finish_reason(reason)),
                stop_sequence: None,
            },
            usage: DeltaUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        });
    }

    events.push(StreamEvent::MessageStop);
}

/// Owns the context of one streaming exchange.
///
/// Usage:
///   let mut translator = StreamTranslator::new(prompt_tokens);
///   for chunk in openai_chunks {
///       let events = translator.process_chunk(&chunk);
///       // send each event as SSE
///   }
///   let final_events = translator.finish();
#[derive(Debug, Default)]
pub struct StreamTranslator {
    ctx: ExchangeContext,
    finished: bool,
}

impl StreamTranslator {
    pub fn new(prompt_tokens: u64) -> Self {
        Self {
            ctx: ExchangeContext::new(prompt_tokens),
            finished: false,
        }
    }

    /// Process a single upstream chunk, returning zero or more Claude events.
    pub fn process_chunk(&mut self, chunk: &ChatCompletionChunk) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.ctx.send_response_count += 1;
        openai_chunk_to_claude(chunk, &mut self.ctx)
    }

    /// Terminal call: close the open block and emit the final usage and stop
    /// events. Emits the opening frame too if no chunk was ever processed.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        self.ctx.send_response_count += 1;
        self.ctx.done = true;
        openai_chunk_to_claude(&ChatCompletionChunk::default(), &mut self.ctx)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn context(&self) -> &ExchangeContext {
        &self.ctx
    }
}
