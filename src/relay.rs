//! Stream adapters: feed an upstream `OpenAI` stream through a
//! [`StreamTranslator`] and get the Claude events to forward to the client.
//!
//! Each returned stream owns its translator, so every exchange gets its own
//! state and exchanges can run on unrelated tasks.

use std::fmt;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::translate::anthropic_types::StreamEvent;
use crate::translate::error_map::openai_error_to_claude;
use crate::translate::openai_types::{
    ChatCompletionChunk, ChatCompletionResponse, ChatErrorResponse, OpenAIErrorWithStatus,
};
use crate::translate::streaming::StreamTranslator;

/// Status attached to errors that arrive inside an already-open stream.
const IN_STREAM_ERROR_STATUS: u16 = 500;

/// One server-sent event, ready to be written to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

impl SseEvent {
    pub fn from_event(event: &StreamEvent) -> Result<Self> {
        Ok(Self {
            event: event.event_name().to_string(),
            data: serde_json::to_string(event)?,
        })
    }
}

impl fmt::Display for SseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event: {}\ndata: {}\n\n", self.event, self.data)
    }
}

/// Parse a non-streaming upstream body. An error envelope in place of a
/// completion is reported as [`RelayError::Upstream`].
pub fn parse_completion(body: &str) -> Result<ChatCompletionResponse> {
    if let Ok(err) = serde_json::from_str::<ChatErrorResponse>(body) {
        return Err(RelayError::upstream(err.error.message));
    }
    Ok(serde_json::from_str(body)?)
}

/// Translate a stream of parsed upstream chunks. The output starts with
/// `message_start` and ends with `message_stop`, even for an empty input.
pub fn translate_chunks<S>(chunks: S, prompt_tokens: u64) -> impl Stream<Item = StreamEvent> + Send + 'static
where
    S: Stream<Item = ChatCompletionChunk> + Send + 'static,
{
    async_stream::stream! {
        let mut translator = StreamTranslator::new(prompt_tokens);

        tokio::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            for event in translator.process_chunk(&chunk) {
                yield event;
            }
        }

        for event in translator.finish() {
            yield event;
        }
    }
}

/// Parse an upstream `OpenAI` SSE byte stream and translate it into Claude SSE events.
///
/// `[DONE]`, the end of the byte stream, and a transport error all end the
/// exchange with the closing frame. An error envelope sent inside the stream is
/// forwarded as a Claude `error` event and ends the stream.
pub fn translate_sse<S, B, E>(
    byte_stream: S,
    prompt_tokens: u64,
    config: &RelayConfig,
) -> impl Stream<Item = Result<SseEvent>> + Send + 'static
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let error_type = config.error_type.clone();

    async_stream::stream! {
        let mut translator = StreamTranslator::new(prompt_tokens);
        let events = byte_stream.eventsource();

        tokio::pin!(events);

        while let Some(item) = events.next().await {
            let message = match item {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "Upstream stream error");
                    break;
                }
            };

            let data = message.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                break;
            }

            if let Ok(err) = serde_json::from_str::<ChatErrorResponse>(data) {
                tracing::warn!(message = %err.error.message, "Upstream error inside stream");
                let claude = openai_error_to_claude(
                    &OpenAIErrorWithStatus {
                        error: err.error,
                        status_code: IN_STREAM_ERROR_STATUS,
                    },
                    &error_type,
                );
                yield SseEvent::from_event(&StreamEvent::Error { error: claude.error });
                return;
            }

            let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unparseable chunk");
                    continue;
                }
            };

            for event in translator.process_chunk(&chunk) {
                yield SseEvent::from_event(&event);
            }
        }

        for event in translator.finish() {
            yield SseEvent::from_event(&event);
        }

        tracing::debug!(
            blocks = translator.context().convert.index,
            finish_reason = ?translator.context().finish_reason,
            "Stream completed"
        );
    }
}
