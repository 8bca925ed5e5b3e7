//! Translate Claude Messages API requests into canonical (`OpenAI` Chat Completions) requests.
//!
//! Handles system prompts, multi-part content (text, images), tool use, tool results,
//! stop-sequence arity and tool choice mapping. A single Claude message can expand into
//! several canonical messages: every `tool_result` block becomes its own `tool`-role message.

use super::anthropic_types::{
    ContentBlock, Message, MessagesRequest, Role, SystemContent, ToolChoice,
};
use super::content::{encode_arguments, image_part, tool_result_text};
use super::openai_types::{
    ChatCompletionRequest, ChatContent, ChatFunction, ChatMessage, ChatRole, ChatTool,
    ChatToolCall, ChatToolCallFunction, ChatToolChoice, ChatToolChoiceFunction,
    ChatToolChoiceSpecific, ContentPart, StopSequences, StreamOptions,
};
use crate::config::RelayConfig;
use crate::error::Result;

/// Translate a Claude request into a canonical request.
///
/// `origin_model` is the model name the caller originally asked for, which may
/// carry the reasoning-mode suffix that the routed model name lost.
///
/// # Errors
/// Returns `RelayError::ContentParse` if a message's content cannot be decoded.
pub fn claude_to_openai(
    req: &MessagesRequest,
    origin_model: &str,
    config: &RelayConfig,
) -> Result<ChatCompletionRequest> {
    let mut messages = Vec::new();

    if let Some(system) = system_message(req) {
        messages.push(system);
    }

    for msg in &req.messages {
        messages.extend(translate_message(msg)?);
    }

    let tools = req
        .tools
        .as_ref()
        .filter(|tools| !tools.is_empty())
        .map(|tools| {
            tools
                .iter()
                .map(|t| ChatTool {
                    tool_type: "function".to_string(),
                    function: ChatFunction {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    },
                })
                .collect()
        });

    let streaming = req.stream.unwrap_or(false);
    let stream_options = (streaming && config.include_stream_usage).then_some(StreamOptions {
        include_usage: true,
    });

    Ok(ChatCompletionRequest {
        model: target_model(req, origin_model, &config.thinking_suffix),
        messages,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        top_p: req.top_p,
        stream: req.stream,
        stream_options,
        tools,
        tool_choice: req.tool_choice.as_ref().map(translate_tool_choice),
        stop: stop_sequences(req.stop_sequences.as_deref()),
        user: req.metadata.as_ref().and_then(|m| m.user_id.clone()),
    })
}

/// Re-append the reasoning-mode suffix when the caller asked for it but the
/// routed model name dropped it.
fn target_model(req: &MessagesRequest, origin_model: &str, suffix: &str) -> String {
    if req.thinking.is_some()
        && !suffix.is_empty()
        && origin_model.ends_with(suffix)
        && !req.model.ends_with(suffix)
    {
        format!("{}{suffix}", req.model)
    } else {
        req.model.clone()
    }
}

fn stop_sequences(sequences: Option<&[String]>) -> Option<StopSequences> {
    match sequences? {
        [] => None,
        [single] => Some(StopSequences::Single(single.clone())),
        many => Some(StopSequences::Multiple(many.to_vec())),
    }
}

fn system_message(req: &MessagesRequest) -> Option<ChatMessage> {
    let text = match req.system.as_ref()? {
        SystemContent::Text(text) if text.is_empty() => return None,
        SystemContent::Blocks(blocks) if blocks.is_empty() => return None,
        system => system.as_text(),
    };

    Some(ChatMessage {
        role: ChatRole::System,
        content: Some(ChatContent::Text(text)),
        tool_calls: None,
        tool_call_id: None,
        name: None,
    })
}

/// A single Claude message expands to its tool-result messages (in block order)
/// followed by the message itself, unless it ends up with neither content nor
/// tool calls.
fn translate_message(msg: &Message) -> Result<Vec<ChatMessage>> {
    let role = match msg.role {
        Role::User => ChatRole::User,
        Role::Assistant => ChatRole::Assistant,
    };

    if let Some(text) = msg.string_content() {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![ChatMessage {
            role,
            content: Some(ChatContent::Text(text.to_string())),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }]);
    }

    let mut messages = Vec::new();
    let mut parts: Vec<ContentPart> = Vec::new();
    let mut tool_calls: Vec<ChatToolCall> = Vec::new();

    for block in msg.parse_content()? {
        match block {
            ContentBlock::Text { text } => parts.push(ContentPart::Text { text }),
            ContentBlock::Image { source } => parts.push(image_part(&source)),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ChatToolCall {
                id,
                call_type: "function".to_string(),
                function: ChatToolCallFunction {
                    name,
                    arguments: encode_arguments(&input),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                name,
                content,
                ..
            } => messages.push(ChatMessage {
                role: ChatRole::Tool,
                content: Some(ChatContent::Text(tool_result_text(content.as_ref()))),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
                name: name.filter(|n| !n.is_empty()),
            }),
            ContentBlock::Thinking { .. } | ContentBlock::Unsupported => {}
        }
    }

    // A message either makes calls or carries content; never both.
    let (content, tool_calls) = if tool_calls.is_empty() {
        ((!parts.is_empty()).then_some(ChatContent::Parts(parts)), None)
    } else {
        (None, Some(tool_calls))
    };

    if content.is_some() || tool_calls.is_some() {
        messages.push(ChatMessage {
            role,
            content,
            tool_calls,
            tool_call_id: None,
            name: None,
        });
    }

    Ok(messages)
}

fn translate_tool_choice(tc: &ToolChoice) -> ChatToolChoice {
    match tc {
        ToolChoice::Auto => ChatToolChoice::String("auto".to_string()),
        ToolChoice::Any => ChatToolChoice::String("required".to_string()),
        ToolChoice::None => ChatToolChoice::String("none".to_string()),
        ToolChoice::Tool { name } => ChatToolChoice::Specific(ChatToolChoiceSpecific {
            choice_type: "function".to_string(),
            function: ChatToolChoiceFunction { name: name.clone() },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::translate::anthropic_types::*;
    use serde_json::json;

    fn user(content: serde_json::Value) -> Message {
        Message {
            role: Role::User,
            content,
        }
    }

    fn request(messages: Vec<Message>) -> MessagesRequest {
        MessagesRequest {
            model: "gpt-4o".to_string(),
            max_tokens: Some(1024),
            messages,
            ..MessagesRequest::default()
        }
    }

    fn translate(req: &MessagesRequest) -> ChatCompletionRequest {
        claude_to_openai(req, &req.model, &RelayConfig::default()).unwrap()
    }

    #[test]
    fn test_simple_text_request() {
        let mut req = request(vec![user(json!("Hello"))]);
        req.system = Some(SystemContent::Text("You are helpful".to_string()));
        req.temperature = Some(0.5);
        req.top_p = Some(0.9);
        req.stream = Some(false);

        let result = translate(&req);

        assert_eq!(result.model, "gpt-4o");
        assert_eq!(result.max_tokens, Some(1024));
        assert_eq!(result.temperature, Some(0.5));
        assert_eq!(result.top_p, Some(0.9));
        assert_eq!(result.stream, Some(false));
        assert_eq!(result.stream_options, None);
        assert_eq!(result.messages.len(), 2); // system + user
        assert_eq!(result.messages[0].role, ChatRole::System);
        assert_eq!(
            result.messages[0].content,
            Some(ChatContent::Text("You are helpful".to_string()))
        );
        assert_eq!(result.messages[1].role, ChatRole::User);
        assert_eq!(
            result.messages[1].content,
            Some(ChatContent::Text("Hello".to_string()))
        );
    }

    #[test]
    fn test_empty_system_emits_no_message() {
        let mut req = request(vec![user(json!("hi"))]);
        req.system = Some(SystemContent::Text(String::new()));

        let result = translate(&req);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].role, ChatRole::User);
    }

    #[test]
    fn test_structured_system_is_concatenated() {
        let mut req = request(vec![user(json!("hi"))]);
        req.system = Some(SystemContent::Blocks(vec![
            SystemBlock {
                block_type: "text".to_string(),
                text: Some("Be ".to_string()),
            },
            SystemBlock {
                block_type: "text".to_string(),
                text: Some("brief.".to_string()),
            },
        ]));

        let result = translate(&req);
        assert_eq!(
            result.messages[0].content,
            Some(ChatContent::Text("Be brief.".to_string()))
        );
    }

    #[test]
    fn test_stop_sequence_arity() {
        let mut req = request(vec![user(json!("hi"))]);

        req.stop_sequences = Some(Vec::new());
        assert_eq!(translate(&req).stop, None);

        req.stop_sequences = None;
        assert_eq!(translate(&req).stop, None);

        req.stop_sequences = Some(vec!["END".to_string()]);
        assert_eq!(
            translate(&req).stop,
            Some(StopSequences::Single("END".to_string()))
        );

        req.stop_sequences = Some(vec!["END".to_string(), "STOP".to_string()]);
        let result = translate(&req);
        assert_eq!(
            result.stop,
            Some(StopSequences::Multiple(vec![
                "END".to_string(),
                "STOP".to_string()
            ]))
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap()["stop"],
            json!(["END", "STOP"])
        );
    }

    #[test]
    fn test_thinking_suffix_is_propagated() {
        let mut req = request(vec![user(json!("think hard"))]);
        req.model = "claude-3-7-sonnet".to_string();
        req.thinking = Some(ThinkingConfig {
            thinking_type: "enabled".to_string(),
            budget_tokens: Some(2048),
        });

        let result =
            claude_to_openai(&req, "claude-3-7-sonnet-thinking", &RelayConfig::default()).unwrap();
        assert_eq!(result.model, "claude-3-7-sonnet-thinking");

        // Already suffixed: not doubled.
        req.model = "claude-3-7-sonnet-thinking".to_string();
        let result =
            claude_to_openai(&req, "claude-3-7-sonnet-thinking", &RelayConfig::default()).unwrap();
        assert_eq!(result.model, "claude-3-7-sonnet-thinking");

        // Without a thinking config the model is left alone.
        req.model = "claude-3-7-sonnet".to_string();
        req.thinking = None;
        let result =
            claude_to_openai(&req, "claude-3-7-sonnet-thinking", &RelayConfig::default()).unwrap();
        assert_eq!(result.model, "claude-3-7-sonnet");
    }

    #[test]
    fn test_tools_map_to_function_tools() {
        let mut req = request(vec![user(json!("weather?"))]);
        let schema = json!({"type": "object", "properties": {"city": {"type": "string"}}});
        req.tools = Some(vec![Tool {
            name: "get_weather".to_string(),
            description: Some("Get the weather".to_string()),
            input_schema: schema.clone(),
        }]);
        req.tool_choice = Some(ToolChoice::Any);

        let result = translate(&req);
        let tools = result.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].tool_type, "function");
        assert_eq!(tools[0].function.name, "get_weather");
        assert_eq!(tools[0].function.parameters, schema);
        assert_eq!(
            result.tool_choice,
            Some(ChatToolChoice::String("required".to_string()))
        );
    }

    #[test]
    fn test_multipart_content_with_image() {
        let req = request(vec![user(json!([
            {"type": "text", "text": "What is this?"},
            {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "iVBOR"}},
        ]))]);

        let result = translate(&req);
        let Some(ChatContent::Parts(parts)) = &result.messages[0].content else {
            panic!("Expected multipart content");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            ContentPart::Text {
                text: "What is this?".to_string()
            }
        );
        let ContentPart::ImageUrl { image_url } = &parts[1] else {
            panic!("Expected image_url part");
        };
        assert_eq!(image_url.url, "data:image/png;base64,iVBOR");
    }

    #[test]
    fn test_tool_calls_suppress_media_content() {
        let req = request(vec![Message {
            role: Role::Assistant,
            content: json!([
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "London"}},
            ]),
        }]);

        let result = translate(&req);
        assert_eq!(result.messages.len(), 1);
        let msg = &result.messages[0];
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.content, None);

        let calls = msg.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].function.name, "get_weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"London"}"#);
    }

    #[test]
    fn test_tool_result_splits_into_tool_messages() {
        let req = request(vec![user(json!([
            {"type": "tool_result", "tool_use_id": "toolu_1", "name": "get_weather", "content": "rainy"},
            {"type": "tool_result", "tool_use_id": "toolu_2", "content": [{"type": "text", "text": "sunny"}]},
            {"type": "text", "text": "Now continue"},
        ]))]);

        let result = translate(&req);

        assert_eq!(result.messages.len(), 3);
        assert_eq!(result.messages[0].role, ChatRole::Tool);
        assert_eq!(result.messages[0].tool_call_id.as_deref(), Some("toolu_1"));
        assert_eq!(result.messages[0].name.as_deref(), Some("get_weather"));
        assert_eq!(
            result.messages[0].content,
            Some(ChatContent::Text("rainy".to_string()))
        );
        assert_eq!(result.messages[1].tool_call_id.as_deref(), Some("toolu_2"));
        assert_eq!(result.messages[1].name, None);
        assert_eq!(
            result.messages[1].content,
            Some(ChatContent::Text(r#"[{"text":"sunny","type":"text"}]"#.to_string()))
        );
        assert_eq!(result.messages[2].role, ChatRole::User);
    }

    #[test]
    fn test_empty_messages_are_dropped() {
        let req = request(vec![
            user(json!("")),
            user(json!([])),
            user(json!([{"type": "thinking", "thinking": "..."}])),
            user(json!("kept")),
        ]);

        let result = translate(&req);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(
            result.messages[0].content,
            Some(ChatContent::Text("kept".to_string()))
        );
    }

    #[test]
    fn test_undecodable_content_aborts_translation() {
        let req = request(vec![user(json!([{"type": "image"}]))]);

        let err = claude_to_openai(&req, "gpt-4o", &RelayConfig::default()).unwrap_err();
        assert!(matches!(err, RelayError::ContentParse { .. }));
    }

    #[test]
    fn test_streaming_requests_usage() {
        let mut req = request(vec![user(json!("hi"))]);
        req.stream = Some(true);
        req.metadata = Some(Metadata {
            user_id: Some("user-7".to_string()),
        });

        let result = translate(&req);
        assert_eq!(result.stream, Some(true));
        assert_eq!(
            result.stream_options,
            Some(StreamOptions {
                include_usage: true
            })
        );
        assert_eq!(result.user.as_deref(), Some("user-7"));

        let config = RelayConfig {
            include_stream_usage: false,
            ..RelayConfig::default()
        };
        let result = claude_to_openai(&req, "gpt-4o", &config).unwrap();
        assert_eq!(result.stream_options, None);
    }
}
