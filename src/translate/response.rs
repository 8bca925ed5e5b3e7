use serde_json::Value;

use super::anthropic_types::{MessagesResponse, ResponseContentBlock, Usage};
use super::openai_types::{ChatCompletionResponse, Choice};

/// Translate a complete canonical response into a Claude Messages response.
///
/// Each choice yields exactly one content block. The overall stop reason comes
/// from the last choice.
pub fn openai_to_claude(resp: &ChatCompletionResponse) -> MessagesResponse {
    let content: Vec<ResponseContentBlock> = resp.choices.iter().map(choice_to_block).collect();

    let stop_reason = resp
        .choices
        .last()
        .map(|c| map_finish_reason(c.finish_reason.as_deref().unwrap_or_default()));

    let usage = resp.usage.as_ref().map_or_else(Usage::default, |u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    MessagesResponse {
        id: resp.id.clone(),
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        content,
        model: resp.model.clone(),
        stop_reason,
        stop_sequence: None,
        usage,
    }
}

/// Reasoning text on a complete message has no slot in the one-block-per-choice
/// shape and is not carried over; only streams surface thinking blocks.
fn choice_to_block(choice: &Choice) -> ResponseContentBlock {
    let first_call = choice
        .message
        .tool_calls
        .as_ref()
        .and_then(|calls| calls.first());

    match first_call {
        Some(call) if choice.finish_reason.as_deref() == Some("tool_calls") => {
            let input = serde_json::from_str::<Value>(&call.function.arguments).unwrap_or_else(|e| {
                tracing::debug!(
                    tool = %call.function.name,
                    error = %e,
                    "Tool arguments are not valid JSON, passing raw string"
                );
                Value::String(call.function.arguments.clone())
            });

            ResponseContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.function.name.clone(),
                input,
            }
        }
        _ => ResponseContentBlock::Text {
            text: choice
                .message
                .content
                .as_ref()
                .map(|c| c.as_text())
                .unwrap_or_default(),
        },
    }
}

/// Map a canonical finish reason to a Claude stop reason. Unknown reasons pass
/// through unchanged.
pub fn map_finish_reason(reason: &str) -> String {
    match reason {
        "stop" => "end_turn".to_string(),
        "stop_sequence" => "stop_sequence".to_string(),
        "max_tokens" => "max_tokens".to_string(),
        "tool_calls" => "tool_use".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::openai_types::*;

    fn make_response(choices: Vec<Choice>) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: "chatcmpl-abc123".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: "gpt-4o".to_string(),
            choices,
            usage: Some(ChatUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
        }
    }

    fn text_choice(content: &str, finish_reason: &str) -> Choice {
        Choice {
            index: 0,
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: Some(ChatContent::Text(content.to_string())),
                tool_calls: None,
            },
            finish_reason: Some(finish_reason.to_string()),
        }
    }

    fn tool_choice(arguments: &str) -> Choice {
        Choice {
            index: 0,
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(vec![ChatToolCall {
                    id: "call_abc".to_string(),
                    call_type: "function".to_string(),
                    function: ChatToolCallFunction {
                        name: "get_weather".to_string(),
                        arguments: arguments.to_string(),
                    },
                }]),
            },
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    #[test]
    fn test_simple_text_response() {
        let resp = make_response(vec![text_choice("Hello!", "stop")]);
        let result = openai_to_claude(&resp);

        assert_eq!(result.id, "chatcmpl-abc123");
        assert_eq!(result.response_type, "message");
        assert_eq!(result.role, "assistant");
        assert_eq!(result.model, "gpt-4o");
        assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(
            result.content,
            vec![ResponseContentBlock::Text {
                text: "Hello!".to_string()
            }]
        );
        assert_eq!(result.usage.input_tokens, 10);
        assert_eq!(result.usage.output_tokens, 20);
    }

    #[test]
    fn test_tool_call_response() {
        let resp = make_response(vec![tool_choice(r#"{"city":"London"}"#)]);
        let result = openai_to_claude(&resp);

        assert_eq!(result.content.len(), 1);
        assert_eq!(result.stop_reason.as_deref(), Some("tool_use"));

        let ResponseContentBlock::ToolUse { id, name, input } = &result.content[0] else {
            panic!("Expected tool_use content block");
        };
        assert_eq!(id, "call_abc");
        assert_eq!(name, "get_weather");
        assert_eq!(input["city"], "London");
    }

    #[test]
    fn test_malformed_tool_arguments_fall_back_to_raw_string() {
        let resp = make_response(vec![tool_choice("{bad json")]);
        let result = openai_to_claude(&resp);

        let ResponseContentBlock::ToolUse { input, .. } = &result.content[0] else {
            panic!("Expected tool_use content block");
        };
        assert_eq!(input, &Value::String("{bad json".to_string()));
    }

    #[test]
    fn test_one_block_per_choice_and_last_reason_wins() {
        let resp = make_response(vec![
            text_choice("first", "stop"),
            text_choice("second", "max_tokens"),
        ]);
        let result = openai_to_claude(&resp);

        assert_eq!(result.content.len(), 2);
        assert_eq!(result.stop_reason.as_deref(), Some("max_tokens"));
    }

    #[test]
    fn test_multipart_message_content_is_flattened() {
        let mut choice = text_choice("", "stop");
        choice.message.content = Some(ChatContent::Parts(vec![
            ContentPart::Text {
                text: "a".to_string(),
            },
            ContentPart::Text {
                text: "b".to_string(),
            },
        ]));
        let result = openai_to_claude(&make_response(vec![choice]));

        assert_eq!(
            result.content,
            vec![ResponseContentBlock::Text {
                text: "ab".to_string()
            }]
        );
    }

    #[test]
    fn test_reasoning_on_complete_message_is_not_carried_over() {
        let resp: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-r",
            "model": "deepseek-reasoner",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "42",
                    "reasoning_content": "let me think"
                },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        assert_eq!(
            openai_to_claude(&resp).content,
            vec![ResponseContentBlock::Text {
                text: "42".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_usage_defaults_to_zero() {
        let mut resp = make_response(vec![text_choice("x", "stop")]);
        resp.usage = None;
        assert_eq!(openai_to_claude(&resp).usage, Usage::default());
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason("stop"), "end_turn");
        assert_eq!(map_finish_reason("stop_sequence"), "stop_sequence");
        assert_eq!(map_finish_reason("max_tokens"), "max_tokens");
        assert_eq!(map_finish_reason("tool_calls"), "tool_use");
        assert_eq!(map_finish_reason("foo"), "foo");
    }
}
