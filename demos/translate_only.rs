//! Run every translator once, offline.
//!
//! Usage:
//!   `cargo run --example translate_only`

use claude_relay::translate::anthropic_types::{MessagesRequest, SystemContent};
use claude_relay::translate::openai_types::{
    ChatCompletionChunk, ChatCompletionResponse, ChatContent, ChatUsage, Choice, ChoiceMessage,
    ChunkChoice, ChunkDelta,
};
use claude_relay::translate::request::claude_to_openai;
use claude_relay::translate::response::openai_to_claude;
use claude_relay::{RelayConfig, SseEvent, StreamTranslator};

fn chunk(delta: ChunkDelta, finish_reason: Option<&str>) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: "chatcmpl-demo".to_string(),
        object: "chat.completion.chunk".to_string(),
        model: "gpt-4o".to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta,
            finish_reason: finish_reason.map(str::to_string),
        }],
        ..Default::default()
    }
}

fn text(s: &str) -> ChunkDelta {
    ChunkDelta {
        content: Some(s.to_string()),
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    let config = RelayConfig::default();

    let claude_req = MessagesRequest {
        model: "gpt-4o".to_string(),
        max_tokens: Some(1024),
        messages: serde_json::from_value(serde_json::json!([
            {"role": "user", "content": "What is the capital of France?"},
            {"role": "assistant", "content": "The capital of France is Paris."},
            {"role": "user", "content": [{"type": "text", "text": "And Germany?"}]}
        ]))?,
        system: Some(SystemContent::Text(
            "You are a geography expert. Be concise.".to_string(),
        )),
        stream: Some(true),
        temperature: Some(0.7),
        stop_sequences: Some(vec!["\n\n".to_string()]),
        ..Default::default()
    };

    let openai_req = claude_to_openai(&claude_req, &claude_req.model, &config)?;

    println!("=== Translated Request (OpenAI format) ===");
    println!("{}", serde_json::to_string_pretty(&openai_req)?);

    let openai_resp = ChatCompletionResponse {
        id: "chatcmpl-demo".to_string(),
        object: "chat.completion".to_string(),
        model: "gpt-4o".to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChoiceMessage {
                role: "assistant".to_string(),
                content: Some(ChatContent::Text(
                    "The capital of Germany is Berlin.".to_string(),
                )),
                ..Default::default()
            },
            finish_reason: Some("stop".to_string()),
        }],
        usage: Some(ChatUsage {
            prompt_tokens: 42,
            completion_tokens: 8,
            total_tokens: 50,
        }),
        ..Default::default()
    };

    println!();
    println!("=== Translated Response (Claude format) ===");
    println!("{}", serde_json::to_string_pretty(&openai_to_claude(&openai_resp))?);

    println!();
    println!("=== Streaming Translation ===");

    let mut translator = StreamTranslator::new(42);
    let chunks = vec![
        chunk(
            ChunkDelta {
                role: Some("assistant".to_string()),
                reasoning_content: Some("Germany's capital...".to_string()),
                ..Default::default()
            },
            None,
        ),
        chunk(text("The capital"), None),
        chunk(text(" is Berlin."), None),
        chunk(ChunkDelta::default(), Some("stop")),
        ChatCompletionChunk {
            id: "chatcmpl-demo".to_string(),
            usage: Some(ChatUsage {
                prompt_tokens: 42,
                completion_tokens: 8,
                total_tokens: 50,
            }),
            ..Default::default()
        },
    ];

    for c in &chunks {
        for event in translator.process_chunk(c) {
            print!("{}", SseEvent::from_event(&event)?);
        }
    }
    for event in translator.finish() {
        print!("{}", SseEvent::from_event(&event)?);
    }

    Ok(())
}
