//! Relay a captured upstream SSE body through the stream adapter.
//!
//! Usage:
//!   `cargo run --example relay_stream`
//!   `RUST_LOG=claude_relay=debug cargo run --example relay_stream`

use claude_relay::{relay, RelayConfig};
use futures::StreamExt;

const CAPTURE: &str = concat!(
    "data: {\"id\":\"chatcmpl-7\",\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Looking it up.\"}}]}\n\n",
    "data: {\"id\":\"chatcmpl-7\",\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"{\\\"city\\\":\"}}]}}]}\n\n",
    "data: {\"id\":\"chatcmpl-7\",\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"Berlin\\\"}\"}}]}}]}\n\n",
    "data: {\"id\":\"chatcmpl-7\",\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
    "data: {\"id\":\"chatcmpl-7\",\"model\":\"gpt-4o\",\"choices\":[],\"usage\":{\"prompt_tokens\":30,\"completion_tokens\":12,\"total_tokens\":42}}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = RelayConfig::find_and_load(None)?;

    // Feed the capture in small pieces to mimic network reads.
    let pieces: Vec<Result<bytes::Bytes, std::io::Error>> = CAPTURE
        .as_bytes()
        .chunks(48)
        .map(|c| Ok(bytes::Bytes::copy_from_slice(c)))
        .collect();

    let events = relay::translate_sse(futures::stream::iter(pieces), 30, &config);
    tokio::pin!(events);

    while let Some(event) = events.next().await {
        print!("{}", event?);
    }

    Ok(())
}
