use std::path::{Path, PathBuf};

use claude_relay::translate::anthropic_types::{ClaudeErrorWithStatus, ErrorBody, MessagesRequest};
use claude_relay::translate::error_map::{claude_error_to_openai, openai_error_to_claude};
use claude_relay::translate::openai_types::{ChatErrorResponse, OpenAIErrorWithStatus};
use claude_relay::translate::request::claude_to_openai;
use claude_relay::translate::response::openai_to_claude;
use claude_relay::{relay, RelayConfig};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "claude-relay",
    about = "Translate between the Claude Messages API and the OpenAI Chat Completions API",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Claude Messages request -> Chat Completions request
    Request {
        /// JSON file, or `-` for stdin
        file: PathBuf,

        /// Model name the client originally asked for (defaults to the request's model)
        #[arg(long)]
        origin_model: Option<String>,
    },

    /// Chat Completions response -> Claude Messages response
    Response {
        /// JSON file, or `-` for stdin
        file: PathBuf,
    },

    /// Chat Completions SSE stream -> Claude SSE stream
    Stream {
        /// Raw SSE capture, or `-` for stdin
        file: PathBuf,

        /// Prompt token count reported in message_start
        #[arg(long, default_value_t = 0)]
        prompt_tokens: u64,
    },

    /// Translate an error envelope to the other protocol
    Error {
        /// JSON file, or `-` for stdin
        file: PathBuf,

        /// Protocol the envelope is written in
        #[arg(long, value_enum)]
        from: Protocol,

        /// HTTP status that came with the envelope
        #[arg(long, default_value_t = 500)]
        status: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Protocol {
    Openai,
    Claude,
}

#[derive(Deserialize)]
struct ClaudeErrorResponse {
    error: ErrorBody,
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        return Ok(buf);
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Translated output goes to stdout, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claude_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in claude_relay::config::config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given, see --help");
    };

    let config = RelayConfig::find_and_load(cli.config.as_deref())?;

    match command {
        Command::Request { file, origin_model } => {
            let req: MessagesRequest = serde_json::from_str(&read_input(&file).await?)?;
            let origin = origin_model.unwrap_or_else(|| req.model.clone());
            let translated = claude_to_openai(&req, &origin, &config)?;
            info!(
                model = %translated.model,
                messages = translated.messages.len(),
                "Translated request"
            );
            print_json(&translated)?;
        }
        Command::Response { file } => {
            let resp = relay::parse_completion(&read_input(&file).await?)?;
            print_json(&openai_to_claude(&resp))?;
        }
        Command::Stream {
            file,
            prompt_tokens,
        } => {
            let body = read_input(&file).await?;
            let upstream =
                futures::stream::iter([Ok::<_, std::io::Error>(bytes::Bytes::from(body))]);
            let events = relay::translate_sse(upstream, prompt_tokens, &config);
            tokio::pin!(events);

            while let Some(event) = events.next().await {
                print!("{}", event?);
            }
        }
        Command::Error { file, from, status } => {
            let body = read_input(&file).await?;
            match from {
                Protocol::Openai => {
                    let parsed: ChatErrorResponse = serde_json::from_str(&body)?;
                    let err = OpenAIErrorWithStatus {
                        error: parsed.error,
                        status_code: status,
                    };
                    print_json(&openai_error_to_claude(&err, &config.error_type))?;
                }
                Protocol::Claude => {
                    let parsed: ClaudeErrorResponse = serde_json::from_str(&body)?;
                    let err = ClaudeErrorWithStatus {
                        error: parsed.error,
                        status_code: status,
                    };
                    print_json(&claude_error_to_openai(&err, &config.error_type))?;
                }
            }
        }
    }

    Ok(())
}
