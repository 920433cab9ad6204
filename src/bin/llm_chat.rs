//! llm-chat: stream answers from an OpenAI-compatible endpoint in the terminal
//!
//! Usage:
//!   llm-chat --prompt "Explain lifetimes"        One-shot answer
//!   llm-chat --history chat.json --prompt "..."  One-shot with prior turns
//!   llm-chat                                     Interactive session
//!
//! Interactive commands: `/reset` clears the conversation, `/exit` quits.

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use llm_chat_stream::response::ERROR_PREFIX;
use llm_chat_stream::{ChatClientBuilder, ClientConfig, HistoryEntry, LlmResponder};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "llm-chat", version, about = "Stream chat answers from a hosted LLM")]
struct Args {
    /// Ask a single question and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// JSON array of {"role", "content"} entries used as prior context
    #[arg(long)]
    history: Option<PathBuf>,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model name override
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint root override, e.g. http://localhost:8000/v1
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::from_env(),
    };
    let mut builder = ChatClientBuilder::from_config(config);
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    if let Some(base_url) = args.base_url {
        builder = builder.base_url(base_url);
    }
    let responder = LlmResponder::new(builder.build()?);

    let mut history = match &args.history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };

    if let Some(prompt) = args.prompt {
        stream_answer(&responder, &prompt, &history).await?;
        return Ok(());
    }

    eprintln!(
        "Chatting with {} (/reset to clear, /exit to quit)",
        responder.client().model()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = match parse_command(&line) {
            Command::Skip => continue,
            Command::Exit => break,
            Command::Reset => {
                history.clear();
                eprintln!("(conversation cleared)");
                continue;
            }
            Command::Ask(input) => input,
        };

        let reply = stream_answer(&responder, input, &history).await?;
        if !record_turn(&mut history, input, reply) {
            eprintln!("(turn not kept in history)");
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Skip,
    Exit,
    Reset,
    Ask(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Skip,
        "/exit" | "/quit" => Command::Exit,
        "/reset" => Command::Reset,
        input => Command::Ask(input),
    }
}

/// Streamed answer as printed; `failed` is set when it ended with an error chunk.
#[derive(Debug, Default)]
struct Reply {
    text: String,
    failed: bool,
}

/// Append the exchange to `history` unless the answer failed.
fn record_turn(history: &mut Vec<HistoryEntry>, input: &str, reply: Reply) -> bool {
    if reply.failed {
        return false;
    }
    history.push(HistoryEntry::user(input));
    history.push(HistoryEntry::assistant(reply.text));
    true
}

fn load_history(path: &Path) -> anyhow::Result<Vec<HistoryEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading history {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing history {}", path.display()))
}

async fn stream_answer(
    responder: &LlmResponder,
    input: &str,
    history: &[HistoryEntry],
) -> anyhow::Result<Reply> {
    let mut chunks = Box::pin(responder.respond(input, Some(history)));
    let mut stdout = std::io::stdout();
    let mut reply = Reply::default();
    while let Some(chunk) = chunks.next().await {
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
        if chunk.starts_with(ERROR_PREFIX) {
            reply.failed = true;
        } else {
            reply.text.push_str(&chunk);
        }
    }
    writeln!(stdout)?;
    Ok(reply)
}
