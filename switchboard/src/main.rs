#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod logging;

use std::io::Write;

use args::{Args, ChatArgs, Command};
use clap::Parser;
use futures_util::StreamExt;
use switchboard_config::{BackendConfig, Config};
use switchboard_llm::{ChatMessage, ChatParams, ChatReply, Client, LlmError, MessageInput};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init(&args.log, args.json_logs);

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);

    let client = Client::from_config(&config, &args.backend, args.model.clone())?;

    tracing::info!(backend = %client.backend(), model = %client.model(), "switchboard ready");

    match args.command {
        Command::Models => {
            let models = client.models().await?;
            let mut stdout = std::io::stdout();
            for model in models {
                writeln!(stdout, "{model}")?;
            }
        }
        Command::Chat(chat) => run_chat(&client, chat).await?,
    }

    Ok(())
}

/// Fold command-line overrides into the backend's config entry
fn apply_overrides(config: &mut Config, args: &Args) {
    if args.endpoint.is_none() && args.timeout.is_none() {
        return;
    }

    let key = config
        .backends
        .keys()
        .find(|name| name.eq_ignore_ascii_case(&args.backend))
        .cloned()
        .unwrap_or_else(|| args.backend.to_lowercase());

    let entry: &mut BackendConfig = config.backends.entry(key).or_default();

    if let Some(endpoint) = &args.endpoint {
        entry.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = &args.timeout {
        entry.timeout = Some(timeout.clone());
    }
}

async fn run_chat(client: &Client, chat: ChatArgs) -> anyhow::Result<()> {
    let mut messages: Vec<MessageInput> = Vec::new();
    if let Some(system) = chat.system {
        messages.push(ChatMessage::system(system).into());
    }
    messages.push(chat.prompt.join(" ").into());

    let mut params = ChatParams::new(messages).with_stream(chat.stream);
    for (key, value) in chat.options {
        params = params.with_option(key, value);
    }

    let mut stdout = std::io::stdout();

    match client.chat(params).await? {
        ChatReply::Complete(response) => {
            writeln!(stdout, "{}", response.text())?;
            if let Some(calls) = &response.tool_calls {
                writeln!(stdout, "{}", serde_json::to_string_pretty(calls)?)?;
            }
            tracing::debug!(usage = ?response.usage, finish_reason = ?response.finish_reason, "chat complete");
        }
        ChatReply::Stream(mut stream) => {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(chunk) => {
                        write!(stdout, "{}", chunk.text())?;
                        stdout.flush()?;
                        if let Some(calls) = &chunk.tool_calls {
                            writeln!(stdout)?;
                            writeln!(stdout, "{}", serde_json::to_string_pretty(calls)?)?;
                        }
                        if chunk.finish_reason.is_some() {
                            tracing::debug!(usage = ?chunk.usage, finish_reason = ?chunk.finish_reason, "stream finished");
                        }
                    }
                    Err(e) if is_skippable(&e) => tracing::warn!(error = %e, "skipping stream chunk"),
                    Err(e) => {
                        writeln!(stdout)?;
                        return Err(e.into());
                    }
                }
            }
            writeln!(stdout)?;
        }
    }

    Ok(())
}

/// A chunk that failed to decode; the backend keeps streaming after it
fn is_skippable(error: &LlmError) -> bool {
    matches!(error, LlmError::MalformedResponse { .. })
}
