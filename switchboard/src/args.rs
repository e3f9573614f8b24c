use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use url::Url;

/// Switchboard chat client
#[derive(Debug, Parser)]
#[command(name = "switchboard", about = "Chat with Ollama and OpenAI-compatible backends through one interface")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SWITCHBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend to talk to
    #[arg(short, long, default_value = "ollama", env = "SWITCHBOARD_BACKEND")]
    pub backend: String,

    /// Model, overriding the configured one
    #[arg(short, long, env = "SWITCHBOARD_MODEL")]
    pub model: Option<String>,

    /// Override the backend's base URL
    #[arg(long)]
    pub endpoint: Option<Url>,

    /// Override the per-request deadline (e.g. "30s", "5m")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "SWITCHBOARD_LOG")]
    pub log: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one prompt and print the reply
    Chat(ChatArgs),
    /// List the models the backend serves
    Models,
}

#[derive(Debug, clap::Args)]
pub struct ChatArgs {
    /// Prompt text; multiple words are joined with spaces
    #[arg(required = true)]
    pub prompt: Vec<String>,

    /// System instruction sent before the prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Print the reply as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Backend option as key=value; values are parsed as JSON when possible
    #[arg(short = 'o', long = "option", value_parser = parse_option)]
    pub options: Vec<(String, Value)>,
}

fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty option name in `{raw}`"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}
