use clap::Parser;
use uuid::Uuid;

use crate::types::Provider;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Your message to the assistant
    #[arg(required = true)]
    pub message: Vec<String>,

    /// Conversation to continue (a new one is generated when omitted)
    #[arg(short, long)]
    pub conversation: Option<Uuid>,

    /// LLM provider to route the turn to (openai or anthropic)
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// Model identifier, overriding the provider default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Attach a previously uploaded file
    #[arg(short, long)]
    pub file: Option<Uuid>,

    /// Backend base URL, overriding config.toml
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request the whole reply at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Enable debug output
    #[arg(short, long, default_value = "false")]
    pub debug: bool,
}
