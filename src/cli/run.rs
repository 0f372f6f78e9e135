use anyhow::Context;
use log::debug;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

use super::args::Args;
use crate::auth::EnvToken;
use crate::client::{Callbacks, ChatClient, SessionOutcome};
use crate::core::ClientConfig;
use crate::types::{ChatRequest, StreamingChatMessage};

pub async fn run(args: Args) -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let message = args.message.join(" ");
    if message.trim().is_empty() {
        anyhow::bail!("Message must not be empty");
    }

    let mut config = ClientConfig::load().context("Failed to load configuration")?;
    if let Some(provider) = args.provider {
        config.update_provider(provider);
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let conversation_id = args.conversation.unwrap_or_else(Uuid::new_v4);
    let model = args
        .model
        .unwrap_or_else(|| config.default_model().to_string());

    let mut request = ChatRequest::new(conversation_id, message, config.provider, model);
    if let Some(file_id) = args.file {
        request = request.with_file(file_id);
    }
    if let Some(temperature) = config.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens() {
        request = request.with_max_tokens(max_tokens);
    }

    debug!(
        "[SETTINGS] provider: {:?}, model: {}, conversation: {conversation_id}",
        config.provider, request.model
    );

    let client = ChatClient::new(config, Arc::new(EnvToken::new()));

    if args.no_stream {
        run_complete(&client, &request).await
    } else {
        run_streaming(&client, request).await
    }
}

async fn run_complete(client: &ChatClient, request: &ChatRequest) -> anyhow::Result<()> {
    let completion = client.complete(request).await?;

    println!("{}", completion.content);
    if !completion.code_blocks.is_empty() {
        println!();
        for block in &completion.code_blocks {
            match &block.description {
                Some(description) => {
                    println!("Filed {} code block {}: {description}", block.language, block.id);
                }
                None => println!("Filed {} code block {}", block.language, block.id),
            }
        }
    }
    Ok(())
}

async fn run_streaming(client: &ChatClient, request: ChatRequest) -> anyhow::Result<()> {
    let handler = Callbacks::new(
        |message| print_message(&message),
        |error| eprintln!("\nError: {error}"),
        || println!(),
    );

    let mut handle = client.start(request, handler);

    // Ctrl-C cancels the session instead of killing the process outright
    let cancel = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match handle.join().await {
        SessionOutcome::Completed => Ok(()),
        SessionOutcome::Errored => anyhow::bail!("Chat stream failed"),
        SessionOutcome::Cancelled => {
            println!();
            Ok(())
        }
    }
}

fn print_message(message: &StreamingChatMessage) {
    match message {
        StreamingChatMessage::Content { content, .. } => {
            print!("{content}");
            let _ = io::stdout().flush();
        }
        StreamingChatMessage::CodeBlock { code_block, .. } => {
            println!("\n```{}", code_block.language);
            println!("{}", code_block.code);
            println!("```");
        }
        StreamingChatMessage::Error { error, .. } => eprintln!("\nServer error: {error}"),
        StreamingChatMessage::Done { .. } => {}
    }
}
