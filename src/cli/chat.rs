// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Interactive chat session

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::{format_stats, index_file, print_answer, print_sources, ChatArgs};
use crate::config::{GeminiConfig, RagConfig};
use crate::rag::{Conversation, RagEngine};

const HELP: &str = "\
Commands:
  /docs [name]     list indexed documents, or show one
  /add <path>      index another file
  /remove <name>   remove a document and its chunks
  /clear           forget the conversation
  /reset           remove all documents and forget the conversation
  /stats           show document, chunk and conversation counts
  /help            show this help
  /quit            leave
Anything else is asked as a question.";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Docs(Option<String>),
    Add(PathBuf),
    Remove(String),
    Clear,
    Reset,
    Stats,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        if !line.starts_with('/') {
            return ChatCommand::Ask(line.to_string());
        }

        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        match (command, argument.is_empty()) {
            ("/docs", true) => ChatCommand::Docs(None),
            ("/docs", false) => ChatCommand::Docs(Some(argument.to_string())),
            ("/add", false) => ChatCommand::Add(PathBuf::from(argument)),
            ("/add", true) => ChatCommand::Invalid("usage: /add <path>".to_string()),
            ("/remove", false) => ChatCommand::Remove(argument.to_string()),
            ("/remove", true) => ChatCommand::Invalid("usage: /remove <name>".to_string()),
            ("/clear", _) => ChatCommand::Clear,
            ("/reset", _) => ChatCommand::Reset,
            ("/stats", _) => ChatCommand::Stats,
            ("/help", _) => ChatCommand::Help,
            ("/quit", _) | ("/exit", _) => ChatCommand::Quit,
            (other, _) => ChatCommand::Invalid(format!("unknown command {}, try /help", other)),
        }
    }
}

pub async fn run(gemini: &GeminiConfig, rag: RagConfig, args: ChatArgs) -> Result<()> {
    let engine = RagEngine::connect_gemini(gemini, rag)
        .await
        .context("Failed to initialise the RAG engine")?;
    let top_k = args.top_k.unwrap_or(engine.config().top_k);

    for path in &args.files {
        if let Err(e) = index_file(&engine, path).await {
            eprintln!("Error: {:#}", e);
        }
    }

    println!(
        "Ready (embeddings: {}, chat: {}). Type /help for commands.",
        engine.embed_model(),
        engine.chat_model()
    );

    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::Invalid(message) => println!("{}", message),
            ChatCommand::Docs(Some(name)) => match engine.get_document(&name).await {
                Some(stats) => println!(
                    "  {} (indexed {})",
                    format_stats(&stats),
                    stats.ingested_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("No document named {}", name),
            },
            ChatCommand::Docs(None) => {
                let documents = engine.list_documents().await;
                if documents.is_empty() {
                    println!("No documents indexed.");
                }
                for stats in documents {
                    println!("  {}", format_stats(&stats));
                }
            }
            ChatCommand::Add(path) => {
                if let Err(e) = index_file(&engine, &path).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            ChatCommand::Remove(name) => {
                if engine.remove_document(&name).await {
                    println!("Removed {}", name);
                } else {
                    println!("No document named {}", name);
                }
            }
            ChatCommand::Clear => {
                conversation.clear();
                println!("Conversation cleared.");
            }
            ChatCommand::Reset => {
                engine.clear().await;
                conversation.clear();
                println!("All documents and the conversation were cleared.");
            }
            ChatCommand::Stats => {
                println!(
                    "{} documents, {} chunks, {} questions ({} turns)",
                    engine.list_documents().await.len(),
                    engine.total_chunks().await,
                    conversation.user_turns(),
                    conversation.len()
                );
            }
            ChatCommand::Ask(question) => {
                conversation.push_user(question.clone());

                let result = match engine.query(&question, top_k, conversation.turns()).await {
                    Ok(answer) => print_answer(answer).await,
                    Err(e) => Err(e.into()),
                };

                match result {
                    Ok((text, sources)) => {
                        print_sources(&sources, false);
                        conversation.push_assistant(text, sources);
                    }
                    Err(e) => {
                        warn!("Question failed: {:#}", e);
                        eprintln!("Error: {:#}", e);
                        conversation.push_error(&e);
                    }
                }
            }
        }
    }

    Ok(())
}
