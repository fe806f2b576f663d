//! Tabletalk application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Load configuration from TOML (CLI and env overrides applied)
//! 2. Open SQLite storage for conversations and users
//! 3. Wire the knowledge stores and the model backend (OpenAI, or
//!    deterministic mocks when no API key is configured)
//! 4. Optionally ingest a dataset given on the command line
//! 5. Run a line-oriented REPL: plain lines are conversational turns,
//!    `:load <path>` ingests a dataset, `:reset` clears the session,
//!    `:tags` prints the session's tags, `:quit` exits.

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use tabletalk_chat::{ChatEngine, ChatError};
use tabletalk_core::config::TabletalkConfig;
use tabletalk_model::{ChatModel, EmbeddingService, MockChatModel, MockEmbedding, OpenAiBackend};
use tabletalk_relational::SqlKnowledgeStore;
use tabletalk_storage::{ConversationRepository, Database, UserRepository};
use tabletalk_vector::VectorStore;

use cli::CliArgs;

/// Email of the implicit local REPL user.
const LOCAL_USER_EMAIL: &str = "local@tabletalk";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, with CLI/env overrides applied before anything else reads it.
    let config_file = args.resolve_config_path();
    let mut config = TabletalkConfig::load_or_default(&config_file);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    if let Some(mode) = args.resolve_mode() {
        config.retrieval.mode = mode;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Tabletalk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), mode = ?config.retrieval.mode, "Configuration loaded");

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let db = Arc::new(Database::new(&data_dir.join("tabletalk.db"))?);
    let conversations = Arc::new(ConversationRepository::new(Arc::clone(&db)));
    let users = Arc::new(UserRepository::new(Arc::clone(&db)));

    let user_id = match users.find_by_email(LOCAL_USER_EMAIL)? {
        Some(user) => user.id,
        None => {
            users
                .create(LOCAL_USER_EMAIL, "unused", Some("Local User"), None)?
                .id
        }
    };

    let relational = Arc::new(SqlKnowledgeStore::open(&data_dir.join("knowledge.db"))?);
    let batch_size = config.retrieval.embed_batch_size;

    // Model backend: OpenAI when a key is configured, deterministic mocks
    // otherwise so the REPL stays usable offline.
    match OpenAiBackend::from_env(config.model.clone()) {
        Ok(backend) => {
            tracing::info!(chat_model = %config.model.chat_model, "Using OpenAI backend");
            let vector = Arc::new(VectorStore::new(backend.clone(), batch_size));
            let engine = ChatEngine::new(
                config,
                vector,
                relational,
                Arc::new(backend),
                conversations,
                users,
            );
            run_repl(engine, args.dataset.as_deref(), &user_id).await
        }
        Err(_) => {
            tracing::warn!(
                "OPENAI_API_KEY not set — answers come from deterministic mock backends"
            );
            let vector = Arc::new(VectorStore::new(MockEmbedding::new(), batch_size));
            let engine = ChatEngine::new(
                config,
                vector,
                relational,
                Arc::new(MockChatModel::new()),
                conversations,
                users,
            );
            run_repl(engine, args.dataset.as_deref(), &user_id).await
        }
    }
}

/// Drive the interactive loop until `:quit` or end of input.
async fn run_repl<E, M>(
    engine: ChatEngine<E, M>,
    dataset: Option<&Path>,
    user_id: &str,
) -> Result<(), Box<dyn std::error::Error>>
where
    E: EmbeddingService + 'static,
    M: ChatModel + 'static,
{
    if let Some(path) = dataset {
        match engine.ingest(path).await {
            Ok(()) => println!("Ingested {}", path.display()),
            Err(e) => eprintln!("Ingestion failed: {}", e),
        }
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    println!("Session {session_id}");
    println!("Type a question, or :load <path>, :reset, :tags, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" => break,
            ":reset" => match engine.reset(&session_id) {
                Ok(()) => println!("Conversation cleared."),
                Err(ChatError::SessionNotFound(_)) => println!("Nothing to clear yet."),
                Err(e) => eprintln!("Reset failed: {}", e),
            },
            ":tags" => match engine.conversation(&session_id) {
                Ok(Some(convo)) if !convo.tags.is_empty() => {
                    println!("Tags: {}", convo.tags.join(", "))
                }
                Ok(_) => println!("No tags yet."),
                Err(e) => eprintln!("Could not read tags: {}", e),
            },
            _ if line.starts_with(":load ") => {
                let path = PathBuf::from(line.trim_start_matches(":load ").trim());
                match engine.ingest(&path).await {
                    Ok(()) => println!("Ingested {}", path.display()),
                    Err(e) => eprintln!("Ingestion failed: {}", e),
                }
            }
            _ if line.starts_with(':') => {
                println!("Unknown command: {line}");
            }
            message => match engine.answer_turn(user_id, &session_id, message).await {
                Ok(reply) => println!("{}  ({}s)", reply.response, reply.processing_time),
                Err(ChatError::NotReady) => {
                    println!("No knowledge base loaded yet. Use :load <path> to ingest a CSV.")
                }
                Err(e) => eprintln!("Turn failed: {}", e),
            },
        }
    }

    println!("Bye.");
    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").ok();
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").ok();
        if let Some(home) = home {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
