//! Dungeon Task Master - Entry Point
//!
//! Sets up logging and configuration, then either serves the HTTP API or
//! runs an interactive console that resolves chat messages and applies them
//! to an in-memory ledger.

use dungeon_taskmaster::api::{self, AppState};
use dungeon_taskmaster::command::{ChatResolver, CommandExecutor, ExecutionResult};
use dungeon_taskmaster::core::config::AppConfig;
use dungeon_taskmaster::core::error::Result;
use dungeon_taskmaster::core::types::TaskFilter;
use dungeon_taskmaster::llm::client::LlmClient;
use dungeon_taskmaster::llm::prompt::PromptContext;
use dungeon_taskmaster::store::{Task, TaskStore};

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Dungeon Task Master - manage quests by chatting with an ancient dungeon
#[derive(Parser, Debug)]
#[command(name = "dungeon-taskmaster")]
#[command(about = "Quest ledger with a natural language chat interface")]
struct Args {
    /// TOML config file (environment variables override it)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Model name sent to the provider
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Chat with the ledger from the terminal
    Console,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dungeon_taskmaster=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(model) = args.model {
        config.llm_model = model;
    }
    config.validate()?;

    // Create the async runtime for the server and LLM calls
    let rt = Runtime::new()?;

    let resolver = build_resolver(&config)?;
    let store = Arc::new(TaskStore::new());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => rt.block_on(api::run(&config, AppState::new(store, resolver))),
        Command::Console => run_console(&rt, &store, &resolver),
    }
}

/// Model-backed resolver, or an offline one when no API key is set
fn build_resolver(config: &AppConfig) -> Result<ChatResolver> {
    match LlmClient::from_config(config)? {
        Some(client) => {
            tracing::info!(model = client.model(), format = ?client.api_format(), "Language model configured");
            Ok(ChatResolver::new(
                Arc::new(client),
                Duration::from_secs(config.llm_timeout_secs),
            ))
        }
        None => {
            tracing::warn!("LLM_API_KEY not set - chat will always fall back to showing all quests");
            Ok(ChatResolver::offline())
        }
    }
}

fn run_console(rt: &Runtime, store: &TaskStore, resolver: &ChatResolver) -> Result<()> {
    println!("\n=== DUNGEON TASK MASTER ===");
    println!("Speak, adventurer. The ledger listens.");
    println!();
    println!("Commands:");
    println!("  list / l        - Show every quest");
    println!("  quit / q        - Leave the dungeon");
    println!("  <any text>      - Chat command (parsed by the model)");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "q" {
            break;
        }

        let context = PromptContext::now();

        if input == "list" || input == "l" {
            print_tasks(&store.list(TaskFilter::All, context.today));
            continue;
        }

        let response = rt.block_on(resolver.resolve(input, &context));
        println!("\n{}\n", response.friendly_reply);

        let result = CommandExecutor::execute(store, &response.json, context.today);
        print_result(&result);
    }

    println!("\nFarewell! {} quest(s) remain in the ledger.", store.len());
    Ok(())
}

fn print_result(result: &ExecutionResult) {
    if let Some(error) = &result.error {
        println!("The ledger resists: {}", error);
        return;
    }
    match result.action {
        "delete" => println!("Quest erased."),
        _ => print_tasks(&result.tasks),
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No quests.");
        return;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let due = task
            .due_date
            .map(|d| format!(" (due {})", d))
            .unwrap_or_default();
        println!(
            "  [{}] #{} {} [{}]{}",
            mark, task.id, task.description, task.priority, due
        );
    }
}
