//! shopbot: chat with the store assistant from the terminal
//!
//!   shopbot                         # interactive chat, config discovered
//!   shopbot --config shop.yaml      # explicit configuration file
//!   shopbot --data-dir fixtures     # JSON records from another directory
//!   shopbot --provider openai --model gpt-4o-mini
//!   shopbot functions               # print the advertised function specs

mod output;
mod repl;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopbot_core::FunctionSpec;
use shopbot_engine::{AppConfig, ConversationEngine};
use shopbot_functions::create_shop_registry;
use shopbot_storage::create_storage;

use crate::repl::Repl;

#[derive(Parser)]
#[command(name = "shopbot")]
#[command(about = "Store assistant that answers product, cart and order questions")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./shopbot.yaml, then the user config dir)
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding products.json, orders.json and cart.json
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    /// LLM provider (google, openai, anthropic, ollama, ...)
    #[arg(long)]
    provider: Option<String>,

    /// Model name for the provider
    #[arg(long)]
    model: Option<String>,

    /// Customer the session acts for
    #[arg(long, short)]
    user: Option<String>,

    /// Show function results and debug logs
    #[arg(long, short)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat (default)
    Chat,
    /// Print the function specs advertised to the model
    Functions,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let (mut config, source) =
        AppConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    match source {
        Some(path) => info!(path = %path.display(), "Using configuration file"),
        None => info!("Using default configuration"),
    }

    if let Some(ref dir) = cli.data_dir {
        config.set_data_dir(dir);
    }
    if let Some(ref provider) = cli.provider {
        config.llm.provider = provider.clone();
    }
    if let Some(ref model) = cli.model {
        config.llm.model = model.clone();
    }
    if let Some(ref user) = cli.user {
        config.default_user = user.clone();
    }
    config.debug |= cli.debug;
    Ok(config)
}

fn check_data_dir(config: &AppConfig) -> Result<()> {
    if let Some(dir) = config.data_dir() {
        let path = Path::new(dir);
        anyhow::ensure!(
            path.is_dir(),
            "Data directory {} does not exist",
            path.display()
        );
    }
    Ok(())
}

fn print_functions(config: &AppConfig) -> Result<()> {
    let registry = create_shop_registry(config.shop_context(create_storage(&config.storage)))
        .context("Failed to build function registry")?;
    let specs: Vec<serde_json::Value> = registry
        .schemas()
        .iter()
        .map(FunctionSpec::to_json_schema)
        .collect();
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

async fn run_chat(config: AppConfig) -> Result<()> {
    check_data_dir(&config)?;
    let storage = create_storage(&config.storage);

    let provider = config.llm.build_provider().with_context(|| {
        format!(
            "Failed to configure the {} provider; check that its API key is set",
            config.llm.provider
        )
    })?;
    info!(provider = %provider.provider_type(), model = provider.model_name(), "LLM ready");

    let engine = ConversationEngine::from_config(&config, Arc::new(provider), storage)
        .context("Failed to start the conversation engine")?;

    let store = &config.store;
    let mut repl = Repl::new(engine)
        .assistant_name(format!("{} Assistant", store.name))
        .welcome(format!(
            "Welcome to {} AI Assistant!\n\
             Your one-stop shop for sports equipment and apparel.\n\
             {} | {}\n\
             Free shipping on orders over $50 | 30-day returns",
            store.name, store.phone, store.email
        ))
        .hint("Search products - 'Find football equipment' or 'Show me running shoes'")
        .hint("Track orders   - 'Track my orders' or 'Where is order ORD001?'")
        .hint("Manage cart    - 'Show my cart' or 'Add FB001 to cart'")
        .hint("Get help       - 'What's your return policy?' or 'Store hours?'")
        .farewell(format!("Thanks for shopping with {}!", store.name));
    if config.debug {
        repl = repl.show_function_results().show_timing();
    }

    repl.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(config).await,
        Command::Functions => print_functions(&config),
    }
}
