mod cli;
mod config;
mod error;
mod openai_client;
mod serp_client;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

use crate::cli::chat::ChatContext;
use crate::config::{
    Credentials, Settings, DEFAULT_COMPLETION_ENDPOINT, DEFAULT_SEARCH_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};
use crate::openai_client::OpenAiClient;
use crate::serp_client::SerpClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ask a single question and exit
    #[arg(short, long)]
    input: Option<String>,

    /// Print the single answer as JSON (with --input)
    #[arg(long, requires = "input")]
    json: bool,

    /// Search API endpoint
    #[arg(long, default_value = DEFAULT_SEARCH_ENDPOINT)]
    search_endpoint: Url,

    /// Chat completion endpoint
    #[arg(long, default_value = DEFAULT_COMPLETION_ENDPOINT)]
    completion_endpoint: Url,

    /// Timeout for each API request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load API keys from a .env file if there is one
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shopping chat");

    let settings = Settings {
        search_endpoint: cli.search_endpoint,
        completion_endpoint: cli.completion_endpoint,
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let http = settings.http_client()?;

    let search = Arc::new(SerpClient::new(settings.search_endpoint.clone(), http.clone()));
    let completion = Arc::new(OpenAiClient::new(settings.completion_endpoint.clone(), http));

    let interactive = cli.input.is_none();
    let mut chat_context = ChatContext::new(
        Box::new(io::stdout()),
        cli.input,
        interactive,
        cli.json,
        Credentials::from_env(),
        search,
        completion,
    );
    chat_context.run().await
}
