use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use notion_notes::error::{NotesError, NotesResult};
use notion_notes::notes_api::NotesApi;
use notion_notes::notion::NotionClient;
use notion_notes::server::{start_server, stop_server};
use notion_notes::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "NOTES_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// JSON config file; environment variables override its values
    #[arg(short, long, env = "NOTES_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> NotesResult<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let directive = format!("notion_notes={}", level)
        .parse::<Directive>()
        .map_err(|e| NotesError::Config(format!("Invalid log directive: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    let config = Arc::new(Config::load(args.config.as_deref())?);
    tracing::debug!("Loaded configuration: {:?}", config);

    let client = NotionClient::new(Arc::clone(&config))?;
    let api = Arc::new(NotesApi::new(client, config.default_page_size()));

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            stop_server();
        }
    });

    start_server(api, args.bind).await
}
