pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;

use client::ApiClient;
use config::SessionStore;

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Mini Notes CLI - Command-line client for the Mini Notes API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "MINI_NOTES_SERVER", default_value = DEFAULT_SERVER, help = "API base URL")]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Registration, login and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Create, search, edit and delete notes")]
    Notes {
        #[command(subcommand)]
        cmd: commands::notes::NotesCommands,
    },

    #[command(about = "Profile, statistics, data export and account deletion")]
    Account {
        #[command(subcommand)]
        cmd: commands::account::AccountCommands,
    },

    #[command(about = "Check that the server and its database are up")]
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Run one command; failures are reported in the selected output format before returning
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let result = dispatch(cli, &output_format).await;
    if let Err(e) = &result {
        utils::output_error(&output_format, e)?;
    }
    result
}

async fn dispatch(cli: Cli, output_format: &OutputFormat) -> anyhow::Result<()> {
    let mut client = ApiClient::new(&cli.server, SessionStore::default_location()?)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut client, output_format.clone()).await,
        Commands::Notes { cmd } => commands::notes::handle(cmd, &mut client, output_format.clone()).await,
        Commands::Account { cmd } => commands::account::handle(cmd, &mut client, output_format.clone()).await,
        Commands::Health => health(&mut client, output_format).await,
    }
}

async fn health(client: &mut ApiClient, output_format: &OutputFormat) -> anyhow::Result<()> {
    let reply = client.get("/health").await?;
    utils::output_success(
        output_format,
        &format!("{} is healthy", client.base_url()),
        Some(&json!({ "server": client.base_url(), "health": reply.data() })),
    )
}
