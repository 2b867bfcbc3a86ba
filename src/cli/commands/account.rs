use std::path::PathBuf;

use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::commands::auth::require_session;
use crate::cli::utils::{output_record, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AccountCommands {
    #[command(about = "Show note statistics")]
    Stats,

    #[command(about = "Download all account data as JSON")]
    Export {
        #[arg(long, short, help = "Write to this file instead of the server-suggested name")]
        output: Option<PathBuf>,
    },

    #[command(about = "Change username and/or email")]
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    #[command(about = "Permanently delete the account")]
    Delete {
        #[arg(long, help = "Keep notes, detached from the account, instead of deleting them")]
        keep_notes: bool,
        #[arg(long, help = "Confirm deletion")]
        yes: bool,
    },
}

pub async fn handle(cmd: AccountCommands, client: &mut ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    require_session(client)?;

    match cmd {
        AccountCommands::Stats => {
            let reply = client.get("/api/account/stats").await?;
            output_record(&output_format, reply.data())
        }
        AccountCommands::Export { output } => {
            let reply = client.get("/api/account/export").await?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(
                    reply
                        .content_disposition
                        .as_deref()
                        .and_then(filename_from_disposition)
                        .unwrap_or("mini-notes-data-export.json"),
                )
            });
            std::fs::write(&path, serde_json::to_string_pretty(&reply.body)?)?;
            output_success(
                &output_format,
                &format!("Exported account data to {}", path.display()),
                Some(&json!({ "path": path.display().to_string() })),
            )
        }
        AccountCommands::Profile { username, email } => {
            let mut body = Map::new();
            if let Some(username) = username {
                body.insert("username".into(), json!(username));
            }
            if let Some(email) = email {
                body.insert("email".into(), json!(email));
            }
            if body.is_empty() {
                anyhow::bail!("Provide --username and/or --email");
            }
            let reply = client.patch("/api/account/profile", &Value::Object(body)).await?;
            output_success(&output_format, "Profile updated", Some(reply.data()))
        }
        AccountCommands::Delete { keep_notes, yes } => {
            if !yes {
                anyhow::bail!("This permanently deletes your account. Re-run with --yes to confirm.");
            }
            let reply = client
                .delete("/api/account", Some(&json!({ "deleteNotes": !keep_notes })))
                .await?;
            client.end_session()?;
            output_success(&output_format, "Account deleted", Some(reply.data()))
        }
    }
}

/// Extract `name` from `attachment; filename="name"`
fn filename_from_disposition(value: &str) -> Option<&str> {
    let start = value.find("filename=")? + "filename=".len();
    let name = value[start..].trim().trim_matches('"');
    // Server-suggested names must stay inside the working directory
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
        return None;
    }
    Some(name)
}
