use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_record, output_success, resolve_password};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and log in")]
    Register {
        #[arg(help = "Username (3-30 letters, digits, _ or -)")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Accept the Terms of Service")]
        accept_tos: bool,
    },

    #[command(about = "Log in with email and password")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current user information")]
    Me,

    #[command(about = "Accept the current Terms of Service")]
    AcceptTos,
}

pub async fn handle(cmd: AuthCommands, client: &mut ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Register { username, email, password, accept_tos } => {
            if !accept_tos {
                anyhow::bail!("You must accept the Terms of Service to register (pass --accept-tos)");
            }
            let password = resolve_password(password)?;
            let reply = client
                .post(
                    "/api/auth/register",
                    &json!({
                        "username": username,
                        "email": email,
                        "password": password,
                        "tosAccepted": true
                    }),
                )
                .await?;
            client.start_session(reply.data())?;
            output_success(&output_format, &format!("Registered and logged in as {}", username), Some(&reply.data()["user"]))
        }
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let reply = client
                .post("/api/auth/login", &json!({ "email": email, "password": password }))
                .await?;
            client.start_session(reply.data())?;

            let user = &reply.data()["user"];
            output_success(
                &output_format,
                &format!("Logged in as {}", user["username"].as_str().unwrap_or(&email)),
                Some(user),
            )?;
            if user["needsTosUpdate"].as_bool().unwrap_or(false) {
                eprintln!("The Terms of Service have changed. Run `notes auth accept-tos` to accept them.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            client.end_session()?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Me => {
            require_session(client)?;
            let reply = client.get("/api/auth/me").await?;
            output_record(&output_format, reply.data())
        }
        AuthCommands::AcceptTos => {
            require_session(client)?;
            let reply = client.post("/api/auth/accept-tos", &json!({})).await?;
            output_success(&output_format, "Terms of Service accepted", Some(reply.data()))
        }
    }
}

pub fn require_session(client: &ApiClient) -> anyhow::Result<()> {
    if client.session().is_none() {
        anyhow::bail!("Not logged in. Run `notes auth login <email>` first.");
    }
    Ok(())
}
