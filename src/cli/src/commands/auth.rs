//! Session management commands.
//!
//! Login stores the access token in the CLI configuration; subsequent
//! commands send it as a bearer token.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::commands::config;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Revoke the current session token
    Logout,

    /// Show the currently authenticated user
    Whoami,
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize, Serialize)]
struct SessionInfo {
    user: UserInfo,
    token: String,
}

#[derive(Deserialize, Serialize)]
struct UserInfo {
    id: String,
    email: String,
    name: String,
    role: String,
    organization_id: Option<String>,
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(cmd: AuthCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => rpassword_prompt()?,
            };

            let body = LoginRequest { email, password };
            let session: SessionInfo = client.post("/api/v1/auth/login", &body).await?;

            config::store_token(&session.token)?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Logged in");
                    output::print_detail("User", &session.user.email);
                    output::print_detail("Role", &session.user.role);
                }
                _ => output::print_item(&session.user, format),
            }
        }

        AuthCommands::Logout => {
            let _: serde_json::Value = client.post("/api/v1/auth/logout", &()).await?;
            config::clear_token()?;
            output::print_success("Logged out");
        }

        AuthCommands::Whoami => {
            let user: UserInfo = client.get("/api/v1/me").await?;

            match format {
                OutputFormat::Table => {
                    output::print_header("Current User");
                    output::print_detail("ID", &user.id);
                    output::print_detail("Email", &user.email);
                    output::print_detail("Name", &user.name);
                    output::print_detail("Role", &user.role);
                    output::print_detail(
                        "Organization",
                        user.organization_id.as_deref().unwrap_or("independent"),
                    );
                }
                _ => output::print_item(&user, format),
            }
        }
    }

    Ok(())
}

/// Minimal hidden-input prompt without an extra dependency: reads a line
/// from stdin after a prompt. Password echo suppression is left to the
/// caller's terminal (use `--password` in scripts).
fn rpassword_prompt() -> Result<String> {
    use std::io::Write;
    print!("Password: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}
