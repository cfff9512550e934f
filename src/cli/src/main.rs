//! Campus CLI - Command-line interface for managing a Campus LMS deployment.
//!
//! Provides commands for courses, organizations, users, sessions, health,
//! and configuration management.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{auth, config, course, health, org, user};
use output::OutputFormat;

/// Campus - Learning Management System CLI
#[derive(Parser)]
#[command(
    name = "campus",
    version = "0.1.0",
    about = "Campus - Learning Management System CLI",
    long_about = "CLI tool for managing Campus courses, organizations, users, and system configuration.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "CAMPUS_API_URL")]
    api_url: Option<String>,

    /// Bearer token (overrides the stored session)
    #[arg(long, global = true, env = "CAMPUS_TOKEN")]
    token: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session management (login, logout, whoami)
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Course management operations
    #[command(subcommand)]
    Course(course::CourseCommands),

    /// Organization (tenant) management operations
    #[command(subcommand)]
    Org(org::OrgCommands),

    /// User administration operations
    #[command(subcommand)]
    User(user::UserCommands),

    /// Check system health
    Health(health::HealthArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(config::load_api_url)
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let token = cli.token.clone().or_else(config::load_token);

    let client = client::ApiClient::new(&api_url, token)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Auth(cmd) => auth::execute(cmd, &client, format).await,
        Commands::Course(cmd) => course::execute(cmd, &client, format).await,
        Commands::Org(cmd) => org::execute(cmd, &client, format).await,
        Commands::User(cmd) => user::execute(cmd, &client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
