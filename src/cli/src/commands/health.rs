//! Health check command.
//!
//! Queries the `/health` endpoint and displays component status.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {
    /// Include database details
    #[arg(short, long)]
    detailed: bool,
}

pub async fn execute(args: HealthArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: serde_json::Value = client.get_raw("/health").await?;

    match format {
        OutputFormat::Table => {
            let status = health
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            output::print_header("System Health");
            output::print_detail("Status", status);
            output::print_detail("API URL", client.base_url());

            if let Some(version) = health.get("version").and_then(|v| v.as_str()) {
                output::print_detail("Version", version);
            }

            if let Some(ts) = health.get("timestamp").and_then(|v| v.as_str()) {
                output::print_detail("Timestamp", ts);
            }

            if args.detailed {
                if let Some(db) = health.get("database") {
                    output::print_header("Database");
                    if let Some(healthy) = db.get("healthy").and_then(|v| v.as_bool()) {
                        output::print_detail("Healthy", &healthy.to_string());
                    }
                    if let Some(latency) = db.get("latency_ms").and_then(|v| v.as_u64()) {
                        output::print_detail("Latency (ms)", &latency.to_string());
                    }
                    if let Some(pool) = db.get("pool_size").and_then(|v| v.as_u64()) {
                        output::print_detail("Pool size", &pool.to_string());
                    }
                }
            }

            if status == "healthy" {
                output::print_success("All systems operational");
            } else {
                output::print_error(&format!("System status: {}", status));
            }
        }
        _ => output::print_item(&health, format),
    }

    Ok(())
}
