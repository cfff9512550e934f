//! Organization (tenant) management commands.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum OrgCommands {
    /// List organizations (super admin)
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Results per page
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Create an organization (super admin)
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// URL-safe unique slug
        #[arg(short, long)]
        slug: String,

        /// Self-service join code
        #[arg(short, long)]
        access_code: String,
    },

    /// Show an organization
    Show {
        /// Organization ID
        org_id: Uuid,
    },
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateOrgRequest {
    name: String,
    slug: String,
    access_code: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct OrgInfo {
    id: Uuid,
    name: String,
    slug: String,
    access_code: String,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct OrgPage {
    items: Vec<OrgInfo>,
    meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    page: u32,
    total: u64,
    total_pages: u32,
}

#[derive(Debug, Serialize, Tabled)]
struct OrgRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(cmd: OrgCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        OrgCommands::List { page, per_page } => {
            let path = format!("/api/v1/organizations?page={}&per_page={}", page, per_page);
            let resp: OrgPage = client.get(&path).await?;

            match format {
                OutputFormat::Table => {
                    let rows: Vec<OrgRow> = resp
                        .items
                        .iter()
                        .map(|o| OrgRow {
                            id: o.id.to_string(),
                            name: o.name.clone(),
                            slug: o.slug.clone(),
                            created_at: o.created_at.clone(),
                        })
                        .collect();
                    output::print_list(&rows, format);
                    output::print_info(&format!(
                        "Page {} of {} ({} total)",
                        resp.meta.page, resp.meta.total_pages, resp.meta.total
                    ));
                }
                _ => output::print_item(&resp.items, format),
            }
        }

        OrgCommands::Create {
            name,
            slug,
            access_code,
        } => {
            let body = CreateOrgRequest {
                name,
                slug,
                access_code,
            };
            let org: OrgInfo = client.post("/api/v1/organizations", &body).await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Organization created");
                    output::print_detail("ID", &org.id.to_string());
                    output::print_detail("Name", &org.name);
                    output::print_detail("Slug", &org.slug);
                    output::print_detail("Access code", &org.access_code);
                }
                _ => output::print_item(&org, format),
            }
        }

        OrgCommands::Show { org_id } => {
            let org: OrgInfo = client.get(&format!("/api/v1/organizations/{}", org_id)).await?;

            match format {
                OutputFormat::Table => {
                    output::print_header(&org.name);
                    output::print_detail("ID", &org.id.to_string());
                    output::print_detail("Slug", &org.slug);
                    output::print_detail("Access code", &org.access_code);
                    output::print_detail("Created", &org.created_at);
                }
                _ => output::print_item(&org, format),
            }
        }
    }

    Ok(())
}
