//! User administration commands.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Update a user's global role (org/super admin)
    SetRole {
        /// User ID
        user_id: Uuid,

        /// New role: student, instructor, ta, co_instructor, org_admin, super_admin
        #[arg(short, long)]
        role: String,
    },

    /// Reassign a user to an organization (super admin)
    SetOrg {
        /// User ID
        user_id: Uuid,

        /// Target organization ID; omit to detach (independent)
        #[arg(short, long)]
        org_id: Option<Uuid>,
    },
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct UpdateRoleRequest {
    role: String,
}

#[derive(Serialize)]
struct UpdateOrgRequest {
    organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize)]
struct UserInfo {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    organization_id: Option<Uuid>,
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(cmd: UserCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        UserCommands::SetRole { user_id, role } => {
            let body = UpdateRoleRequest { role };
            let user: UserInfo = client
                .patch(&format!("/api/v1/users/{}/role", user_id), &body)
                .await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Role updated");
                    output::print_detail("User", &user.email);
                    output::print_detail("Role", &user.role);
                }
                _ => output::print_item(&user, format),
            }
        }

        UserCommands::SetOrg { user_id, org_id } => {
            let body = UpdateOrgRequest {
                organization_id: org_id,
            };
            let user: UserInfo = client
                .patch(&format!("/api/v1/users/{}/organization", user_id), &body)
                .await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Organization updated");
                    output::print_detail("User", &user.email);
                    output::print_detail(
                        "Organization",
                        &user
                            .organization_id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "independent".to_string()),
                    );
                }
                _ => output::print_item(&user, format),
            }
        }
    }

    Ok(())
}
