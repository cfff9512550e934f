//! Course management commands.
//!
//! Provides list, create, show, publish, delete, and staff operations.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum CourseCommands {
    /// List courses visible to the current user
    List {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Results per page
        #[arg(long, default_value = "20")]
        per_page: u32,
    },

    /// Create a new course
    Create {
        /// Course title
        #[arg(short, long)]
        title: String,

        /// Course description
        #[arg(short, long)]
        description: Option<String>,

        /// Request a public marketplace listing (independent instructors only)
        #[arg(long)]
        public: bool,
    },

    /// Show a course
    Show {
        /// Course ID
        course_id: Uuid,
    },

    /// Publish a course
    Publish {
        /// Course ID
        course_id: Uuid,
    },

    /// Delete a course (owner only)
    Delete {
        /// Course ID
        course_id: Uuid,
    },

    /// Add a staff member (owner only)
    AddStaff {
        /// Course ID
        course_id: Uuid,

        /// User to add
        #[arg(short, long)]
        user_id: Uuid,

        /// Staff role: co_instructor or ta
        #[arg(short, long, default_value = "ta")]
        role: String,
    },

    /// Remove a staff member (owner only)
    RemoveStaff {
        /// Course ID
        course_id: Uuid,

        /// User to remove
        #[arg(short, long)]
        user_id: Uuid,
    },

    /// Show the staff roster
    Staff {
        /// Course ID
        course_id: Uuid,
    },
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CreateCourseRequest {
    title: String,
    description: Option<String>,
    is_public: Option<bool>,
}

#[derive(Serialize)]
struct AddStaffRequest {
    user_id: Uuid,
    role: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct CourseInfo {
    id: Uuid,
    organization_id: Uuid,
    instructor_id: Uuid,
    title: String,
    #[serde(default)]
    description: String,
    published: bool,
    is_public: bool,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct CoursePage {
    items: Vec<CourseInfo>,
    meta: PageMeta,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    page: u32,
    total: u64,
    total_pages: u32,
}

#[derive(Debug, Serialize, Tabled)]
struct CourseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Published")]
    published: bool,
    #[tabled(rename = "Public")]
    is_public: bool,
    #[tabled(rename = "Created")]
    created_at: String,
}

#[derive(Debug, Deserialize, Serialize, Tabled)]
struct StaffRow {
    #[tabled(rename = "User")]
    user_id: Uuid,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Added")]
    added_at: String,
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(cmd: CourseCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        CourseCommands::List { page, per_page } => {
            let path = format!("/api/v1/courses?page={}&per_page={}", page, per_page);
            let resp: CoursePage = client.get(&path).await?;

            match format {
                OutputFormat::Table => {
                    let rows: Vec<CourseRow> = resp
                        .items
                        .iter()
                        .map(|c| CourseRow {
                            id: c.id.to_string(),
                            title: c.title.clone(),
                            published: c.published,
                            is_public: c.is_public,
                            created_at: c.created_at.clone(),
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

        CourseCommands::Create {
            title,
            description,
            public,
        } => {
            let body = CreateCourseRequest {
                title,
                description,
                is_public: Some(public),
            };
            let course: CourseInfo = client.post("/api/v1/courses", &body).await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Course created");
                    output::print_detail("ID", &course.id.to_string());
                    output::print_detail("Title", &course.title);
                    if public && !course.is_public {
                        output::print_info(
                            "Marketplace listing was declined: only independent instructors publish publicly",
                        );
                    }
                }
                _ => output::print_item(&course, format),
            }
        }

        CourseCommands::Show { course_id } => {
            let course: CourseInfo = client.get(&format!("/api/v1/courses/{}", course_id)).await?;

            match format {
                OutputFormat::Table => {
                    output::print_header(&course.title);
                    output::print_detail("ID", &course.id.to_string());
                    output::print_detail("Organization", &course.organization_id.to_string());
                    output::print_detail("Instructor", &course.instructor_id.to_string());
                    output::print_detail("Published", &course.published.to_string());
                    output::print_detail("Public", &course.is_public.to_string());
                    if !course.description.is_empty() {
                        output::print_detail("Description", &course.description);
                    }
                }
                _ => output::print_item(&course, format),
            }
        }

        CourseCommands::Publish { course_id } => {
            let course: CourseInfo = client
                .post(&format!("/api/v1/courses/{}/publish", course_id), &())
                .await?;
            output::print_success(&format!("Course published: {}", course.title));
        }

        CourseCommands::Delete { course_id } => {
            let _: serde_json::Value = client.delete(&format!("/api/v1/courses/{}", course_id)).await?;
            output::print_success("Course deleted");
        }

        CourseCommands::AddStaff {
            course_id,
            user_id,
            role,
        } => {
            let body = AddStaffRequest { user_id, role };
            let staff: StaffRow = client
                .post(&format!("/api/v1/courses/{}/staff", course_id), &body)
                .await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Staff member added");
                    output::print_detail("User", &staff.user_id.to_string());
                    output::print_detail("Role", &staff.role);
                }
                _ => output::print_item(&staff, format),
            }
        }

        CourseCommands::RemoveStaff { course_id, user_id } => {
            let _: serde_json::Value = client
                .delete(&format!("/api/v1/courses/{}/staff/{}", course_id, user_id))
                .await?;
            output::print_success("Staff member removed");
        }

        CourseCommands::Staff { course_id } => {
            let staff: Vec<StaffRow> = client
                .get(&format!("/api/v1/courses/{}/staff", course_id))
                .await?;
            output::print_list(&staff, format);
        }
    }

    Ok(())
}
