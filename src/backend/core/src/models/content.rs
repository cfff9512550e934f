//! Course content: modules, lessons, quizzes.
//!
//! Content bodies are opaque text; rendering and file attachments are
//! outside this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A titled section of a course, ordering lessons.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl CourseModule {
    pub fn new(course_id: Uuid, title: impl Into<String>, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            title: title.into(),
            position,
            created_at: Utc::now(),
        }
    }
}

/// A single unit of material inside a module.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub body: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(module_id: Uuid, title: impl Into<String>, body: impl Into<String>, position: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            module_id,
            title: title.into(),
            body: body.into(),
            position,
            created_at: Utc::now(),
        }
    }
}

/// A graded quiz attached to a lesson. Questions are stored as an opaque
/// JSON document; grading policy beyond `pass_score` lives with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub questions: serde_json::Value,
    /// Minimum percentage (0-100) counted as passing.
    pub pass_score: i32,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(lesson_id: Uuid, questions: serde_json::Value, pass_score: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            lesson_id,
            questions,
            pass_score,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_ordering_fields() {
        let module = CourseModule::new(Uuid::new_v4(), "Basics", 0);
        let lesson = Lesson::new(module.id, "Hello", "body", 2);
        assert_eq!(lesson.module_id, module.id);
        assert_eq!(lesson.position, 2);
    }
}
