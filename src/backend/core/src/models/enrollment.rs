//! Enrollment, lesson progress, and completion certificates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A student's membership in one course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
    /// Set once every lesson of the course is completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn new(course_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            enrolled_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Per-lesson completion record under one enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonProgress {
    pub enrollment_id: Uuid,
    pub lesson_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// A completion certificate. The serial is content-addressed so it can be
/// verified without authentication.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub serial: String,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    /// Issue a certificate for a completed enrollment.
    pub fn issue(course_id: Uuid, user_id: Uuid) -> Self {
        let issued_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            course_id,
            user_id,
            serial: Self::serial_for(course_id, user_id, issued_at),
            issued_at,
        }
    }

    /// Derive the serial: first 16 bytes of
    /// SHA-256(course_id || user_id || issued_at), hex-encoded.
    pub fn serial_for(course_id: Uuid, user_id: Uuid, issued_at: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(course_id.as_bytes());
        hasher.update(user_id.as_bytes());
        hasher.update(issued_at.timestamp_micros().to_be_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_is_stable_and_hex() {
        let course = Uuid::new_v4();
        let user = Uuid::new_v4();
        let at = Utc::now();

        let a = Certificate::serial_for(course, user, at);
        let b = Certificate::serial_for(course, user, at);
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_serial_differs_per_user() {
        let course = Uuid::new_v4();
        let at = Utc::now();
        let a = Certificate::serial_for(course, Uuid::new_v4(), at);
        let b = Certificate::serial_for(course, Uuid::new_v4(), at);
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_enrollment_not_completed() {
        let e = Enrollment::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!e.is_completed());
    }
}
