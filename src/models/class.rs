// src/models/class.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'classes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub section: String,
    pub teacher_id: i64,

    /// Code students enter to enroll themselves.
    pub join_code: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Class {
    /// "Algebra 7-B" style label, or just the name when there is no section.
    pub fn display_name(&self) -> String {
        if self.section.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.section)
        }
    }
}

/// Class row plus its enrolled student count, used for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct ClassSummary {
    pub id: i64,
    pub name: String,
    pub section: String,
    pub teacher_id: i64,
    pub teacher_username: String,
    pub join_code: String,
    pub student_count: i64,
}

/// Enrolled student as listed in a class roster.
#[derive(Debug, Serialize, FromRow)]
pub struct ClassStudent {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub joined_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A class with its roster, returned by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct ClassDetail {
    #[serde(flatten)]
    pub class: Class,
    pub display_name: String,
    pub students: Vec<ClassStudent>,
}

impl ClassDetail {
    pub fn new(class: Class, students: Vec<ClassStudent>) -> Self {
        Self {
            display_name: class.display_name(),
            class,
            students,
        }
    }
}

/// DTO for creating a class.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    pub section: Option<String>,
}

/// DTO for renaming a class. Omitted fields keep their stored value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub section: Option<String>,
}

/// DTO for joining a class by code.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinClassRequest {
    #[validate(length(min = 1, max = 32))]
    pub join_code: String,
}
