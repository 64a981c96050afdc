//! # Storage Traits
//!
//! The two external collaborators the registration flow depends on: a record
//! store for submitted students and a blob store for profile images. The
//! domain layer only sees these traits, so either side can be swapped (SQLite,
//! a hosted database, object storage) without touching business logic.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Student;

/// Persistence for submitted registrations
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Insert a new student record
    async fn store_student(&self, student: &Student) -> Result<()>;

    /// Retrieve a single student by ID
    async fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    /// List every student, newest first by creation time
    async fn list_students(&self) -> Result<Vec<Student>>;
}

/// Storage for uploaded binary files
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` under `name` and return a publicly resolvable URL
    async fn upload(&self, name: &str, bytes: &[u8], content_type: Option<&str>) -> Result<String>;
}
