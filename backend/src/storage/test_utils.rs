//! In-memory storage doubles for service tests
//!
//! Both stores can be told to fail so the error paths of the submission flow
//! can be exercised without a real database or file system.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::models::Student;
use crate::storage::traits::{BlobStorage, StudentStorage};

#[derive(Default)]
pub struct InMemoryStudentStore {
    students: Mutex<Vec<Student>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students: Mutex::new(students),
            ..Default::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<Student> {
        self.students.lock().unwrap().clone()
    }
}

#[async_trait]
impl StudentStorage for InMemoryStudentStore {
    async fn store_student(&self, student: &Student) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("NOT NULL constraint failed: students.mother_mobile"));
        }
        self.students.lock().unwrap().push(student.clone());
        Ok(())
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == student_id)
            .cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        let mut students = self.students.lock().unwrap().clone();
        students.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(students)
    }
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    fail_uploads: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStore {
    async fn upload(&self, name: &str, bytes: &[u8], _content_type: Option<&str>) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage bucket unavailable"));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), bytes.to_vec()));
        Ok(format!("https://files.test/{}", name))
    }
}
