use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::Student;
use crate::storage::connection::DbConnection;
use crate::storage::traits::StudentStorage;

const STUDENT_COLUMNS: &str = "id, first_name, last_name, gender, date_of_birth, email, mobile, \
     profile_image_url, blood_group, allergies, medications, mother_name, mother_mobile, \
     mother_occupation, father_name, father_mobile, created_at";

/// Repository for submitted student registrations
#[derive(Clone)]
pub struct StudentRepository {
    db: DbConnection,
}

impl StudentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_student(row: &SqliteRow) -> Result<Student> {
        let id: String = row.get("id");
        let gender: String = row.get("gender");
        let blood_group: String = row.get("blood_group");
        let date_of_birth: String = row.get("date_of_birth");
        let created_at: String = row.get("created_at");

        Ok(Student {
            gender: gender
                .parse()
                .with_context(|| format!("Student {} has invalid gender", id))?,
            blood_group: blood_group
                .parse()
                .with_context(|| format!("Student {} has invalid blood group", id))?,
            date_of_birth: NaiveDate::parse_from_str(&date_of_birth, "%Y-%m-%d")
                .with_context(|| format!("Student {} has invalid date of birth", id))?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .with_context(|| format!("Student {} has invalid created_at", id))?
                .with_timezone(&Utc),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            email: row.get("email"),
            mobile: row.get("mobile"),
            profile_image_url: row.get("profile_image_url"),
            allergies: row.get("allergies"),
            medications: row.get("medications"),
            mother_name: row.get("mother_name"),
            mother_mobile: row.get("mother_mobile"),
            mother_occupation: row.get("mother_occupation"),
            father_name: row.get("father_name"),
            father_mobile: row.get("father_mobile"),
            id,
        })
    }
}

#[async_trait]
impl StudentStorage for StudentRepository {
    async fn store_student(&self, student: &Student) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO students (
                id, first_name, last_name, gender, date_of_birth, email, mobile,
                profile_image_url, blood_group, allergies, medications, mother_name,
                mother_mobile, mother_occupation, father_name, father_mobile, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.gender.as_str())
        .bind(student.date_of_birth.format("%Y-%m-%d").to_string())
        .bind(&student.email)
        .bind(&student.mobile)
        .bind(&student.profile_image_url)
        .bind(student.blood_group.as_str())
        .bind(&student.allergies)
        .bind(&student.medications)
        .bind(&student.mother_name)
        .bind(&student.mother_mobile)
        .bind(&student.mother_occupation)
        .bind(&student.father_name)
        .bind(&student.father_mobile)
        .bind(student.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM students WHERE id = ?",
            STUDENT_COLUMNS
        ))
        .bind(student_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_student).transpose()
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM students ORDER BY created_at DESC, ROWID DESC",
            STUDENT_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::row_to_student).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::list_query::tests::student;
    use chrono::{Duration, TimeZone};
    use shared::BloodGroup;

    async fn setup_test() -> StudentRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        StudentRepository::new(db)
    }

    #[tokio::test]
    async fn test_store_and_get_student() {
        let repo = setup_test().await;
        let mut anna = student("Anna", "Lee", "anna@example.com", 21, BloodGroup::ANegative);
        anna.profile_image_url = Some("http://127.0.0.1:3000/uploads/1-abc.png".to_string());
        anna.allergies = Some("Peanuts".to_string());
        anna.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::microseconds(1234);

        repo.store_student(&anna).await.unwrap();
        let loaded = repo.get_student(&anna.id).await.unwrap();

        assert_eq!(loaded, Some(anna));
    }

    #[tokio::test]
    async fn test_get_missing_student() {
        let repo = setup_test().await;
        assert_eq!(repo.get_student("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = setup_test().await;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

        for (i, name) in ["Old", "Newest", "Middle"].iter().enumerate() {
            let mut s = student(name, "Test", "t@example.com", 20, BloodGroup::OPositive);
            s.created_at = base
                + match i {
                    0 => Duration::hours(0),
                    1 => Duration::hours(2),
                    _ => Duration::hours(1),
                };
            repo.store_student(&s).await.unwrap();
        }

        let names: Vec<_> = repo
            .list_students()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.first_name)
            .collect();
        assert_eq!(names, vec!["Newest", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let repo = setup_test().await;
        let s = student("Anna", "Lee", "anna@example.com", 21, BloodGroup::APositive);

        repo.store_student(&s).await.unwrap();
        let err = repo.store_student(&s).await.unwrap_err();

        assert!(err.to_string().contains("UNIQUE"));
    }
}
