use anyhow::{Context, Result};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

/// DbConnection owns the SQLite pool holding submitted registrations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if missing) the database at `url` and ensure the schema
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database {}", url);
            Sqlite::create_database(url)
                .await
                .with_context(|| format!("Failed to create database {}", url))?;
        }

        let pool = SqlitePool::connect(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// A private in-memory database, unique per call
    pub async fn in_memory() -> Result<Self> {
        let db_id = uuid::Uuid::new_v4().simple().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", db_id);
        Self::new(&db_url).await
    }

    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        Self::in_memory().await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                gender TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                email TEXT NOT NULL,
                mobile TEXT NOT NULL,
                profile_image_url TEXT,
                blood_group TEXT NOT NULL,
                allergies TEXT,
                medications TEXT,
                mother_name TEXT,
                mother_mobile TEXT NOT NULL,
                mother_occupation TEXT NOT NULL,
                father_name TEXT,
                father_mobile TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create students table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_students_created_at
            ON students (created_at DESC);
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create students index")?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
