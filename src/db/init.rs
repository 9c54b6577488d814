//! Database initialization
//!
//! Creates the database file and schema on first run; reopening an existing
//! database is a no-op for every statement here.

use crate::Result;
use chrono::Datelike;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Cascading deletes depend on foreign keys being enforced
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one writer holds the lock
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    seed_default_cycle(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent, safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_cycles_table(pool).await?;
    create_courses_table(pool).await?;
    create_students_table(pool).await?;
    create_attendance_table(pool).await?;
    Ok(())
}

/// Create the academic cycles table
pub async fn create_cycles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cycles (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            active INTEGER NOT NULL DEFAULT 0 CHECK (active IN (0, 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the courses table
pub async fn create_courses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cycle_id TEXT NOT NULL REFERENCES cycles(guid) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_cycle ON courses(cycle_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the students table
///
/// `expected_days` holds the optional personalized trajectory as comma-joined
/// weekday names; NULL means attendance is expected every day.
pub async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            guid TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES courses(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            external_id TEXT,
            guardian_name TEXT,
            guardian_phone TEXT,
            notes TEXT,
            expected_days TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (course_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_course ON students(course_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the attendance ledger table
pub async fn create_attendance_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            student_id TEXT NOT NULL REFERENCES students(guid) ON DELETE CASCADE,
            date TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('P', 'T', 'A', 'J', 'S', 'N')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (student_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Seed a cycle named after the current year on a fresh database, so the
/// "no active cycle" state only occurs after explicit deletion.
async fn seed_default_cycle(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cycles")
        .fetch_one(pool)
        .await?;

    if count == 0 {
        let name = chrono::Local::now().year().to_string();
        sqlx::query("INSERT INTO cycles (guid, name, active) VALUES (?, ?, 1)")
            .bind(Uuid::new_v4().to_string())
            .bind(&name)
            .execute(pool)
            .await?;
        info!("Seeded initial cycle '{}'", name);
    }

    Ok(())
}
