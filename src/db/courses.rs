//! Course operations
//!
//! A course belongs to exactly one cycle; deleting the cycle cascades here.

use crate::auth::Principal;
use crate::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub cycle_id: Uuid,
}

fn course_from_row(row: &SqliteRow) -> Result<Course> {
    let guid: String = row.get("guid");
    let cycle_id: String = row.get("cycle_id");
    Ok(Course {
        id: Uuid::parse_str(&guid)?,
        name: row.get("name"),
        cycle_id: Uuid::parse_str(&cycle_id)?,
    })
}

/// Add a course to a cycle
pub async fn add_course(
    pool: &SqlitePool,
    principal: &Principal,
    name: &str,
    cycle_id: Uuid,
) -> Result<Course> {
    principal.require_admin()?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("course name cannot be empty".to_string()));
    }

    let cycle_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cycles WHERE guid = ?)")
        .bind(cycle_id.to_string())
        .fetch_one(pool)
        .await?;
    if !cycle_exists {
        return Err(Error::NotFound(format!("cycle {}", cycle_id)));
    }

    let course = Course {
        id: Uuid::new_v4(),
        name: name.to_string(),
        cycle_id,
    };
    sqlx::query("INSERT INTO courses (guid, name, cycle_id) VALUES (?, ?, ?)")
        .bind(course.id.to_string())
        .bind(&course.name)
        .bind(cycle_id.to_string())
        .execute(pool)
        .await?;

    info!("Added course '{}' to cycle {}", course.name, cycle_id);
    Ok(course)
}

/// Courses of one cycle, name-ordered
pub async fn list_courses(pool: &SqlitePool, cycle_id: Uuid) -> Result<Vec<Course>> {
    let rows = sqlx::query(
        "SELECT guid, name, cycle_id FROM courses WHERE cycle_id = ? ORDER BY name ASC",
    )
    .bind(cycle_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(course_from_row).collect()
}

/// Courses of the active cycle, name-ordered; empty when no cycle is active
pub async fn courses_in_active_cycle(pool: &SqlitePool) -> Result<Vec<Course>> {
    let rows = sqlx::query(
        r#"
        SELECT c.guid, c.name, c.cycle_id
        FROM courses c
        JOIN cycles ci ON c.cycle_id = ci.guid
        WHERE ci.active = 1
        ORDER BY c.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(course_from_row).collect()
}

/// Rename a course
pub async fn rename_course(pool: &SqlitePool, id: Uuid, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("course name cannot be empty".to_string()));
    }

    let updated = sqlx::query("UPDATE courses SET name = ? WHERE guid = ?")
        .bind(name)
        .bind(id.to_string())
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound(format!("course {}", id)));
    }

    Ok(())
}

/// Delete a course, cascading to its students and their attendance records
pub async fn delete_course(pool: &SqlitePool, principal: &Principal, id: Uuid) -> Result<()> {
    principal.require_admin()?;

    let deleted = sqlx::query("DELETE FROM courses WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("course {}", id)));
    }

    info!("Deleted course {} (cascaded to students)", id);
    Ok(())
}
