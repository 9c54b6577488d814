//! Academic cycle registry
//!
//! Owns the single-active-cycle invariant: at most one cycle is active at any
//! time, enforced by running every deactivate-all-then-activate-one swap
//! inside a single transaction.

use crate::auth::Principal;
use crate::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// Academic year/term container owning courses
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

fn cycle_from_row(row: &SqliteRow) -> Result<Cycle> {
    let guid: String = row.get("guid");
    Ok(Cycle {
        id: Uuid::parse_str(&guid)?,
        name: row.get("name"),
        active: row.get::<i64, _>("active") != 0,
    })
}

/// Create a new cycle and make it the sole active one.
///
/// Creation always activates: every other cycle is deactivated in the same
/// transaction, so no intermediate state with zero or two active cycles is
/// ever observable.
pub async fn create_cycle(pool: &SqlitePool, principal: &Principal, name: &str) -> Result<Cycle> {
    principal.require_admin()?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("cycle name cannot be empty".to_string()));
    }

    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cycles WHERE name = ?)")
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
    if exists {
        return Err(Error::Conflict(format!("cycle '{}' already exists", name)));
    }

    sqlx::query("UPDATE cycles SET active = 0 WHERE active = 1")
        .execute(&mut *tx)
        .await?;

    let cycle = Cycle {
        id: Uuid::new_v4(),
        name: name.to_string(),
        active: true,
    };
    sqlx::query("INSERT INTO cycles (guid, name, active) VALUES (?, ?, 1)")
        .bind(cycle.id.to_string())
        .bind(&cycle.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Created cycle '{}' (now active)", cycle.name);

    Ok(cycle)
}

/// Atomically make the given cycle the only active one.
///
/// On any failure the transaction rolls back, leaving the previously active
/// cycle untouched.
pub async fn activate_cycle(pool: &SqlitePool, principal: &Principal, id: Uuid) -> Result<()> {
    principal.require_admin()?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE cycles SET active = 0 WHERE active = 1")
        .execute(&mut *tx)
        .await?;

    let updated = sqlx::query("UPDATE cycles SET active = 1 WHERE guid = ?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound(format!("cycle {}", id)));
    }

    tx.commit().await?;
    info!("Activated cycle {}", id);

    Ok(())
}

/// Currently active cycle, if any. "No active cycle" is a valid state that
/// callers surface rather than repair.
pub async fn get_active_cycle(pool: &SqlitePool) -> Result<Option<Cycle>> {
    let row = sqlx::query("SELECT guid, name, active FROM cycles WHERE active = 1")
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(cycle_from_row).transpose()
}

/// All cycles, newest name first
pub async fn list_cycles(pool: &SqlitePool) -> Result<Vec<Cycle>> {
    let rows = sqlx::query("SELECT guid, name, active FROM cycles ORDER BY name DESC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(cycle_from_row).collect()
}

/// Delete a cycle, cascading to its courses, students, and attendance.
///
/// Deleting the active cycle leaves the system with no active cycle; another
/// one is never auto-promoted.
pub async fn delete_cycle(pool: &SqlitePool, principal: &Principal, id: Uuid) -> Result<()> {
    principal.require_admin()?;

    let deleted = sqlx::query("DELETE FROM cycles WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("cycle {}", id)));
    }

    info!("Deleted cycle {} (cascaded to courses and students)", id);
    Ok(())
}
