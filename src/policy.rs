//! Default attendance status resolution
//!
//! A student with no explicit record for a date gets an advisory default:
//! Present, unless a personalized expected-days policy says attendance was
//! not expected on that weekday. The default pre-populates the entry screen
//! and is never persisted until an explicit mark.

use crate::db::students::Student;
use crate::db::{attendance, students};
use crate::status::{AttendanceStatus, ExpectedDays};
use crate::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Default status for a date with no explicit record
pub fn default_status(expected: Option<&ExpectedDays>, date: NaiveDate) -> AttendanceStatus {
    match expected {
        Some(days) if !days.contains(date.weekday()) => AttendanceStatus::NotApplicable,
        _ => AttendanceStatus::Present,
    }
}

/// Saturday or Sunday. Advisory only; weekend marks are never blocked.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every student of a course paired with their status for one date: the
/// stored record where one exists, the policy default otherwise. Name-ordered.
pub async fn prefill_for_date(
    pool: &SqlitePool,
    course_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<(Student, AttendanceStatus)>> {
    let roster = students::list_students(pool, course_id).await?;
    let recorded = attendance::get_for_date(pool, course_id, date).await?;

    Ok(roster
        .into_iter()
        .map(|student| {
            let status = recorded
                .get(&student.id)
                .copied()
                .unwrap_or_else(|| default_status(student.expected_days.as_ref(), date));
            (student, status)
        })
        .collect())
}
