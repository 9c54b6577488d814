//! Compliance aggregation and report assembly
//!
//! Tallies per-status counts over a student's records, derives the weighted
//! absence magnitude, and joins the numbers with student identity for the
//! per-course report consumed by the external exporter.

use crate::db::{attendance, students};
use crate::status::AttendanceStatus;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

/// Raw tally of one student's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub justified: u32,
    pub suspended: u32,
    /// Tracked but excluded from totals and the weighted absence
    pub not_applicable: u32,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut counts = StatusCounts::default();
        for status in statuses {
            match status {
                AttendanceStatus::Present => counts.present += 1,
                AttendanceStatus::Late => counts.late += 1,
                AttendanceStatus::Absent => counts.absent += 1,
                AttendanceStatus::Justified => counts.justified += 1,
                AttendanceStatus::Suspended => counts.suspended += 1,
                AttendanceStatus::NotApplicable => counts.not_applicable += 1,
            }
        }
        counts
    }
}

/// Compliance statistics for one student over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentComplianceReport {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
    pub justified: u32,
    pub suspended: u32,
    /// absent + suspended + 0.25 x late
    pub weighted_absence: f64,
    /// weighted_absence / total x 100, one decimal, half-up; 0 when no records
    pub percentage: f64,
    pub total: u32,
}

/// Round half-up to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl From<StatusCounts> for StudentComplianceReport {
    fn from(c: StatusCounts) -> Self {
        let weighted_absence = f64::from(c.absent) + f64::from(c.suspended) + 0.25 * f64::from(c.late);
        let total = c.present + c.late + c.absent + c.justified + c.suspended;
        let percentage = if total > 0 {
            round1(weighted_absence / f64::from(total) * 100.0)
        } else {
            0.0
        };
        StudentComplianceReport {
            present: c.present,
            late: c.late,
            absent: c.absent,
            justified: c.justified,
            suspended: c.suspended,
            weighted_absence,
            percentage,
            total,
        }
    }
}

/// One student's compliance over [from, to]
pub async fn student_compliance(
    pool: &SqlitePool,
    student_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<StudentComplianceReport> {
    let history = attendance::get_history(pool, student_id, from, to).await?;
    Ok(StatusCounts::tally(history.into_iter().map(|(_, status)| status)).into())
}

/// Report row: identity fields joined with the student's statistics
#[derive(Debug, Clone, Serialize)]
pub struct CourseComplianceRow {
    pub student_id: Uuid,
    pub name: String,
    pub external_id: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub report: StudentComplianceReport,
}

/// Per-course compliance over a period; the artifact handed to the exporter
#[derive(Debug, Clone, Serialize)]
pub struct CourseComplianceReport {
    pub course_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// One row per enrolled student, name-ordered
    pub rows: Vec<CourseComplianceRow>,
}

/// Build the per-course report: every student of the course, name-ordered,
/// with statistics restricted to [from, to]. Students with no records in the
/// range still get a row (all zeroes).
pub async fn course_compliance(
    pool: &SqlitePool,
    course_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<CourseComplianceReport> {
    let roster = students::list_students(pool, course_id).await?;

    // One query for the whole course, grouped in memory per student
    let rows = sqlx::query(
        r#"
        SELECT student_id, status
        FROM attendance
        WHERE date >= ? AND date <= ?
          AND student_id IN (SELECT guid FROM students WHERE course_id = ?)
        "#,
    )
    .bind(from.to_string())
    .bind(to.to_string())
    .bind(course_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut by_student: HashMap<Uuid, Vec<AttendanceStatus>> = HashMap::new();
    for row in &rows {
        let student_id: String = row.get("student_id");
        let status: String = row.get("status");
        by_student
            .entry(Uuid::parse_str(&student_id)?)
            .or_default()
            .push(AttendanceStatus::from_code(&status)?);
    }

    let rows = roster
        .into_iter()
        .map(|student| {
            let statuses = by_student.remove(&student.id).unwrap_or_default();
            CourseComplianceRow {
                student_id: student.id,
                name: student.name,
                external_id: student.external_id,
                guardian_name: student.guardian_name,
                guardian_phone: student.guardian_phone,
                notes: student.notes,
                report: StatusCounts::tally(statuses).into(),
            }
        })
        .collect();

    Ok(CourseComplianceReport {
        course_id,
        from,
        to,
        rows,
    })
}
