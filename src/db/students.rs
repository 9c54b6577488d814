//! Student enrollment operations
//!
//! A student belongs to exactly one course. Names are unique within a course;
//! the optional expected-days column carries the personalized trajectory.

use crate::status::ExpectedDays;
use crate::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub external_id: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub notes: Option<String>,
    /// Expected attendance weekdays; None = expected every day
    pub expected_days: Option<ExpectedDays>,
}

/// Fields for enrolling a new student
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub external_id: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub notes: Option<String>,
    pub expected_days: Option<ExpectedDays>,
}

/// Search hit: a student joined with course and cycle names
#[derive(Debug, Clone)]
pub struct StudentMatch {
    pub student: Student,
    pub course_name: String,
    pub cycle_name: String,
}

fn student_from_row(row: &SqliteRow) -> Result<Student> {
    let guid: String = row.get("guid");
    let course_id: String = row.get("course_id");
    let expected_days: Option<String> = row.get("expected_days");
    Ok(Student {
        id: Uuid::parse_str(&guid)?,
        course_id: Uuid::parse_str(&course_id)?,
        name: row.get("name"),
        external_id: row.get("external_id"),
        guardian_name: row.get("guardian_name"),
        guardian_phone: row.get("guardian_phone"),
        notes: row.get("notes"),
        expected_days: expected_days
            .as_deref()
            .map(ExpectedDays::from_csv)
            .transpose()?,
    })
}

const STUDENT_COLUMNS: &str =
    "guid, course_id, name, external_id, guardian_name, guardian_phone, notes, expected_days";

/// Enroll a student in a course
pub async fn add_student(pool: &SqlitePool, course_id: Uuid, new: NewStudent) -> Result<Student> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation("student name cannot be empty".to_string()));
    }

    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM students WHERE course_id = ? AND name = ?)",
    )
    .bind(course_id.to_string())
    .bind(&name)
    .fetch_one(pool)
    .await?;
    if duplicate {
        return Err(Error::Conflict(format!(
            "student '{}' already enrolled in this course",
            name
        )));
    }

    let student = Student {
        id: Uuid::new_v4(),
        course_id,
        name,
        external_id: new.external_id,
        guardian_name: new.guardian_name,
        guardian_phone: new.guardian_phone,
        notes: new.notes,
        expected_days: new.expected_days,
    };
    sqlx::query(
        r#"
        INSERT INTO students
            (guid, course_id, name, external_id, guardian_name, guardian_phone, notes, expected_days)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(student.id.to_string())
    .bind(course_id.to_string())
    .bind(&student.name)
    .bind(&student.external_id)
    .bind(&student.guardian_name)
    .bind(&student.guardian_phone)
    .bind(&student.notes)
    .bind(student.expected_days.map(|d| d.to_csv()))
    .execute(pool)
    .await?;

    info!("Enrolled student '{}' in course {}", student.name, course_id);
    Ok(student)
}

/// Load one student
pub async fn get_student(pool: &SqlitePool, id: Uuid) -> Result<Student> {
    let sql = format!("SELECT {} FROM students WHERE guid = ?", STUDENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => student_from_row(&row),
        None => Err(Error::NotFound(format!("student {}", id))),
    }
}

/// Update identity fields and policy of an existing student.
///
/// The owning course is not changed here; re-enrollment is an administrative
/// delete-and-add.
pub async fn update_student(pool: &SqlitePool, student: &Student) -> Result<()> {
    let name = student.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("student name cannot be empty".to_string()));
    }

    let duplicate: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM students WHERE course_id = ? AND name = ? AND guid <> ?)",
    )
    .bind(student.course_id.to_string())
    .bind(name)
    .bind(student.id.to_string())
    .fetch_one(pool)
    .await?;
    if duplicate {
        return Err(Error::Conflict(format!(
            "student '{}' already enrolled in this course",
            name
        )));
    }

    let updated = sqlx::query(
        r#"
        UPDATE students
        SET name = ?, external_id = ?, guardian_name = ?, guardian_phone = ?,
            notes = ?, expected_days = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(name)
    .bind(&student.external_id)
    .bind(&student.guardian_name)
    .bind(&student.guardian_phone)
    .bind(&student.notes)
    .bind(student.expected_days.map(|d| d.to_csv()))
    .bind(student.id.to_string())
    .execute(pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound(format!("student {}", student.id)));
    }

    Ok(())
}

/// Replace (or clear) the expected-days policy of one student
pub async fn set_expected_days(
    pool: &SqlitePool,
    id: Uuid,
    expected_days: Option<ExpectedDays>,
) -> Result<()> {
    let updated = sqlx::query(
        "UPDATE students SET expected_days = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(expected_days.map(|d| d.to_csv()))
    .bind(id.to_string())
    .execute(pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound(format!("student {}", id)));
    }

    Ok(())
}

/// Remove a student, cascading to their attendance records
pub async fn delete_student(pool: &SqlitePool, id: Uuid) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM students WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound(format!("student {}", id)));
    }

    info!("Deleted student {} (cascaded to attendance)", id);
    Ok(())
}

/// Students of one course, name-ordered
pub async fn list_students(pool: &SqlitePool, course_id: Uuid) -> Result<Vec<Student>> {
    let sql = format!(
        "SELECT {} FROM students WHERE course_id = ? ORDER BY name ASC",
        STUDENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(course_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(student_from_row).collect()
}

/// Case-insensitive substring search on name or external id, restricted to
/// students of the active cycle
pub async fn search_students(pool: &SqlitePool, term: &str) -> Result<Vec<StudentMatch>> {
    let pattern = format!("%{}%", term.trim());
    let rows = sqlx::query(
        r#"
        SELECT s.guid, s.course_id, s.name, s.external_id, s.guardian_name,
               s.guardian_phone, s.notes, s.expected_days,
               c.name AS course_name, ci.name AS cycle_name
        FROM students s
        JOIN courses c ON s.course_id = c.guid
        JOIN cycles ci ON c.cycle_id = ci.guid
        WHERE ci.active = 1
          AND (s.name LIKE ? OR s.external_id LIKE ?)
        ORDER BY s.name ASC
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(StudentMatch {
                student: student_from_row(row)?,
                course_name: row.get("course_name"),
                cycle_name: row.get("cycle_name"),
            })
        })
        .collect()
}
