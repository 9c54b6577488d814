//! Attendance ledger
//!
//! One status per (student, date), upsert on conflict, last write wins. No
//! history of prior values is kept. Future dates are rejected uniformly at
//! this boundary, for single marks and bulk saves alike.

use crate::status::AttendanceStatus;
use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Record one status for (student, date), overwriting any previous value
pub async fn mark(
    pool: &SqlitePool,
    student_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<()> {
    mark_as_of(pool, student_id, date, status, Local::now().date_naive()).await
}

/// `mark` with an explicit "today" for the future-date check
pub async fn mark_as_of(
    pool: &SqlitePool,
    student_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
    today: NaiveDate,
) -> Result<()> {
    if date > today {
        return Err(Error::FutureDate(date));
    }

    sqlx::query(
        r#"
        INSERT INTO attendance (student_id, date, status)
        VALUES (?, ?, ?)
        ON CONFLICT(student_id, date) DO UPDATE SET
            status = excluded.status,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(student_id.to_string())
    .bind(date.to_string())
    .bind(status.code())
    .execute(pool)
    .await?;

    Ok(())
}

/// Save one date's statuses for many students in a single transaction.
///
/// All-or-nothing: a future date is rejected before any row is written, and
/// any mid-write failure rolls the whole batch back.
pub async fn mark_many(
    pool: &SqlitePool,
    date: NaiveDate,
    entries: &[(Uuid, AttendanceStatus)],
) -> Result<()> {
    mark_many_as_of(pool, date, entries, Local::now().date_naive()).await
}

/// `mark_many` with an explicit "today" for the future-date check
pub async fn mark_many_as_of(
    pool: &SqlitePool,
    date: NaiveDate,
    entries: &[(Uuid, AttendanceStatus)],
    today: NaiveDate,
) -> Result<()> {
    if date > today {
        return Err(Error::FutureDate(date));
    }

    let mut tx = pool.begin().await?;
    for (student_id, status) in entries {
        sqlx::query(
            r#"
            INSERT INTO attendance (student_id, date, status)
            VALUES (?, ?, ?)
            ON CONFLICT(student_id, date) DO UPDATE SET
                status = excluded.status,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(student_id.to_string())
        .bind(date.to_string())
        .bind(status.code())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Saved {} attendance records for {}", entries.len(), date);
    Ok(())
}

/// Explicit records of one course on one date. Students without a record do
/// not appear; default-filling is the policy layer's job.
pub async fn get_for_date(
    pool: &SqlitePool,
    course_id: Uuid,
    date: NaiveDate,
) -> Result<HashMap<Uuid, AttendanceStatus>> {
    let rows = sqlx::query(
        r#"
        SELECT student_id, status
        FROM attendance
        WHERE date = ?
          AND student_id IN (SELECT guid FROM students WHERE course_id = ?)
        "#,
    )
    .bind(date.to_string())
    .bind(course_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in &rows {
        let student_id: String = row.get("student_id");
        let status: String = row.get("status");
        map.insert(
            Uuid::parse_str(&student_id)?,
            AttendanceStatus::from_code(&status)?,
        );
    }

    Ok(map)
}

/// One student's records in [from, to], both bounds inclusive, date-ascending
pub async fn get_history(
    pool: &SqlitePool,
    student_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, AttendanceStatus)>> {
    let rows = sqlx::query(
        r#"
        SELECT date, status
        FROM attendance
        WHERE student_id = ? AND date >= ? AND date <= ?
        ORDER BY date ASC
        "#,
    )
    .bind(student_id.to_string())
    .bind(from.to_string())
    .bind(to.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let date: String = row.get("date");
            let status: String = row.get("status");
            Ok((date.parse::<NaiveDate>()?, AttendanceStatus::from_code(&status)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, Role};
    use crate::db::students::{add_student, NewStudent};
    use crate::db::test_support::test_pool;

    fn admin() -> Principal {
        Principal::new("admin", Role::Admin)
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn course_fixture(pool: &SqlitePool) -> Uuid {
        let cycle = crate::db::cycles::create_cycle(pool, &admin(), "2025")
            .await
            .unwrap();
        crate::db::courses::add_course(pool, &admin(), "1A", cycle.id)
            .await
            .unwrap()
            .id
    }

    async fn student_fixture(pool: &SqlitePool, course_id: Uuid, name: &str) -> Uuid {
        add_student(
            pool,
            course_id,
            NewStudent {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;
        let date = d("2025-03-10");

        let today = d("2025-03-15");
        mark_as_of(&pool, sid, date, AttendanceStatus::Absent, today)
            .await
            .unwrap();
        mark_as_of(&pool, sid, date, AttendanceStatus::Absent, today)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;
        let date = d("2025-03-10");
        let today = d("2025-03-15");

        mark_as_of(&pool, sid, date, AttendanceStatus::Absent, today)
            .await
            .unwrap();
        mark_as_of(&pool, sid, date, AttendanceStatus::Present, today)
            .await
            .unwrap();

        let statuses = get_for_date(&pool, course_id, date).await.unwrap();
        assert_eq!(statuses.get(&sid), Some(&AttendanceStatus::Present));
    }

    #[tokio::test]
    async fn test_future_date_rejected() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;

        let err = mark_as_of(
            &pool,
            sid,
            d("2025-03-16"),
            AttendanceStatus::Present,
            d("2025-03-15"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::FutureDate(_)));

        // Today itself is fine
        mark_as_of(
            &pool,
            sid,
            d("2025-03-15"),
            AttendanceStatus::Present,
            d("2025-03-15"),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_bulk_save_rejects_future_before_any_write() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;

        let entries = vec![(sid, AttendanceStatus::Present)];
        let err = mark_many_as_of(&pool, d("2025-03-16"), &entries, d("2025-03-15"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FutureDate(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_get_for_date_five_students() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let date = d("2025-03-10");
        let today = d("2025-03-15");

        let mut entries = Vec::new();
        for i in 0..5 {
            let sid = student_fixture(&pool, course_id, &format!("Student {}", i)).await;
            entries.push((sid, AttendanceStatus::Present));
        }
        mark_many_as_of(&pool, date, &entries, today).await.unwrap();

        let statuses = get_for_date(&pool, course_id, date).await.unwrap();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.values().all(|s| *s == AttendanceStatus::Present));
    }

    #[tokio::test]
    async fn test_get_for_date_skips_other_courses_and_unmarked() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let cycle = crate::db::cycles::get_active_cycle(&pool).await.unwrap().unwrap();
        let other_course = crate::db::courses::add_course(&pool, &admin(), "2B", cycle.id)
            .await
            .unwrap()
            .id;

        let marked = student_fixture(&pool, course_id, "Marked").await;
        let _unmarked = student_fixture(&pool, course_id, "Unmarked").await;
        let other = student_fixture(&pool, other_course, "Other").await;

        let date = d("2025-03-10");
        let today = d("2025-03-15");
        mark_as_of(&pool, marked, date, AttendanceStatus::Late, today)
            .await
            .unwrap();
        mark_as_of(&pool, other, date, AttendanceStatus::Late, today)
            .await
            .unwrap();

        let statuses = get_for_date(&pool, course_id, date).await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses.get(&marked), Some(&AttendanceStatus::Late));
    }

    #[tokio::test]
    async fn test_history_ascending_and_range_inclusive() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;
        let today = d("2025-03-31");

        for (date, status) in [
            ("2025-03-12", AttendanceStatus::Absent),
            ("2025-03-10", AttendanceStatus::Present),
            ("2025-03-11", AttendanceStatus::Late),
            ("2025-03-01", AttendanceStatus::Present), // outside range
            ("2025-03-20", AttendanceStatus::Present), // outside range
        ] {
            mark_as_of(&pool, sid, d(date), status, today).await.unwrap();
        }

        let history = get_history(&pool, sid, d("2025-03-10"), d("2025-03-12"))
            .await
            .unwrap();
        assert_eq!(
            history,
            vec![
                (d("2025-03-10"), AttendanceStatus::Present),
                (d("2025-03-11"), AttendanceStatus::Late),
                (d("2025-03-12"), AttendanceStatus::Absent),
            ]
        );
    }

    #[tokio::test]
    async fn test_student_delete_cascades_to_records() {
        let pool = test_pool().await;
        let course_id = course_fixture(&pool).await;
        let sid = student_fixture(&pool, course_id, "Acosta, Bruno").await;

        mark_as_of(
            &pool,
            sid,
            d("2025-03-10"),
            AttendanceStatus::Present,
            d("2025-03-15"),
        )
        .await
        .unwrap();
        crate::db::students::delete_student(&pool, sid).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
