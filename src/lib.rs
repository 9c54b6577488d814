//! # Rollbook
//!
//! Attendance tracking and compliance aggregation for a small school:
//! - Academic cycles with a single-active-cycle invariant
//! - Course and student enrollment (cycle -> course -> student)
//! - One attendance status per (student, date) with upsert semantics
//! - Personalized expected-attendance-day policies ("TPP")
//! - Weighted absence statistics over arbitrary date ranges
//!
//! Screens, credential storage, and spreadsheet export are external
//! collaborators; this crate only exposes the operations they call.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod policy;
pub mod report;
pub mod status;

pub use error::{Error, Result};
pub use status::{AttendanceStatus, ExpectedDays};
