//! Attendance status codes and expected-attendance-day sets

use crate::{Error, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily attendance status for one student.
///
/// Stored in the database as a single-letter code. The enumeration is closed:
/// the aggregator matches exhaustively so an unrecognized code can never be
/// silently miscounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Justified,
    Suspended,
    /// No attendance expected for this student on this date
    NotApplicable,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 6] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::Justified,
        AttendanceStatus::Suspended,
        AttendanceStatus::NotApplicable,
    ];

    /// Single-letter storage code
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "P",
            AttendanceStatus::Late => "T",
            AttendanceStatus::Absent => "A",
            AttendanceStatus::Justified => "J",
            AttendanceStatus::Suspended => "S",
            AttendanceStatus::NotApplicable => "N",
        }
    }

    /// Parse a storage code back into a status
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "P" => Ok(AttendanceStatus::Present),
            "T" => Ok(AttendanceStatus::Late),
            "A" => Ok(AttendanceStatus::Absent),
            "J" => Ok(AttendanceStatus::Justified),
            "S" => Ok(AttendanceStatus::Suspended),
            "N" => Ok(AttendanceStatus::NotApplicable),
            other => Err(Error::Validation(format!(
                "unknown attendance status code: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Set of weekdays on which a student is expected to attend.
///
/// Backs the personalized trajectory policy: students without one are expected
/// every day. Persisted as comma-joined short weekday names ("Mon,Wed,Fri") in
/// a nullable TEXT column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpectedDays(u8);

/// Weekdays in storage order (bit 0 = Monday)
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl ExpectedDays {
    pub fn new<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        let mut set = ExpectedDays::default();
        for day in days {
            set.insert(day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS.iter().copied().filter(|d| self.contains(*d))
    }

    /// Storage form: "Mon,Wed,Fri"
    pub fn to_csv(&self) -> String {
        self.iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the storage form. Accepts full or abbreviated English weekday
    /// names, case-insensitive.
    pub fn from_csv(s: &str) -> Result<Self> {
        let mut set = ExpectedDays::default();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let day = Weekday::from_str(part).map_err(|_| {
                Error::Validation(format!("unknown weekday in expected-days set: {:?}", part))
            })?;
            set.insert(day);
        }
        Ok(set)
    }
}

impl Serialize for ExpectedDays {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_csv())
    }
}

impl<'de> Deserialize<'de> for ExpectedDays {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ExpectedDays::from_csv(&s).map_err(serde::de::Error::custom)
    }
}
