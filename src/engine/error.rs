use std::fmt;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use ulid::Ulid;

use crate::model::{BookingStatus, Window};

/// Machine-readable category for a rejected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    Required,
    InvalidFormat,
    OutOfRange,
    TooLong,
    FutureDate,
    TooYoung,
    PastDate,
    InvalidWindow,
    Negative,
    EmptyDuration,
    Duplicate,
}

/// One field-scoped validation failure, shaped for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub code: IssueCode,
    pub message: String,
}

impl FieldIssue {
    pub(crate) fn new(field: &'static str, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An existing booking that occupies the requested time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictInfo {
    pub appointment: Ulid,
    pub client_name: String,
    pub date: NaiveDate,
    pub window: Window,
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} {}", self.client_name, self.date, self.window)
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// Accumulated field-level failures; every failing validator reports.
    Invalid(Vec<FieldIssue>),
    /// The requested window overlaps one or more active bookings.
    Conflict(Vec<ConflictInfo>),
    /// Another appointment already starts at exactly (date, start).
    SlotTaken { date: NaiveDate, start: NaiveTime },
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    NotEditable(BookingStatus),
    NotCancelable(BookingStatus),
    NotFound(Ulid),
    /// The referenced client/service exists but is deactivated.
    InactiveRef { entity: &'static str, id: Ulid },
    /// Deletion refused while future bookings still reference the entity.
    ReferencedByUpcoming { entity: &'static str, count: usize },
    OutsideBusinessHours { weekday: Weekday, open: Window },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Invalid(issues) => {
                write!(f, "validation failed:")?;
                for issue in issues {
                    write!(f, " [{issue}]")?;
                }
                Ok(())
            }
            EngineError::Conflict(hits) => {
                write!(f, "time conflict with existing booking:")?;
                for hit in hits {
                    write!(f, " [{hit}]")?;
                }
                Ok(())
            }
            EngineError::SlotTaken { date, start } => {
                write!(f, "a booking already starts at {date} {}", start.format("%H:%M"))
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "illegal status transition: {from} -> {to}")
            }
            EngineError::NotEditable(status) => {
                write!(f, "booking is {status} and can no longer be edited")
            }
            EngineError::NotCancelable(status) => {
                write!(f, "booking is {status} and can no longer be canceled")
            }
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::InactiveRef { entity, id } => {
                write!(f, "{entity} {id} is deactivated")
            }
            EngineError::ReferencedByUpcoming { entity, count } => {
                write!(f, "{entity} still has {count} upcoming booking(s)")
            }
            EngineError::OutsideBusinessHours { weekday, open } => {
                write!(f, "outside business hours for {weekday}: open {open}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
