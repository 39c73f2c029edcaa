//! Derived-field computation: fills the end time and the charged amount from
//! the selected service when absent. Runs once at booking time, before the
//! validators and the conflict scan. Explicitly supplied values always win,
//! so re-running on a complete request changes nothing.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::model::{Service, Window};

use super::error::{FieldIssue, IssueCode};

/// End time = start + service duration when no end was supplied.
/// A derived end that would cross midnight is a field issue on the start
/// time, not a wrap-around.
pub(crate) fn resolve_window(
    start: NaiveTime,
    end: Option<NaiveTime>,
    service: &Service,
) -> Result<Window, FieldIssue> {
    match end {
        // Supplied ends are taken as-is; the window validator rules on them.
        Some(end) => Ok(Window { start, end }),
        None => Window::from_start(start, service.duration).ok_or_else(|| {
            FieldIssue::new(
                "start_time",
                IssueCode::InvalidWindow,
                "start plus service duration crosses midnight",
            )
        }),
    }
}

/// Charged amount = service price when none was supplied.
pub(crate) fn resolve_charge(charged: Option<Decimal>, service: &Service) -> Decimal {
    charged.unwrap_or(service.price)
}
