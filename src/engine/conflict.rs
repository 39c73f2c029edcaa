use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::Window;

use super::error::ConflictInfo;
use super::store::OwnerBook;

/// Scan the owner's same-day bookings in an active status for half-open
/// overlap with `window`, excluding `exclude` (the appointment being edited,
/// if any). Every collision is returned, not just the first, so the caller
/// can report them all.
///
/// Owner- and date-scoped by design: bookings never span days and calendars
/// are never shared across owners, so nothing else can collide.
pub(crate) fn find_conflicts(
    book: &OwnerBook,
    date: NaiveDate,
    window: &Window,
    exclude: Option<Ulid>,
) -> Vec<ConflictInfo> {
    let mut hits = Vec::new();
    for appt in book.active_on(date) {
        if exclude == Some(appt.id) {
            continue;
        }
        if appt.window.overlaps(window) {
            let client_name = book
                .client(&appt.client)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            hits.push(ConflictInfo {
                appointment: appt.id,
                client_name,
                date,
                window: appt.window,
            });
        }
    }
    hits
}
