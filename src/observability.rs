// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: appointments successfully booked.
pub const BOOKINGS_TOTAL: &str = "agendo_bookings_total";

/// Counter: booking attempts rejected by the conflict scan.
pub const BOOKING_CONFLICTS_TOTAL: &str = "agendo_booking_conflicts_total";

/// Counter: booking attempts rejected by the (date, start) uniqueness check.
pub const SLOT_TAKEN_TOTAL: &str = "agendo_slot_taken_total";

/// Counter: mutations rejected with field-level validation issues.
pub const VALIDATION_FAILURES_TOTAL: &str = "agendo_validation_failures_total";

/// Counter: accepted status transitions.
pub const STATUS_TRANSITIONS_TOTAL: &str = "agendo_status_transitions_total";

/// Counter: transitions rejected by the transition table.
pub const TRANSITIONS_REJECTED_TOTAL: &str = "agendo_transitions_rejected_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: number of owners with a loaded book.
pub const OWNERS_ACTIVE: &str = "agendo_owners_active";
