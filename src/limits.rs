//! Hard input limits. Exceeding any of these is a validation failure, never
//! a truncation.

/// Names (client, service) — mirrors the form field cap.
pub const MAX_NAME_LEN: usize = 100;

/// Free text: address, notes, service description.
pub const MAX_TEXT_LEN: usize = 2000;

/// Duration input fields are bounded to one day minus a minute.
pub const MAX_DURATION_HOURS: i64 = 23;
pub const MAX_DURATION_MINUTES: i64 = 59;

/// Minimum client age in whole years at registration.
pub const MIN_CLIENT_AGE_YEARS: i32 = 1;
