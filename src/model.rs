use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Account identifier — the sole visibility and mutation boundary.
/// Every entity belongs to exactly one owner; nothing is shared across owners.
pub type OwnerId = Ulid;

/// Half-open time-of-day window `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    /// Window starting at `start` and spanning `duration`.
    ///
    /// Returns `None` when the end would land on or past midnight — windows
    /// never cross a day boundary, so such a request is rejected outright
    /// rather than wrapped.
    pub fn from_start(start: NaiveTime, duration: Duration) -> Option<Self> {
        if duration <= Duration::zero() {
            return None;
        }
        let (end, wrap) = start.overflowing_add_signed(duration);
        (wrap == 0).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains(&self, other: &Window) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}–{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Build a service duration from the bounded hour/minute input fields.
/// `None` when hours ∉ [0,23] or minutes ∉ [0,59]; callers surface that as
/// an out-of-range field issue.
pub fn duration_from_fields(hours: i64, minutes: i64) -> Option<Duration> {
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    Some(Duration::hours(hours) + Duration::minutes(minutes))
}

/// Human-readable duration: `1h30min`, zero-padded minutes, no rounding.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_minutes();
    format!("{}h{:02}min", total / 60, total % 60)
}

/// Booking status. The transition table below is the single source of truth
/// for legal edges; everything else (editability, cancelability, the active
/// set) is derived from it or from the status itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    NoShow,
}

impl BookingStatus {
    /// Legal next statuses. Terminal statuses map to the empty slice.
    pub fn allowed_next(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Scheduled => &[Confirmed, InProgress, Canceled, NoShow],
            Confirmed => &[InProgress, Canceled, NoShow],
            InProgress => &[Completed, Canceled, NoShow],
            Completed | Canceled | NoShow => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Still pending or happening — the statuses that occupy calendar time
    /// for conflict purposes.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Scheduled | BookingStatus::Confirmed | BookingStatus::InProgress
        )
    }

    /// Field edits (date, time, client, service) are only accepted here.
    pub fn can_edit(self) -> bool {
        matches!(self, BookingStatus::Scheduled | BookingStatus::Confirmed)
    }

    /// Cancellation/deletion guard. Note this is wider than the transition
    /// table: a no-show may still be deleted, but not re-canceled.
    pub fn can_cancel(self) -> bool {
        !matches!(self, BookingStatus::Completed | BookingStatus::Canceled)
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Scheduled => "scheduled",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Ulid,
    pub owner: OwnerId,
    pub name: String,
    /// Unique per owner.
    pub email: String,
    /// Masked form as typed, e.g. `(11) 99999-9999`. Never normalized.
    pub phone: String,
    /// As typed, e.g. `123.456.789-09`. Format-validated only, no checksum.
    /// Unique per owner.
    pub national_id: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Client {
    /// Age in whole years as of `today`.
    pub fn age(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Ulid,
    pub owner: OwnerId,
    pub name: String,
    pub description: Option<String>,
    /// Always > 0.
    #[serde(with = "duration_minutes")]
    pub duration: Duration,
    /// Non-negative.
    pub price: Decimal,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl Service {
    pub fn duration_label(&self) -> String {
        format_duration(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Ulid,
    pub owner: OwnerId,
    pub client: Ulid,
    pub service: Ulid,
    pub date: NaiveDate,
    pub window: Window,
    pub status: BookingStatus,
    pub notes: Option<String>,
    /// Defaults to the service price at booking time.
    pub charged: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Opening hours for one weekday. At most one entry per (owner, weekday);
/// an inactive or missing entry leaves that weekday unrestricted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub weekday: Weekday,
    pub window: Window,
    pub active: bool,
}

/// Service durations persist as whole minutes.
mod duration_minutes {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.num_minutes().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::minutes(i64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_overlap_half_open() {
        let a = Window::new(t(10, 0), t(10, 30));
        let b = Window::new(t(10, 15), t(10, 45));
        let c = Window::new(t(10, 30), t(11, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // touching boundary, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn window_contains() {
        let outer = Window::new(t(8, 0), t(18, 0));
        let inner = Window::new(t(9, 0), t(9, 30));
        let partial = Window::new(t(17, 30), t(18, 30));
        assert!(outer.contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&partial));
    }

    #[test]
    fn window_from_start_same_day() {
        let w = Window::from_start(t(14, 0), Duration::minutes(30)).unwrap();
        assert_eq!(w.end, t(14, 30));
        assert!(w.end > w.start);
    }

    #[test]
    fn window_from_start_rejects_midnight_crossing() {
        assert!(Window::from_start(t(23, 45), Duration::minutes(30)).is_none());
        // Ending exactly at midnight wraps to 00:00 — also rejected.
        assert!(Window::from_start(t(23, 0), Duration::hours(1)).is_none());
        assert!(Window::from_start(t(14, 0), Duration::zero()).is_none());
    }

    #[test]
    fn duration_fields_bounds() {
        assert!(duration_from_fields(0, 30).is_some());
        assert!(duration_from_fields(23, 59).is_some());
        assert!(duration_from_fields(24, 0).is_none());
        assert!(duration_from_fields(1, 60).is_none());
        assert!(duration_from_fields(-1, 0).is_none());
    }

    #[test]
    fn duration_format_round_trip() {
        let d = duration_from_fields(1, 30).unwrap();
        assert_eq!(format_duration(d), "1h30min");
        assert_eq!(format_duration(duration_from_fields(0, 5).unwrap()), "0h05min");
        assert_eq!(format_duration(duration_from_fields(2, 0).unwrap()), "2h00min");
        // Hours/minutes extracted from the duration match the inputs.
        assert_eq!(d.num_minutes() / 60, 1);
        assert_eq!(d.num_minutes() % 60, 30);
    }

    #[test]
    fn status_transition_table() {
        use BookingStatus::*;
        assert!(Scheduled.can_transition_to(Confirmed));
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Scheduled));
        assert!(InProgress.can_transition_to(Completed));
        for s in [Completed, Canceled, NoShow] {
            assert!(s.is_terminal());
            assert!(s.allowed_next().is_empty());
        }
    }

    #[test]
    fn status_derived_predicates() {
        use BookingStatus::*;
        assert!(Scheduled.is_active() && Confirmed.is_active() && InProgress.is_active());
        assert!(!Completed.is_active() && !Canceled.is_active() && !NoShow.is_active());
        assert!(Scheduled.can_edit() && Confirmed.can_edit());
        assert!(!InProgress.can_edit() && !Completed.can_edit());
        assert!(NoShow.can_cancel()); // deletable, though terminal
        assert!(!Completed.can_cancel() && !Canceled.can_cancel());
    }

    #[test]
    fn client_age_adjusts_for_month_and_day() {
        let client = Client {
            id: Ulid::new(),
            owner: Ulid::new(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "(11) 99999-9999".into(),
            national_id: "123.456.789-09".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            address: None,
            notes: None,
            active: true,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_time(NaiveTime::MIN),
            updated_at: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_time(NaiveTime::MIN),
        };
        assert_eq!(client.age(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 34);
        assert_eq!(client.age(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 35);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&BookingStatus::NoShow).unwrap();
        assert_eq!(json, "\"no_show\"");
        let back: BookingStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(back, BookingStatus::InProgress);
    }
}
