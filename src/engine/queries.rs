use chrono::NaiveDate;
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::model::{Appointment, BookingStatus, Client, OwnerId, Service, WeeklyHours};

use super::Engine;

/// Listing filters; unset fields match everything, set fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub client: Option<Ulid>,
}

impl AppointmentFilter {
    fn matches(&self, a: &Appointment) -> bool {
        self.from.is_none_or(|d| a.date >= d)
            && self.to.is_none_or(|d| a.date <= d)
            && self.status.is_none_or(|s| a.status == s)
            && self.client.is_none_or(|c| a.client == c)
    }
}

/// Outcome counts and completed revenue over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodSummary {
    pub total: usize,
    pub completed: usize,
    pub canceled: usize,
    pub no_show: usize,
    /// Sum of charged amounts across completed bookings.
    pub revenue: Decimal,
}

impl Engine {
    pub fn get_client(&self, owner: OwnerId, id: Ulid) -> Option<Client> {
        self.with_existing_book(owner, |book| book.client(&id).cloned())
            .flatten()
    }

    pub fn get_service(&self, owner: OwnerId, id: Ulid) -> Option<Service> {
        self.with_existing_book(owner, |book| book.service(&id).cloned())
            .flatten()
    }

    pub fn get_appointment(&self, owner: OwnerId, id: Ulid) -> Option<Appointment> {
        self.with_existing_book(owner, |book| book.appointment(&id).cloned())
            .flatten()
    }

    /// The day's active bookings ordered by start time.
    pub fn day_schedule(&self, owner: OwnerId, date: NaiveDate) -> Vec<Appointment> {
        self.with_existing_book(owner, |book| book.active_on(date).cloned().collect())
            .unwrap_or_default()
    }

    /// Filtered listing ordered by (date, start).
    pub fn list_appointments(&self, owner: OwnerId, filter: &AppointmentFilter) -> Vec<Appointment> {
        let mut items: Vec<Appointment> = self
            .with_existing_book(owner, |book| {
                book.appointments()
                    .filter(|a| filter.matches(a))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by_key(|a| (a.date, a.window.start));
        items
    }

    /// The next bookings from `today` on, skipping canceled and completed
    /// ones, ordered by (date, start).
    pub fn upcoming(&self, owner: OwnerId, today: NaiveDate, limit: usize) -> Vec<Appointment> {
        let mut items: Vec<Appointment> = self
            .with_existing_book(owner, |book| {
                book.appointments()
                    .filter(|a| {
                        a.date >= today
                            && !matches!(
                                a.status,
                                BookingStatus::Canceled | BookingStatus::Completed
                            )
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by_key(|a| (a.date, a.window.start));
        items.truncate(limit);
        items
    }

    /// Outcome accounting over `[from, to]`, both ends inclusive.
    pub fn period_summary(&self, owner: OwnerId, from: NaiveDate, to: NaiveDate) -> PeriodSummary {
        self.with_existing_book(owner, |book| {
            let mut summary = PeriodSummary::default();
            for a in book.appointments() {
                if a.date < from || a.date > to {
                    continue;
                }
                summary.total += 1;
                match a.status {
                    BookingStatus::Completed => {
                        summary.completed += 1;
                        summary.revenue += a.charged;
                    }
                    BookingStatus::Canceled => summary.canceled += 1,
                    BookingStatus::NoShow => summary.no_show += 1,
                    _ => {}
                }
            }
            summary
        })
        .unwrap_or_default()
    }

    pub fn list_clients(&self, owner: OwnerId, only_active: bool) -> Vec<Client> {
        let mut items: Vec<Client> = self
            .with_existing_book(owner, |book| {
                book.clients()
                    .filter(|c| !only_active || c.active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn list_services(&self, owner: OwnerId, only_active: bool) -> Vec<Service> {
        let mut items: Vec<Service> = self
            .with_existing_book(owner, |book| {
                book.services()
                    .filter(|s| !only_active || s.active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn weekly_hours(&self, owner: OwnerId) -> Vec<WeeklyHours> {
        let mut items: Vec<WeeklyHours> = self
            .with_existing_book(owner, |book| book.weekly_hours().cloned().collect())
            .unwrap_or_default();
        items.sort_by_key(|h| h.weekday.num_days_from_monday());
        items
    }
}
