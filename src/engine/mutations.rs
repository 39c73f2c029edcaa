use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use tracing::info;
use ulid::Ulid;

use crate::model::{
    Appointment, BookingStatus, Client, OwnerId, Service, WeeklyHours, Window,
};
use crate::observability;

use super::error::FieldIssue;
use super::store::OwnerBook;
use super::{conflict, derive, lifecycle, validate, Engine, EngineError};

/// Audit timestamps come from the wall clock; validation never does — the
/// caller supplies `today` explicitly.
fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

fn invalid(issues: Vec<FieldIssue>) -> EngineError {
    metrics::counter!(observability::VALIDATION_FAILURES_TOTAL).increment(1);
    EngineError::Invalid(issues)
}

/// Raw client form input. Formatted fields arrive exactly as typed.
#[derive(Debug, Clone)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub national_id: String,
    pub birth_date: NaiveDate,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
}

/// Raw service form input; duration comes in as the two bounded fields.
#[derive(Debug, Clone)]
pub struct ServiceDraft {
    pub name: String,
    pub description: Option<String>,
    pub duration_hours: i64,
    pub duration_minutes: i64,
    pub price: Decimal,
    pub active: bool,
}

/// A booking request as it leaves the form: end time and charged amount are
/// optional and filled from the service when absent.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client: Ulid,
    pub service: Ulid,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    pub charged: Option<Decimal>,
    pub notes: Option<String>,
}

fn client_issues(draft: &ClientDraft, today: NaiveDate) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    issues.extend(validate::name("name", &draft.name).err());
    issues.extend(validate::email(&draft.email).err());
    issues.extend(validate::phone(&draft.phone).err());
    issues.extend(validate::national_id(&draft.national_id).err());
    issues.extend(validate::birth_date(draft.birth_date, today).err());
    issues.extend(validate::text("address", draft.address.as_deref()).err());
    issues.extend(validate::text("notes", draft.notes.as_deref()).err());
    issues
}

fn unique_client_issues(
    book: &OwnerBook,
    draft: &ClientDraft,
    exclude: Option<Ulid>,
) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    if book.email_taken(&draft.email, exclude) {
        issues.push(FieldIssue::new(
            "email",
            super::IssueCode::Duplicate,
            "another client already uses this email",
        ));
    }
    if book.national_id_taken(&draft.national_id, exclude) {
        issues.push(FieldIssue::new(
            "national_id",
            super::IssueCode::Duplicate,
            "another client already uses this national id",
        ));
    }
    issues
}

fn service_issues(draft: &ServiceDraft) -> (Vec<FieldIssue>, Option<chrono::Duration>) {
    let mut issues = Vec::new();
    issues.extend(validate::name("name", &draft.name).err());
    issues.extend(validate::text("description", draft.description.as_deref()).err());
    issues.extend(validate::money("price", draft.price).err());
    let duration = match validate::duration_fields(draft.duration_hours, draft.duration_minutes) {
        Ok(d) => Some(d),
        Err(more) => {
            issues.extend(more);
            None
        }
    };
    (issues, duration)
}

/// Weekly opening hours only constrain weekdays that have an active entry.
fn ensure_within_hours(
    book: &OwnerBook,
    date: NaiveDate,
    window: &Window,
) -> Result<(), EngineError> {
    if let Some(hours) = book.hours_for(date.weekday())
        && hours.active
        && !hours.window.contains(window)
    {
        return Err(EngineError::OutsideBusinessHours {
            weekday: date.weekday(),
            open: hours.window,
        });
    }
    Ok(())
}

impl Engine {
    // ── Clients ──────────────────────────────────────────────

    pub fn create_client(
        &self,
        owner: OwnerId,
        draft: ClientDraft,
        today: NaiveDate,
    ) -> Result<Client, EngineError> {
        let mut issues = client_issues(&draft, today);
        self.with_book(owner, |book| {
            issues.extend(unique_client_issues(book, &draft, None));
            if !issues.is_empty() {
                return Err(invalid(issues));
            }
            let stamp = now();
            let client = Client {
                id: Ulid::new(),
                owner,
                name: draft.name,
                email: draft.email,
                phone: draft.phone,
                national_id: draft.national_id,
                birth_date: draft.birth_date,
                address: draft.address,
                notes: draft.notes,
                active: draft.active,
                created_at: stamp,
                updated_at: stamp,
            };
            book.put_client(client.clone());
            info!(%owner, client = %client.id, "client created");
            Ok(client)
        })
    }

    pub fn update_client(
        &self,
        owner: OwnerId,
        id: Ulid,
        draft: ClientDraft,
        today: NaiveDate,
    ) -> Result<Client, EngineError> {
        let mut issues = client_issues(&draft, today);
        self.with_book(owner, |book| {
            let existing = book.client(&id).ok_or(EngineError::NotFound(id))?.clone();
            issues.extend(unique_client_issues(book, &draft, Some(id)));
            if !issues.is_empty() {
                return Err(invalid(issues));
            }
            let client = Client {
                id,
                owner,
                name: draft.name,
                email: draft.email,
                phone: draft.phone,
                national_id: draft.national_id,
                birth_date: draft.birth_date,
                address: draft.address,
                notes: draft.notes,
                active: draft.active,
                created_at: existing.created_at,
                updated_at: now(),
            };
            book.put_client(client.clone());
            info!(%owner, client = %id, "client updated");
            Ok(client)
        })
    }

    /// Soft removal — always allowed, keeps history intact.
    pub fn deactivate_client(&self, owner: OwnerId, id: Ulid) -> Result<Client, EngineError> {
        self.with_book(owner, |book| {
            let mut client = book.client(&id).ok_or(EngineError::NotFound(id))?.clone();
            client.active = false;
            client.updated_at = now();
            book.put_client(client.clone());
            info!(%owner, client = %id, "client deactivated");
            Ok(client)
        })
    }

    /// Physical removal — refused while future scheduled/confirmed bookings
    /// still reference the client; deactivate instead.
    pub fn delete_client(
        &self,
        owner: OwnerId,
        id: Ulid,
        today: NaiveDate,
    ) -> Result<Client, EngineError> {
        self.with_book(owner, |book| {
            if book.client(&id).is_none() {
                return Err(EngineError::NotFound(id));
            }
            let count = book.upcoming_for_client(&id, today);
            if count > 0 {
                return Err(EngineError::ReferencedByUpcoming {
                    entity: "client",
                    count,
                });
            }
            let client = book.remove_client(&id).ok_or(EngineError::NotFound(id))?;
            info!(%owner, client = %id, "client deleted");
            Ok(client)
        })
    }

    // ── Services ─────────────────────────────────────────────

    pub fn create_service(
        &self,
        owner: OwnerId,
        draft: ServiceDraft,
    ) -> Result<Service, EngineError> {
        let (issues, duration) = service_issues(&draft);
        if !issues.is_empty() {
            return Err(invalid(issues));
        }
        let duration = duration.expect("no issues implies a duration");
        self.with_book(owner, |book| {
            let service = Service {
                id: Ulid::new(),
                owner,
                name: draft.name,
                description: draft.description,
                duration,
                price: draft.price,
                active: draft.active,
                created_at: now(),
            };
            book.put_service(service.clone());
            info!(%owner, service = %service.id, duration = %service.duration_label(), "service created");
            Ok(service)
        })
    }

    pub fn update_service(
        &self,
        owner: OwnerId,
        id: Ulid,
        draft: ServiceDraft,
    ) -> Result<Service, EngineError> {
        let (issues, duration) = service_issues(&draft);
        if !issues.is_empty() {
            return Err(invalid(issues));
        }
        let duration = duration.expect("no issues implies a duration");
        self.with_book(owner, |book| {
            let existing = book.service(&id).ok_or(EngineError::NotFound(id))?.clone();
            let service = Service {
                id,
                owner,
                name: draft.name,
                description: draft.description,
                duration,
                price: draft.price,
                active: draft.active,
                created_at: existing.created_at,
            };
            book.put_service(service.clone());
            info!(%owner, service = %id, "service updated");
            Ok(service)
        })
    }

    pub fn deactivate_service(&self, owner: OwnerId, id: Ulid) -> Result<Service, EngineError> {
        self.with_book(owner, |book| {
            let mut service = book.service(&id).ok_or(EngineError::NotFound(id))?.clone();
            service.active = false;
            book.put_service(service.clone());
            info!(%owner, service = %id, "service deactivated");
            Ok(service)
        })
    }

    pub fn delete_service(
        &self,
        owner: OwnerId,
        id: Ulid,
        today: NaiveDate,
    ) -> Result<Service, EngineError> {
        self.with_book(owner, |book| {
            if book.service(&id).is_none() {
                return Err(EngineError::NotFound(id));
            }
            let count = book.upcoming_for_service(&id, today);
            if count > 0 {
                return Err(EngineError::ReferencedByUpcoming {
                    entity: "service",
                    count,
                });
            }
            let service = book.remove_service(&id).ok_or(EngineError::NotFound(id))?;
            info!(%owner, service = %id, "service deleted");
            Ok(service)
        })
    }

    // ── Appointments ─────────────────────────────────────────

    /// Book an appointment: derive missing fields from the service, validate,
    /// enforce the (date, start) uniqueness constraint, scan for overlaps,
    /// check opening hours, insert. All under the owner's book lock.
    pub fn book_appointment(
        &self,
        owner: OwnerId,
        req: BookingRequest,
        today: NaiveDate,
    ) -> Result<Appointment, EngineError> {
        self.with_book(owner, |book| {
            let client_id = req.client;
            let client = book
                .client(&client_id)
                .ok_or(EngineError::NotFound(client_id))?;
            if !client.active {
                return Err(EngineError::InactiveRef {
                    entity: "client",
                    id: client_id,
                });
            }
            let service = book
                .service(&req.service)
                .ok_or(EngineError::NotFound(req.service))?
                .clone();
            if !service.active {
                return Err(EngineError::InactiveRef {
                    entity: "service",
                    id: req.service,
                });
            }

            // Derived fields first; validators rule on the completed request.
            let mut issues = Vec::new();
            let window = match derive::resolve_window(req.start, req.end, &service) {
                Ok(w) => Some(w),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            };
            let charged = derive::resolve_charge(req.charged, &service);

            issues.extend(validate::booking_date(req.date, today).err());
            if let Some(w) = &window {
                issues.extend(validate::window(w.start, w.end).err());
            }
            issues.extend(validate::money("charged", charged).err());
            issues.extend(validate::text("notes", req.notes.as_deref()).err());
            if !issues.is_empty() {
                return Err(invalid(issues));
            }
            let window = window.expect("no issues implies a window");

            if book.slot_taken(req.date, window.start, None) {
                metrics::counter!(observability::SLOT_TAKEN_TOTAL).increment(1);
                return Err(EngineError::SlotTaken {
                    date: req.date,
                    start: window.start,
                });
            }

            let hits = conflict::find_conflicts(book, req.date, &window, None);
            if !hits.is_empty() {
                metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                return Err(EngineError::Conflict(hits));
            }

            ensure_within_hours(book, req.date, &window)?;

            let stamp = now();
            let appointment = Appointment {
                id: Ulid::new(),
                owner,
                client: client_id,
                service: req.service,
                date: req.date,
                window,
                status: BookingStatus::Scheduled,
                notes: req.notes,
                charged,
                created_at: stamp,
                updated_at: stamp,
            };
            book.put_appointment(appointment.clone());
            metrics::counter!(observability::BOOKINGS_TOTAL).increment(1);
            info!(
                %owner,
                appointment = %appointment.id,
                date = %appointment.date,
                window = %appointment.window,
                "appointment booked"
            );
            Ok(appointment)
        })
    }

    /// Replace the editable fields of a booking. Only `Scheduled`/`Confirmed`
    /// bookings accept field edits; afterwards, status changes are the only
    /// mutation path. The edited booking is excluded from its own conflict
    /// and uniqueness checks.
    pub fn update_appointment(
        &self,
        owner: OwnerId,
        id: Ulid,
        req: BookingRequest,
        today: NaiveDate,
    ) -> Result<Appointment, EngineError> {
        self.with_book(owner, |book| {
            let existing = book
                .appointment(&id)
                .ok_or(EngineError::NotFound(id))?
                .clone();
            lifecycle::ensure_editable(existing.status)?;

            let client = book
                .client(&req.client)
                .ok_or(EngineError::NotFound(req.client))?;
            if !client.active {
                return Err(EngineError::InactiveRef {
                    entity: "client",
                    id: req.client,
                });
            }
            let service = book
                .service(&req.service)
                .ok_or(EngineError::NotFound(req.service))?
                .clone();
            if !service.active {
                return Err(EngineError::InactiveRef {
                    entity: "service",
                    id: req.service,
                });
            }

            let mut issues = Vec::new();
            let window = match derive::resolve_window(req.start, req.end, &service) {
                Ok(w) => Some(w),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            };
            let charged = derive::resolve_charge(req.charged, &service);

            issues.extend(validate::booking_date(req.date, today).err());
            if let Some(w) = &window {
                issues.extend(validate::window(w.start, w.end).err());
            }
            issues.extend(validate::money("charged", charged).err());
            issues.extend(validate::text("notes", req.notes.as_deref()).err());
            if !issues.is_empty() {
                return Err(invalid(issues));
            }
            let window = window.expect("no issues implies a window");

            if book.slot_taken(req.date, window.start, Some(id)) {
                metrics::counter!(observability::SLOT_TAKEN_TOTAL).increment(1);
                return Err(EngineError::SlotTaken {
                    date: req.date,
                    start: window.start,
                });
            }

            let hits = conflict::find_conflicts(book, req.date, &window, Some(id));
            if !hits.is_empty() {
                metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                return Err(EngineError::Conflict(hits));
            }

            ensure_within_hours(book, req.date, &window)?;

            let appointment = Appointment {
                id,
                owner,
                client: req.client,
                service: req.service,
                date: req.date,
                window,
                status: existing.status,
                notes: req.notes,
                charged,
                created_at: existing.created_at,
                updated_at: now(),
            };
            book.put_appointment(appointment.clone());
            info!(%owner, appointment = %id, "appointment updated");
            Ok(appointment)
        })
    }

    /// Move a booking along the transition table.
    pub fn change_status(
        &self,
        owner: OwnerId,
        id: Ulid,
        to: BookingStatus,
    ) -> Result<Appointment, EngineError> {
        self.with_book(owner, |book| {
            let mut appointment = book
                .appointment(&id)
                .ok_or(EngineError::NotFound(id))?
                .clone();
            lifecycle::ensure_transition(appointment.status, to)?;
            let from = appointment.status;
            appointment.status = to;
            appointment.updated_at = now();
            book.put_appointment(appointment.clone());
            metrics::counter!(observability::STATUS_TRANSITIONS_TOTAL).increment(1);
            info!(%owner, appointment = %id, %from, %to, "status changed");
            Ok(appointment)
        })
    }

    /// Convenience for the common "cancel" action. A completed or already
    /// canceled booking reports `NotCancelable`; anything else goes through
    /// the transition table (so a no-show, though deletable, cannot be
    /// re-labeled as canceled).
    pub fn cancel_appointment(&self, owner: OwnerId, id: Ulid) -> Result<Appointment, EngineError> {
        self.with_book(owner, |book| {
            let mut appointment = book
                .appointment(&id)
                .ok_or(EngineError::NotFound(id))?
                .clone();
            lifecycle::ensure_cancelable(appointment.status)?;
            lifecycle::ensure_transition(appointment.status, BookingStatus::Canceled)?;
            let from = appointment.status;
            appointment.status = BookingStatus::Canceled;
            appointment.updated_at = now();
            book.put_appointment(appointment.clone());
            metrics::counter!(observability::STATUS_TRANSITIONS_TOTAL).increment(1);
            info!(%owner, appointment = %id, %from, "appointment canceled");
            Ok(appointment)
        })
    }

    /// Remove a booking outright. Follows the cancel guard: completed and
    /// canceled bookings stay on record.
    pub fn delete_appointment(&self, owner: OwnerId, id: Ulid) -> Result<Appointment, EngineError> {
        self.with_book(owner, |book| {
            let status = book
                .appointment(&id)
                .ok_or(EngineError::NotFound(id))?
                .status;
            lifecycle::ensure_cancelable(status)?;
            let appointment = book
                .remove_appointment(&id)
                .ok_or(EngineError::NotFound(id))?;
            info!(%owner, appointment = %id, "appointment deleted");
            Ok(appointment)
        })
    }

    // ── Weekly hours ─────────────────────────────────────────

    pub fn set_weekly_hours(
        &self,
        owner: OwnerId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
        active: bool,
    ) -> Result<WeeklyHours, EngineError> {
        if let Err(issue) = validate::window(start, end) {
            return Err(invalid(vec![issue]));
        }
        self.with_book(owner, |book| {
            let entry = WeeklyHours {
                weekday,
                window: Window::new(start, end),
                active,
            };
            book.set_hours(entry.clone());
            info!(%owner, %weekday, hours = %entry.window, "weekly hours set");
            Ok(entry)
        })
    }

    pub fn clear_weekly_hours(&self, owner: OwnerId, weekday: Weekday) -> Option<WeeklyHours> {
        self.with_book(owner, |book| book.clear_hours(weekday))
    }
}
