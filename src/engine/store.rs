use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use chrono::{NaiveDate, NaiveTime, Weekday};
use ulid::Ulid;

use crate::model::{Appointment, BookingStatus, Client, OwnerId, Service, WeeklyHours};

/// One owner's book: everything the owner can see, behind one lock.
///
/// This is the in-memory realization of the persistence contract the engine
/// consumes: list the active bookings of a day, probe a (date, start) slot,
/// save and fetch entities. The slot index is the uniqueness constraint on
/// (owner, date, start) — deliberately kept separate from the overlap scan,
/// which alone could not survive concurrent writers.
pub struct OwnerBook {
    pub(crate) owner: OwnerId,
    clients: HashMap<Ulid, Client>,
    services: HashMap<Ulid, Service>,
    appointments: HashMap<Ulid, Appointment>,
    /// (date, start) → appointment id, every status included.
    slots: BTreeMap<(NaiveDate, NaiveTime), Ulid>,
    hours: HashMap<Weekday, WeeklyHours>,
}

impl OwnerBook {
    pub(crate) fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            clients: HashMap::new(),
            services: HashMap::new(),
            appointments: HashMap::new(),
            slots: BTreeMap::new(),
            hours: HashMap::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    // ── Clients ──────────────────────────────────────────────

    pub fn client(&self, id: &Ulid) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub(crate) fn put_client(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    pub(crate) fn remove_client(&mut self, id: &Ulid) -> Option<Client> {
        self.clients.remove(id)
    }

    pub(crate) fn email_taken(&self, email: &str, exclude: Option<Ulid>) -> bool {
        self.clients
            .values()
            .any(|c| Some(c.id) != exclude && c.email.eq_ignore_ascii_case(email))
    }

    pub(crate) fn national_id_taken(&self, national_id: &str, exclude: Option<Ulid>) -> bool {
        self.clients
            .values()
            .any(|c| Some(c.id) != exclude && c.national_id == national_id)
    }

    // ── Services ─────────────────────────────────────────────

    pub fn service(&self, id: &Ulid) -> Option<&Service> {
        self.services.get(id)
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub(crate) fn put_service(&mut self, service: Service) {
        self.services.insert(service.id, service);
    }

    pub(crate) fn remove_service(&mut self, id: &Ulid) -> Option<Service> {
        self.services.remove(id)
    }

    // ── Appointments ─────────────────────────────────────────

    pub fn appointment(&self, id: &Ulid) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    /// True when another appointment already starts at exactly (date, start).
    pub(crate) fn slot_taken(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        exclude: Option<Ulid>,
    ) -> bool {
        match self.slots.get(&(date, start)) {
            Some(id) => Some(*id) != exclude,
            None => false,
        }
    }

    /// Insert or replace, keeping the slot index consistent.
    pub(crate) fn put_appointment(&mut self, appointment: Appointment) {
        if let Some(old) = self.appointments.get(&appointment.id) {
            self.slots.remove(&(old.date, old.window.start));
        }
        self.slots
            .insert((appointment.date, appointment.window.start), appointment.id);
        self.appointments.insert(appointment.id, appointment);
    }

    pub(crate) fn remove_appointment(&mut self, id: &Ulid) -> Option<Appointment> {
        let appointment = self.appointments.remove(id)?;
        self.slots
            .remove(&(appointment.date, appointment.window.start));
        Some(appointment)
    }

    /// All of a day's appointments ordered by start time.
    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = &Appointment> {
        let lower = Bound::Included((date, NaiveTime::MIN));
        let upper = match date.succ_opt() {
            Some(next) => Bound::Excluded((next, NaiveTime::MIN)),
            None => Bound::Unbounded,
        };
        self.slots
            .range((lower, upper))
            .filter_map(|(_, id)| self.appointments.get(id))
    }

    /// The day's appointments in an active status, ordered by start time —
    /// the consistent snapshot the conflict scan runs against.
    pub fn active_on(&self, date: NaiveDate) -> impl Iterator<Item = &Appointment> {
        self.on_date(date).filter(|a| a.status.is_active())
    }

    /// Count of future scheduled/confirmed bookings referencing a client.
    pub(crate) fn upcoming_for_client(&self, client: &Ulid, today: NaiveDate) -> usize {
        self.appointments
            .values()
            .filter(|a| a.client == *client && a.date >= today && upcoming_status(a.status))
            .count()
    }

    /// Count of future scheduled/confirmed bookings referencing a service.
    pub(crate) fn upcoming_for_service(&self, service: &Ulid, today: NaiveDate) -> usize {
        self.appointments
            .values()
            .filter(|a| a.service == *service && a.date >= today && upcoming_status(a.status))
            .count()
    }

    // ── Weekly hours ─────────────────────────────────────────

    pub fn hours_for(&self, weekday: Weekday) -> Option<&WeeklyHours> {
        self.hours.get(&weekday)
    }

    pub fn weekly_hours(&self) -> impl Iterator<Item = &WeeklyHours> {
        self.hours.values()
    }

    pub(crate) fn set_hours(&mut self, entry: WeeklyHours) {
        self.hours.insert(entry.weekday, entry);
    }

    pub(crate) fn clear_hours(&mut self, weekday: Weekday) -> Option<WeeklyHours> {
        self.hours.remove(&weekday)
    }
}

fn upcoming_status(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Scheduled | BookingStatus::Confirmed)
}
