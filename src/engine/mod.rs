mod conflict;
mod derive;
mod error;
mod lifecycle;
mod mutations;
mod queries;
mod store;
mod validate;

pub use error::{ConflictInfo, EngineError, FieldIssue, IssueCode};
pub use mutations::{BookingRequest, ClientDraft, ServiceDraft};
pub use queries::{AppointmentFilter, PeriodSummary};
pub use store::OwnerBook;

use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use crate::model::OwnerId;

pub type SharedBook = Arc<RwLock<OwnerBook>>;

/// The scheduling engine: one book per owner, each behind its own lock.
///
/// A mutation write-locks exactly one owner's book, so derived-field
/// computation, validation, the conflict scan, and the final insert all
/// observe a single consistent snapshot and commit atomically against it.
/// Two concurrent overlapping bookings for the same owner serialize on that
/// lock; bookings for different owners never contend.
pub struct Engine {
    books: DashMap<OwnerId, SharedBook>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    /// Get or lazily create the book for an owner.
    pub(crate) fn book(&self, owner: OwnerId) -> SharedBook {
        if let Some(book) = self.books.get(&owner) {
            return book.value().clone();
        }
        let book = self
            .books
            .entry(owner)
            .or_insert_with(|| Arc::new(RwLock::new(OwnerBook::new(owner))))
            .value()
            .clone();
        metrics::gauge!(crate::observability::OWNERS_ACTIVE).set(self.books.len() as f64);
        book
    }

    pub(crate) fn with_book<R>(&self, owner: OwnerId, f: impl FnOnce(&mut OwnerBook) -> R) -> R {
        let book = self.book(owner);
        let mut guard = book.write().expect("owner book lock poisoned");
        f(&mut guard)
    }

    /// Read-only access; owners that never booked anything have no book.
    pub(crate) fn with_existing_book<R>(
        &self,
        owner: OwnerId,
        f: impl FnOnce(&OwnerBook) -> R,
    ) -> Option<R> {
        let book = self.books.get(&owner).map(|e| e.value().clone())?;
        let guard = book.read().expect("owner book lock poisoned");
        Some(f(&guard))
    }
}
