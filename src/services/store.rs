use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Event, MatchingProfile, Registration};

/// Errors that can occur in any store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Event records and their seat counters
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;

    /// Create or replace an event record
    async fn put_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Take one seat if `registered < capacity`. Returns whether a seat was taken.
    async fn try_reserve_seat(&self, event_id: &str) -> Result<bool, StoreError>;

    /// Give back a seat taken by `try_reserve_seat`
    async fn release_seat(&self, event_id: &str) -> Result<(), StoreError>;

    /// Overwrite capacity, returning the event as it was before the update
    async fn set_capacity(&self, event_id: &str, capacity: i64)
        -> Result<Option<Event>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Result of trying to promote one waitlisted registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoteOutcome {
    Promoted,
    /// The registration had already left the waitlist
    NotWaitlisted,
    /// The event has no free seat; nothing was changed
    NoSeat,
}

/// Registration records and the per-event waitlist
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn insert_registration(&self, registration: &Registration) -> Result<(), StoreError>;

    /// Persist a waitlisted registration at the tail of its event's waitlist.
    ///
    /// The position is `count(waitlisted) + 1`, allocated in the same atomic step
    /// as the insert, so concurrent joins never share a position.
    async fn enqueue_waitlisted(&self, registration: Registration)
        -> Result<Registration, StoreError>;

    async fn get_registration(&self, registration_id: &str)
        -> Result<Option<Registration>, StoreError>;

    /// Waitlisted registrations in FIFO order (registeredAt, then insertion order)
    async fn list_waitlisted(&self, event_id: &str) -> Result<Vec<Registration>, StoreError>;

    async fn count_waitlisted(&self, event_id: &str) -> Result<usize, StoreError>;

    /// Confirm a waitlisted registration and take a seat for it, atomically.
    ///
    /// Only succeeds while the registration is still waitlisted and the event
    /// has `registered < capacity`; otherwise nothing changes.
    async fn promote(
        &self,
        event_id: &str,
        registration_id: &str,
        promoted_at: DateTime<Utc>,
    ) -> Result<PromoteOutcome, StoreError>;

    async fn set_waitlist_position(
        &self,
        registration_id: &str,
        position: i64,
    ) -> Result<(), StoreError>;
}

/// Matchmaking profiles keyed by (userId, eventId)
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert_profile(&self, profile: &MatchingProfile) -> Result<(), StoreError>;

    async fn get_profile(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<MatchingProfile>, StoreError>;

    /// Every profile for the event, ordered by createdAt then userId
    async fn profiles_for_event(&self, event_id: &str)
        -> Result<Vec<MatchingProfile>, StoreError>;
}
