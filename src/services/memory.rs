use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{Event, MatchingProfile, Registration, RegistrationStatus};
use crate::services::store::{
    EventStore, ProfileStore, PromoteOutcome, RegistrationStore, StoreError,
};

#[derive(Debug, Default)]
struct State {
    events: HashMap<String, Event>,
    // Insertion order doubles as the FIFO tie-breaker
    registrations: Vec<Registration>,
    registration_index: HashMap<String, usize>,
    profiles: HashMap<(String, String), MatchingProfile>,
}

impl State {
    fn waitlisted(&self, event_id: &str) -> Vec<&Registration> {
        let mut waitlisted: Vec<&Registration> = self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.is_waitlisted())
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        waitlisted.sort_by_key(|r| r.registered_at);
        waitlisted
    }

    fn registration_mut(&mut self, registration_id: &str) -> Option<&mut Registration> {
        let idx = *self.registration_index.get(registration_id)?;
        self.registrations.get_mut(idx)
    }

    fn push_registration(&mut self, registration: Registration) -> Result<(), StoreError> {
        if self.registration_index.contains_key(&registration.registration_id) {
            return Err(StoreError::Conflict(format!(
                "registration {} already exists",
                registration.registration_id
            )));
        }
        self.registration_index
            .insert(registration.registration_id.clone(), self.registrations.len());
        self.registrations.push(registration);
        Ok(())
    }
}

/// In-process store backing every collaborator trait.
///
/// Each method runs under a single lock, which gives the same atomicity the
/// PostgreSQL store gets from conditional updates and row locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let state = self.state.read().await;
        Ok(state.events.get(event_id).cloned())
    }

    async fn put_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.events.insert(event.event_id.clone(), event.clone());
        Ok(())
    }

    async fn try_reserve_seat(&self, event_id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.events.get_mut(event_id) {
            Some(event) if event.registered < event.capacity => {
                event.registered += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::Unavailable(format!("event {} vanished", event_id))),
        }
    }

    async fn release_seat(&self, event_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(event) = state.events.get_mut(event_id) {
            event.registered = (event.registered - 1).max(0);
        }
        Ok(())
    }

    async fn set_capacity(
        &self,
        event_id: &str,
        capacity: i64,
    ) -> Result<Option<Event>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.events.get_mut(event_id).map(|event| {
            let before = event.clone();
            event.capacity = capacity;
            before
        }))
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.push_registration(registration.clone())
    }

    async fn enqueue_waitlisted(
        &self,
        mut registration: Registration,
    ) -> Result<Registration, StoreError> {
        let mut state = self.state.write().await;
        let position = state.waitlisted(&registration.event_id).len() as i64 + 1;
        registration.status = RegistrationStatus::Waitlist;
        registration.waitlist_position = Some(position);
        state.push_registration(registration.clone())?;
        Ok(registration)
    }

    async fn get_registration(
        &self,
        registration_id: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .registration_index
            .get(registration_id)
            .and_then(|idx| state.registrations.get(*idx))
            .cloned())
    }

    async fn list_waitlisted(&self, event_id: &str) -> Result<Vec<Registration>, StoreError> {
        let state = self.state.read().await;
        Ok(state.waitlisted(event_id).into_iter().cloned().collect())
    }

    async fn count_waitlisted(&self, event_id: &str) -> Result<usize, StoreError> {
        let state = self.state.read().await;
        Ok(state.waitlisted(event_id).len())
    }

    async fn promote(
        &self,
        event_id: &str,
        registration_id: &str,
        promoted_at: DateTime<Utc>,
    ) -> Result<PromoteOutcome, StoreError> {
        let mut state = self.state.write().await;
        let has_seat = match state.events.get(event_id) {
            Some(event) => event.registered < event.capacity,
            None => return Err(StoreError::Unavailable(format!("event {} vanished", event_id))),
        };

        match state.registration_mut(registration_id) {
            Some(r) if r.is_waitlisted() && r.event_id == event_id => {
                if !has_seat {
                    return Ok(PromoteOutcome::NoSeat);
                }
                r.status = RegistrationStatus::Confirmed;
                r.waitlist_position = None;
                r.promoted_at = Some(promoted_at);
            }
            _ => return Ok(PromoteOutcome::NotWaitlisted),
        }

        if let Some(event) = state.events.get_mut(event_id) {
            event.registered += 1;
        }
        Ok(PromoteOutcome::Promoted)
    }

    async fn set_waitlist_position(
        &self,
        registration_id: &str,
        position: i64,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.registration_mut(registration_id) {
            Some(r) => {
                r.waitlist_position = Some(position);
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!(
                "registration {} vanished",
                registration_id
            ))),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert_profile(&self, profile: &MatchingProfile) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.profiles.insert(
            (profile.user_id.clone(), profile.event_id.clone()),
            profile.clone(),
        );
        Ok(())
    }

    async fn get_profile(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<MatchingProfile>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .profiles
            .get(&(user_id.to_string(), event_id.to_string()))
            .cloned())
    }

    async fn profiles_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<MatchingProfile>, StoreError> {
        let state = self.state.read().await;
        let mut profiles: Vec<MatchingProfile> = state
            .profiles
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(profiles)
    }
}
