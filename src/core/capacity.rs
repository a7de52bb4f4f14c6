use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::credential::qr_payload;
use crate::error::AppError;
use crate::models::{
    CapacityUpdateResult, Event, Registrant, Registration, RegistrationResult, RegistrationStatus,
};
use crate::services::{
    EventStore, Notification, NotificationKind, Notifier, PromoteOutcome, RegistrationStore,
};

/// Admits registrants against an event's capacity and promotes the waitlist
/// when capacity grows.
///
/// Registration lifecycle: `confirmed` on arrival, or `waitlist` and later
/// `confirmed` by promotion. Nothing moves a confirmed registration back.
#[derive(Clone)]
pub struct CapacityController {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    notifier: Arc<dyn Notifier>,
    qr_base_url: String,
}

impl CapacityController {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        notifier: Arc<dyn Notifier>,
        qr_base_url: String,
    ) -> Self {
        Self {
            events,
            registrations,
            notifier,
            qr_base_url,
        }
    }

    async fn load_event(&self, event_id: &str) -> Result<Event, AppError> {
        self.events
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
    }

    /// Register for an event, confirming if a seat is free and waitlisting otherwise.
    ///
    /// The seat is taken with a conditional increment, so two concurrent
    /// registrations can never both take the last seat. If persisting the
    /// confirmed registration fails, the seat is handed back and the error
    /// propagates.
    pub async fn register(
        &self,
        event_id: &str,
        registrant: Registrant,
    ) -> Result<RegistrationResult, AppError> {
        if event_id.trim().is_empty() {
            return Err(AppError::Validation("eventId is required".to_string()));
        }
        registrant.validate()?;

        let event = self.load_event(event_id).await?;

        let registration_id = Uuid::new_v4().to_string();
        let registration = Registration {
            qr_payload: qr_payload(
                event_id,
                &registration_id,
                &registrant.full_name,
                &registrant.email,
            ),
            registration_id,
            event_id: event_id.to_string(),
            event_name: event.name.clone(),
            full_name: registrant.full_name,
            email: registrant.email,
            phone: registrant.phone,
            organization: registrant.organization,
            interest: registrant.interest,
            status: RegistrationStatus::Confirmed,
            registered_at: Utc::now(),
            waitlist_position: None,
            promoted_at: None,
        };

        if self.events.try_reserve_seat(event_id).await? {
            if let Err(e) = self.registrations.insert_registration(&registration).await {
                if let Err(release_err) = self.events.release_seat(event_id).await {
                    tracing::error!(
                        "Failed to release seat on event {} after write failure: {}",
                        event_id,
                        release_err
                    );
                }
                return Err(e.into());
            }

            tracing::info!(
                "Confirmed registration {} for event {}",
                registration.registration_id,
                event_id
            );
            self.notify(NotificationKind::Confirmation, &event, &registration)
                .await;

            return Ok(result(
                "Registration successful!",
                &event,
                registration,
            ));
        }

        let registration = self.registrations.enqueue_waitlisted(registration).await?;

        tracing::info!(
            "Event {} is full, waitlisted registration {} at position {:?}",
            event_id,
            registration.registration_id,
            registration.waitlist_position
        );

        Ok(result(
            "Event is full. Added to waitlist.",
            &event,
            registration,
        ))
    }

    /// Overwrite an event's capacity, promoting from the waitlist when it grows.
    ///
    /// Shrinking capacity never evicts anyone; an event left over capacity
    /// stays that way until registrations drain below the new limit.
    pub async fn update_capacity(
        &self,
        event_id: &str,
        new_capacity: i64,
    ) -> Result<CapacityUpdateResult, AppError> {
        if new_capacity < 0 {
            return Err(AppError::Validation(
                "newCapacity must be non-negative".to_string(),
            ));
        }

        let before = self
            .events
            .set_capacity(event_id, new_capacity)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        tracing::info!(
            "Capacity of event {} changed from {} to {}",
            event_id,
            before.capacity,
            new_capacity
        );

        let mut promoted_users = 0;
        if new_capacity > before.capacity {
            let available_slots = new_capacity - before.registered;
            if available_slots > 0 {
                // Capacity is already committed; a failed promotion pass is only logged
                promoted_users = match self
                    .promote_waitlist(event_id, available_slots as usize)
                    .await
                {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::error!("Waitlist promotion for event {} failed: {}", event_id, e);
                        0
                    }
                };
            }
        } else if before.registered > new_capacity {
            tracing::warn!(
                "Event {} is now over capacity ({} registered, capacity {}); no registrations were moved",
                event_id,
                before.registered,
                new_capacity
            );
        }

        Ok(CapacityUpdateResult {
            old_capacity: before.capacity,
            new_capacity,
            promoted_users,
        })
    }

    /// Promote up to `slots` of the earliest waitlisted registrations.
    ///
    /// A candidate that fails to promote is logged and skipped. The pass stops
    /// early once the event has no free seat, so a registrant who claimed a
    /// freed seat first never pushes the event over capacity. Afterwards the
    /// remaining waitlist is renumbered `1..=n` in FIFO order.
    pub async fn promote_waitlist(&self, event_id: &str, slots: usize) -> Result<usize, AppError> {
        if slots == 0 {
            return Ok(0);
        }

        let event = self.load_event(event_id).await?;
        let waitlisted = self.registrations.list_waitlisted(event_id).await?;

        let mut promoted = 0;
        for mut registration in waitlisted {
            if promoted == slots {
                break;
            }

            let promoted_at = Utc::now();
            match self
                .registrations
                .promote(event_id, &registration.registration_id, promoted_at)
                .await
            {
                Ok(PromoteOutcome::Promoted) => {
                    promoted += 1;
                    tracing::info!(
                        "Promoted registration {} on event {} from the waitlist",
                        registration.registration_id,
                        event_id
                    );

                    registration.status = RegistrationStatus::Confirmed;
                    registration.waitlist_position = None;
                    registration.promoted_at = Some(promoted_at);
                    self.notify(NotificationKind::Promotion, &event, &registration)
                        .await;
                }
                Ok(PromoteOutcome::NotWaitlisted) => {
                    tracing::debug!(
                        "Registration {} left the waitlist before promotion",
                        registration.registration_id
                    );
                }
                Ok(PromoteOutcome::NoSeat) => {
                    tracing::info!(
                        "Event {} has no free seat left, stopping promotion after {}",
                        event_id,
                        promoted
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to promote registration {} on event {}: {}",
                        registration.registration_id,
                        event_id,
                        e
                    );
                }
            }
        }

        self.renumber_waitlist(event_id).await;

        Ok(promoted)
    }

    /// Current waitlist for an event, in FIFO order
    pub async fn waitlist(&self, event_id: &str) -> Result<Vec<Registration>, AppError> {
        self.load_event(event_id).await?;
        Ok(self.registrations.list_waitlisted(event_id).await?)
    }

    async fn renumber_waitlist(&self, event_id: &str) {
        let remaining = match self.registrations.list_waitlisted(event_id).await {
            Ok(remaining) => remaining,
            Err(e) => {
                tracing::warn!("Failed to reload waitlist for event {}: {}", event_id, e);
                return;
            }
        };

        for (idx, registration) in remaining.iter().enumerate() {
            let position = idx as i64 + 1;
            if registration.waitlist_position == Some(position) {
                continue;
            }
            if let Err(e) = self
                .registrations
                .set_waitlist_position(&registration.registration_id, position)
                .await
            {
                tracing::warn!(
                    "Failed to set waitlist position {} for registration {}: {}",
                    position,
                    registration.registration_id,
                    e
                );
            }
        }
    }

    async fn notify(&self, kind: NotificationKind, event: &Event, registration: &Registration) {
        let notification =
            Notification::for_registration(kind, event, registration, &self.qr_base_url);
        if let Err(e) = self.notifier.send(&notification).await {
            tracing::warn!(
                "Failed to send {:?} notification for registration {}: {}",
                kind,
                registration.registration_id,
                e
            );
        }
    }
}

fn result(message: &str, event: &Event, registration: Registration) -> RegistrationResult {
    RegistrationResult {
        message: message.to_string(),
        status: registration.status,
        registration_id: registration.registration_id,
        waitlist_position: registration.waitlist_position,
        event_name: event.name.clone(),
        event_date: event.date.clone(),
        event_time: event.time.clone(),
        event_location: event.location.clone(),
        qr_payload: registration.qr_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryStore, NotifyError, StoreError};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                Err(NotifyError::Rejected("relay down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    /// Event store where another registrant grabs a seat right after every
    /// capacity change commits
    struct ContendedEvents {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl EventStore for ContendedEvents {
        async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
            self.inner.get_event(event_id).await
        }

        async fn put_event(&self, event: &Event) -> Result<(), StoreError> {
            self.inner.put_event(event).await
        }

        async fn try_reserve_seat(&self, event_id: &str) -> Result<bool, StoreError> {
            self.inner.try_reserve_seat(event_id).await
        }

        async fn release_seat(&self, event_id: &str) -> Result<(), StoreError> {
            self.inner.release_seat(event_id).await
        }

        async fn set_capacity(
            &self,
            event_id: &str,
            capacity: i64,
        ) -> Result<Option<Event>, StoreError> {
            let before = self.inner.set_capacity(event_id, capacity).await?;
            self.inner.try_reserve_seat(event_id).await?;
            Ok(before)
        }
    }

    /// Registration store that fails chosen writes
    #[derive(Default)]
    struct FaultyRegistrations {
        inner: Arc<MemoryStore>,
        fail_insert: bool,
        fail_promote: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RegistrationStore for FaultyRegistrations {
        async fn insert_registration(&self, registration: &Registration) -> Result<(), StoreError> {
            if self.fail_insert {
                return Err(StoreError::Unavailable("write rejected".to_string()));
            }
            self.inner.insert_registration(registration).await
        }

        async fn enqueue_waitlisted(
            &self,
            registration: Registration,
        ) -> Result<Registration, StoreError> {
            self.inner.enqueue_waitlisted(registration).await
        }

        async fn get_registration(
            &self,
            registration_id: &str,
        ) -> Result<Option<Registration>, StoreError> {
            self.inner.get_registration(registration_id).await
        }

        async fn list_waitlisted(&self, event_id: &str) -> Result<Vec<Registration>, StoreError> {
            self.inner.list_waitlisted(event_id).await
        }

        async fn count_waitlisted(&self, event_id: &str) -> Result<usize, StoreError> {
            self.inner.count_waitlisted(event_id).await
        }

        async fn promote(
            &self,
            event_id: &str,
            registration_id: &str,
            promoted_at: DateTime<Utc>,
        ) -> Result<PromoteOutcome, StoreError> {
            if self
                .fail_promote
                .lock()
                .unwrap()
                .iter()
                .any(|id| id == registration_id)
            {
                return Err(StoreError::Unavailable("promotion write rejected".to_string()));
            }
            self.inner.promote(event_id, registration_id, promoted_at).await
        }

        async fn set_waitlist_position(
            &self,
            registration_id: &str,
            position: i64,
        ) -> Result<(), StoreError> {
            self.inner.set_waitlist_position(registration_id, position).await
        }
    }

    fn registrant(name: &str) -> Registrant {
        Registrant {
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "555-0100".to_string(),
            organization: "Guild".to_string(),
            interest: String::new(),
        }
    }

    async fn controller(
        capacity: i64,
        registered: i64,
        notifier: Arc<RecordingNotifier>,
    ) -> (CapacityController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .put_event(&Event {
                event_id: "evt".to_string(),
                name: "Launch Party".to_string(),
                date: Some("2025-06-01".to_string()),
                time: Some("18:00".to_string()),
                location: Some("Hall A".to_string()),
                category: None,
                capacity,
                registered,
            })
            .await
            .unwrap();
        let controller = CapacityController::new(
            store.clone(),
            store.clone(),
            notifier,
            "https://qr.test/create".to_string(),
        );
        (controller, store)
    }

    #[tokio::test]
    async fn test_confirms_when_seat_free() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, store) = controller(2, 0, notifier.clone()).await;

        let result = controller.register("evt", registrant("Ada")).await.unwrap();

        assert_eq!(result.status, RegistrationStatus::Confirmed);
        assert_eq!(result.waitlist_position, None);
        assert_eq!(result.event_location.as_deref(), Some("Hall A"));
        assert!(result.qr_payload.starts_with("EVENT:evt|REG:"));
        assert!(result.qr_payload.ends_with("|NAME:Ada|EMAIL:ada@example.com"));
        assert_eq!(store.get_event("evt").await.unwrap().unwrap().registered, 1);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::Confirmation);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_registration() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let (controller, store) = controller(1, 0, notifier).await;

        let result = controller.register("evt", registrant("Ada")).await.unwrap();
        assert_eq!(result.status, RegistrationStatus::Confirmed);
        assert!(store
            .get_registration(&result.registration_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_waitlists_when_full() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, store) = controller(1, 1, notifier.clone()).await;

        let first = controller.register("evt", registrant("Bo")).await.unwrap();
        let second = controller.register("evt", registrant("Cy")).await.unwrap();

        assert_eq!(first.status, RegistrationStatus::Waitlist);
        assert_eq!(first.waitlist_position, Some(1));
        assert_eq!(second.waitlist_position, Some(2));
        assert_eq!(store.get_event("evt").await.unwrap().unwrap().registered, 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_runs_before_lookup() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, _) = controller(1, 0, notifier).await;

        let mut missing_phone = registrant("Ada");
        missing_phone.phone.clear();
        assert!(matches!(
            controller.register("nope", missing_phone).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            controller.register("nope", registrant("Ada")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_capacity_increase_promotes_fifo_and_renumbers() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, store) = controller(0, 0, notifier.clone()).await;

        let mut ids = Vec::new();
        for name in ["A", "B", "C", "D"] {
            ids.push(controller.register("evt", registrant(name)).await.unwrap().registration_id);
        }

        let update = controller.update_capacity("evt", 2).await.unwrap();
        assert_eq!(update.old_capacity, 0);
        assert_eq!(update.new_capacity, 2);
        assert_eq!(update.promoted_users, 2);

        let waitlist = controller.waitlist("evt").await.unwrap();
        let remaining: Vec<(&str, Option<i64>)> = waitlist
            .iter()
            .map(|r| (r.registration_id.as_str(), r.waitlist_position))
            .collect();
        assert_eq!(
            remaining,
            vec![(ids[2].as_str(), Some(1)), (ids[3].as_str(), Some(2))]
        );

        let promoted = store.get_registration(&ids[0]).await.unwrap().unwrap();
        assert_eq!(promoted.status, RegistrationStatus::Confirmed);
        assert!(promoted.promoted_at.is_some());
        assert_eq!(store.get_event("evt").await.unwrap().unwrap().registered, 2);

        let kinds: Vec<NotificationKind> =
            notifier.sent.lock().unwrap().iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::Promotion, NotificationKind::Promotion]);
    }

    #[tokio::test]
    async fn test_capacity_decrease_is_a_no_op() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, store) = controller(5, 4, notifier).await;

        let update = controller.update_capacity("evt", 2).await.unwrap();
        assert_eq!(update.promoted_users, 0);

        let event = store.get_event("evt").await.unwrap().unwrap();
        assert_eq!(event.capacity, 2);
        assert_eq!(event.registered, 4);
    }

    #[tokio::test]
    async fn test_seat_taken_during_capacity_change_is_not_oversold() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        store
            .put_event(&Event {
                event_id: "evt".to_string(),
                name: "Launch Party".to_string(),
                date: None,
                time: None,
                location: None,
                category: None,
                capacity: 1,
                registered: 1,
            })
            .await
            .unwrap();

        let controller = CapacityController::new(
            Arc::new(ContendedEvents {
                inner: store.clone(),
            }),
            store.clone(),
            notifier.clone(),
            "https://qr.test/create".to_string(),
        );
        let waiting = controller.register("evt", registrant("Wes")).await.unwrap();
        assert_eq!(waiting.status, RegistrationStatus::Waitlist);

        let update = controller.update_capacity("evt", 2).await.unwrap();
        assert_eq!(update.promoted_users, 0);

        let event = store.get_event("evt").await.unwrap().unwrap();
        assert_eq!(event.capacity, 2);
        assert_eq!(event.registered, 2);

        let still_waiting = store
            .get_registration(&waiting.registration_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(still_waiting.status, RegistrationStatus::Waitlist);
        assert_eq!(still_waiting.waitlist_position, Some(1));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_promotion_continues_past_a_failed_candidate() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_event(&Event {
                event_id: "evt".to_string(),
                name: "Launch Party".to_string(),
                date: None,
                time: None,
                location: None,
                category: None,
                capacity: 0,
                registered: 0,
            })
            .await
            .unwrap();
        let registrations = Arc::new(FaultyRegistrations {
            inner: store.clone(),
            ..Default::default()
        });
        // Every promotion notification fails too
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let controller = CapacityController::new(
            store.clone(),
            registrations.clone(),
            notifier.clone(),
            "https://qr.test/create".to_string(),
        );

        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            ids.push(controller.register("evt", registrant(name)).await.unwrap().registration_id);
        }
        registrations.fail_promote.lock().unwrap().push(ids[0].clone());

        let update = controller.update_capacity("evt", 2).await.unwrap();
        assert_eq!(update.promoted_users, 2);

        for id in &ids[1..] {
            let r = store.get_registration(id).await.unwrap().unwrap();
            assert_eq!(r.status, RegistrationStatus::Confirmed);
        }
        let waitlist = controller.waitlist("evt").await.unwrap();
        assert_eq!(waitlist.len(), 1);
        assert_eq!(waitlist[0].registration_id, ids[0]);
        assert_eq!(waitlist[0].waitlist_position, Some(1));
        assert_eq!(store.get_event("evt").await.unwrap().unwrap().registered, 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_insert_releases_reserved_seat() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_event(&Event {
                event_id: "evt".to_string(),
                name: "Launch Party".to_string(),
                date: None,
                time: None,
                location: None,
                category: None,
                capacity: 1,
                registered: 0,
            })
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = CapacityController::new(
            store.clone(),
            Arc::new(FaultyRegistrations {
                inner: store.clone(),
                fail_insert: true,
                ..Default::default()
            }),
            notifier.clone(),
            "https://qr.test/create".to_string(),
        );

        assert!(matches!(
            controller.register("evt", registrant("Ada")).await,
            Err(AppError::Dependency(_))
        ));
        assert_eq!(store.get_event("evt").await.unwrap().unwrap().registered, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_promote_with_zero_slots_is_a_no_op() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, _) = controller(0, 0, notifier).await;
        controller.register("evt", registrant("A")).await.unwrap();

        assert_eq!(controller.promote_waitlist("evt", 0).await.unwrap(), 0);
        assert_eq!(controller.waitlist("evt").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_capacity_unknown_event() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (controller, _) = controller(1, 0, notifier).await;

        assert!(matches!(
            controller.update_capacity("missing", 3).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            controller.update_capacity("evt", -1).await,
            Err(AppError::Validation(_))
        ));
    }
}
