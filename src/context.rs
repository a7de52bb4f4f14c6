use std::sync::Arc;

use crate::core::{CapacityController, Matcher, MatchmakingService};
use crate::services::{CacheManager, EventStore, Notifier, ProfileStore, RegistrationStore};

/// Everything a request handler needs, built once at startup and shared by
/// every worker until shutdown.
#[derive(Clone)]
pub struct AppContext {
    pub capacity: CapacityController,
    pub matchmaking: MatchmakingService,
    pub events: Arc<dyn EventStore>,
}

impl AppContext {
    pub fn new<S>(
        store: Arc<S>,
        notifier: Arc<dyn Notifier>,
        matcher: Matcher,
        cache: Option<Arc<CacheManager>>,
        qr_base_url: String,
    ) -> Self
    where
        S: EventStore + RegistrationStore + ProfileStore + 'static,
    {
        let events: Arc<dyn EventStore> = store.clone();
        let registrations: Arc<dyn RegistrationStore> = store.clone();
        let profiles: Arc<dyn ProfileStore> = store;

        Self {
            capacity: CapacityController::new(
                events.clone(),
                registrations,
                notifier,
                qr_base_url,
            ),
            matchmaking: MatchmakingService::new(profiles, matcher, cache),
            events,
        }
    }
}
