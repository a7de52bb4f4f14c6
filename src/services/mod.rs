// Service exports
pub mod cache;
pub mod memory;
pub mod notifier;
pub mod postgres;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use memory::MemoryStore;
pub use notifier::{HttpNotifier, LogNotifier, Notification, NotificationKind, Notifier, NotifyError};
pub use postgres::PostgresStore;
pub use store::{EventStore, ProfileStore, PromoteOutcome, RegistrationStore, StoreError};
