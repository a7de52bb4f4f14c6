//! EventHub - event registration with a capacity-controlled waitlist and
//! attendee matchmaking.
//!
//! The registration side confirms attendees while seats remain, queues the
//! rest on a FIFO waitlist and promotes from it when capacity grows. The
//! matchmaking side scores attendee profiles at the same event against each
//! other and returns ranked matches with reasons and an icebreaker.

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use context::AppContext;
pub use core::{calculate_compatibility, CapacityController, Matcher, MatchmakingService};
pub use error::AppError;
pub use models::{
    CompatibilityWeights, Event, ExperienceLevel, MatchingProfile, Registrant, Registration,
    RegistrationStatus, ScoredMatch,
};
pub use services::{MemoryStore, PostgresStore};
