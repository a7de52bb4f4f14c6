// Core algorithm exports
pub mod capacity;
pub mod compatibility;
pub mod credential;
pub mod matcher;
pub mod matchmaking;

pub use capacity::CapacityController;
pub use compatibility::{calculate_compatibility, CompatibilityScore};
pub use credential::qr_payload;
pub use matcher::{icebreaker, MatchResult, Matcher};
pub use matchmaking::MatchmakingService;
