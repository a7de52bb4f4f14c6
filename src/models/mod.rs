// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CompatibilityWeights, Event, ExperienceLevel, MatchingProfile, Registrant, Registration,
    RegistrationStatus, ScoreBreakdown, ScoredMatch,
};
pub use requests::{MatchesQuery, RegisterRequest, SubmitProfileRequest, UpdateCapacityRequest};
pub use responses::{
    CapacityUpdateResult, ErrorResponse, HealthResponse, MatchesResponse, RegistrationResult,
    SubmitProfileResponse, WaitlistEntry, WaitlistResponse,
};
