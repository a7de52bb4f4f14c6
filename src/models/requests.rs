use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{ExperienceLevel, Registrant};

/// Request to register for an event (event id comes from the path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub interest: String,
}

impl From<RegisterRequest> for Registrant {
    fn from(req: RegisterRequest) -> Self {
        Registrant {
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            organization: req.organization,
            interest: req.interest,
        }
    }
}

/// Request to change an event's capacity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCapacityRequest {
    #[validate(range(min = 0, message = "newCapacity must be non-negative"))]
    #[serde(rename = "newCapacity")]
    pub new_capacity: i64,
}

/// Request to submit or overwrite a matchmaking profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitProfileRequest {
    #[validate(length(min = 1, message = "eventId is required"))]
    #[serde(rename = "eventId", default)]
    pub event_id: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[validate(length(min = 1, message = "name is required"))]
    #[serde(default)]
    pub name: String,
    #[validate(length(min = 1, message = "email is required"))]
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[validate(length(min = 1, message = "at least one skill is required"))]
    #[serde(default)]
    pub skills: Vec<String>,
    #[validate(length(min = 1, message = "lookingFor must not be empty"))]
    #[serde(rename = "lookingFor", default)]
    pub looking_for: Vec<String>,
    #[validate(required(message = "experienceLevel is required"))]
    #[serde(rename = "experienceLevel", default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Query parameters for fetching matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchesQuery {
    #[validate(length(min = 1, message = "userId is required"))]
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[validate(length(min = 1, message = "eventId is required"))]
    #[serde(rename = "eventId", default)]
    pub event_id: String,
}
