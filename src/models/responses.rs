use serde::{Deserialize, Serialize};

use crate::models::domain::{Registration, RegistrationStatus, ScoredMatch};

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub message: String,
    pub status: RegistrationStatus,
    #[serde(rename = "registrationId")]
    pub registration_id: String,
    #[serde(rename = "waitlistPosition", skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i64>,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventDate", skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(rename = "eventTime", skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    #[serde(rename = "eventLocation", skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    #[serde(rename = "qrPayload")]
    pub qr_payload: String,
}

/// Outcome of a capacity change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityUpdateResult {
    #[serde(rename = "oldCapacity")]
    pub old_capacity: i64,
    #[serde(rename = "newCapacity")]
    pub new_capacity: i64,
    #[serde(rename = "promotedUsers")]
    pub promoted_users: usize,
}

/// Waitlist entry exposed to organizers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    #[serde(rename = "registrationId")]
    pub registration_id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "waitlistPosition")]
    pub waitlist_position: Option<i64>,
    #[serde(rename = "registeredAt")]
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

impl From<Registration> for WaitlistEntry {
    fn from(r: Registration) -> Self {
        Self {
            registration_id: r.registration_id,
            full_name: r.full_name,
            email: r.email,
            waitlist_position: r.waitlist_position,
            registered_at: r.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistResponse {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub waitlist: Vec<WaitlistEntry>,
    pub count: usize,
}

/// Response for profile submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProfileResponse {
    pub message: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub matches: Vec<ScoredMatch>,
}

/// Response for match lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<ScoredMatch>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
