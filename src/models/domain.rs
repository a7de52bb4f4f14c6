use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Event with its seat counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub capacity: i64,
    /// Confirmed seats. An absent counter reads as zero.
    #[serde(default)]
    pub registered: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlist,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlist => "waitlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(RegistrationStatus::Confirmed),
            "waitlist" => Some(RegistrationStatus::Waitlist),
            _ => None,
        }
    }
}

/// Registrant-supplied contact details
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Registrant {
    #[validate(length(min = 1, message = "fullName is required"))]
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "organization is required"))]
    pub organization: String,
    #[serde(default)]
    pub interest: String,
}

/// Stored registration record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    #[serde(rename = "registrationId")]
    pub registration_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub organization: String,
    #[serde(default)]
    pub interest: String,
    pub status: RegistrationStatus,
    /// FIFO ordering key for the waitlist
    #[serde(rename = "registeredAt")]
    pub registered_at: DateTime<Utc>,
    #[serde(rename = "waitlistPosition", skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<i64>,
    #[serde(rename = "promotedAt", skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
    #[serde(rename = "qrPayload")]
    pub qr_payload: String,
}

impl Registration {
    pub fn is_waitlisted(&self) -> bool {
        self.status == RegistrationStatus::Waitlist
    }

    /// Short reference printed on credentials and emails
    pub fn reference(&self) -> String {
        self.registration_id.chars().take(8).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ExperienceLevel {
    /// Advanced and Expert attendees can act as mentors
    pub fn can_mentor(&self) -> bool {
        matches!(self, ExperienceLevel::Advanced | ExperienceLevel::Expert)
    }

    pub fn can_be_mentored(&self) -> bool {
        matches!(self, ExperienceLevel::Beginner | ExperienceLevel::Intermediate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
            ExperienceLevel::Expert => "Expert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Beginner" => Some(ExperienceLevel::Beginner),
            "Intermediate" => Some(ExperienceLevel::Intermediate),
            "Advanced" => Some(ExperienceLevel::Advanced),
            "Expert" => Some(ExperienceLevel::Expert),
            _ => None,
        }
    }
}

/// Attendee profile used for matchmaking, scoped to one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(rename = "lookingFor", default)]
    pub looking_for: BTreeSet<String>,
    #[serde(rename = "experienceLevel")]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub goals: BTreeSet<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl MatchingProfile {
    pub fn is_looking_for(&self, what: &str) -> bool {
        self.looking_for.contains(what)
    }
}

/// Per-factor contributions to a compatibility score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub interests: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentorship: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<i64>,
    pub goals: i64,
    #[serde(rename = "lookingFor", skip_serializing_if = "Option::is_none")]
    pub looking_for: Option<i64>,
    #[serde(rename = "sameOrg", skip_serializing_if = "Option::is_none")]
    pub same_org: Option<i64>,
}

impl ScoreBreakdown {
    /// Raw sum of every component, before clamping
    pub fn sum(&self) -> i64 {
        self.interests
            + self.mentorship.unwrap_or(0)
            + self.skills.unwrap_or(0)
            + self.goals
            + self.looking_for.unwrap_or(0)
            + self.same_org.unwrap_or(0)
    }
}

/// Ranked match returned to the subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredMatch {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub organization: String,
    #[serde(rename = "experienceLevel")]
    pub experience_level: ExperienceLevel,
    pub skills: BTreeSet<String>,
    #[serde(rename = "lookingFor")]
    pub looking_for: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: i64,
    pub breakdown: ScoreBreakdown,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
    pub icebreaker: String,
}

/// Point values for the compatibility factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityWeights {
    pub interest_points: i64,
    pub interest_cap: i64,
    pub mentor_bonus: i64,
    pub mentee_bonus: i64,
    pub complementary_skills_bonus: i64,
    /// Overlap must stay strictly below this to count as complementary
    pub complementary_skills_limit: usize,
    pub goal_points: i64,
    pub goal_cap: i64,
    pub cofounder_bonus: i64,
    pub team_member_bonus: i64,
    pub same_org_penalty: i64,
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            interest_points: 10,
            interest_cap: 30,
            mentor_bonus: 25,
            mentee_bonus: 20,
            complementary_skills_bonus: 15,
            complementary_skills_limit: 3,
            goal_points: 8,
            goal_cap: 25,
            cofounder_bonus: 15,
            team_member_bonus: 12,
            same_org_penalty: 10,
        }
    }
}
