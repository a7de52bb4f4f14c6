use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::matcher::Matcher;
use crate::error::AppError;
use crate::models::{MatchingProfile, ScoredMatch, SubmitProfileRequest, SubmitProfileResponse};
use crate::services::{CacheManager, ProfileStore};

/// Stores attendee profiles and serves ranked matches for them
#[derive(Clone)]
pub struct MatchmakingService {
    profiles: Arc<dyn ProfileStore>,
    matcher: Matcher,
    cache: Option<Arc<CacheManager>>,
}

impl MatchmakingService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matcher: Matcher,
        cache: Option<Arc<CacheManager>>,
    ) -> Self {
        Self {
            profiles,
            matcher,
            cache,
        }
    }

    /// Save (or overwrite) a profile and return its matches at the event
    pub async fn submit_profile(
        &self,
        req: SubmitProfileRequest,
    ) -> Result<SubmitProfileResponse, AppError> {
        req.validate()?;
        let experience_level = req
            .experience_level
            .ok_or_else(|| AppError::Validation("experienceLevel is required".to_string()))?;

        let user_id = req
            .user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let profile = MatchingProfile {
            user_id,
            event_id: req.event_id,
            name: req.name,
            email: req.email,
            organization: req.organization.unwrap_or_default(),
            skills: req.skills.into_iter().collect(),
            looking_for: req.looking_for.into_iter().collect(),
            experience_level,
            goals: req.goals.into_iter().collect(),
            interests: req.interests.into_iter().collect(),
            created_at: Utc::now(),
        };

        self.profiles.upsert_profile(&profile).await?;
        tracing::info!(
            "Saved matching profile {} for event {}",
            profile.user_id,
            profile.event_id
        );

        let matches = self.find_matches(&profile).await?;

        // Every cached list at this event may now be missing this attendee.
        // Dropping them after ranking also discards any list another
        // submission cached while this one was being ranked.
        self.invalidate_event(&profile.event_id).await;
        self.cache_matches(&profile, &matches).await;

        Ok(SubmitProfileResponse {
            message: "Profile saved successfully".to_string(),
            user_id: profile.user_id,
            matches,
        })
    }

    /// Ranked matches for an existing profile
    pub async fn get_matches(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Vec<ScoredMatch>, AppError> {
        if user_id.is_empty() || event_id.is_empty() {
            return Err(AppError::Validation(
                "userId and eventId required".to_string(),
            ));
        }

        if let Some(cache) = &self.cache {
            match cache.get_matches(event_id, user_id).await {
                Ok(Some(matches)) => {
                    tracing::debug!("Serving cached matches for {} at {}", user_id, event_id);
                    return Ok(matches);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Cache read failed, recomputing matches: {}", e),
            }
        }

        let profile = self
            .profiles
            .get_profile(user_id, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let matches = self.find_matches(&profile).await?;
        self.cache_matches(&profile, &matches).await;

        Ok(matches)
    }

    async fn find_matches(&self, subject: &MatchingProfile) -> Result<Vec<ScoredMatch>, AppError> {
        let pool = self.profiles.profiles_for_event(&subject.event_id).await?;
        let result = self.matcher.rank_matches(subject, pool);

        tracing::info!(
            "Returning {} matches for {} (from {} profiles)",
            result.matches.len(),
            subject.user_id,
            result.total_candidates
        );

        Ok(result.matches)
    }

    async fn cache_matches(&self, subject: &MatchingProfile, matches: &[ScoredMatch]) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache
                .put_matches(&subject.event_id, &subject.user_id, matches)
                .await
            {
                tracing::warn!("Failed to cache matches: {}", e);
            }
        }
    }

    async fn invalidate_event(&self, event_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_event(event_id).await {
                tracing::warn!("Failed to invalidate cache: {}", e);
            }
        }
    }
}
