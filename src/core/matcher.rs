use crate::core::compatibility::{calculate_compatibility, CompatibilityScore};
use crate::models::{CompatibilityWeights, MatchingProfile, ScoredMatch};

/// Result of ranking a candidate pool
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredMatch>,
    pub total_candidates: usize,
}

/// Ranks attendees at the same event by compatibility with a subject
///
/// # Pipeline Stages
/// 1. Drop the subject's own profile
/// 2. Score every remaining candidate
/// 3. Keep candidates scoring above `min_score`
/// 4. Sort by score descending and keep the top `max_results`
#[derive(Debug, Clone)]
pub struct Matcher {
    weights: CompatibilityWeights,
    min_score: i64,
    max_results: usize,
}

pub const DEFAULT_MIN_SCORE: i64 = 20;
pub const DEFAULT_MAX_RESULTS: usize = 10;

impl Matcher {
    pub fn new(weights: CompatibilityWeights, min_score: i64, max_results: usize) -> Self {
        Self {
            weights,
            min_score,
            max_results,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(
            CompatibilityWeights::default(),
            DEFAULT_MIN_SCORE,
            DEFAULT_MAX_RESULTS,
        )
    }

    pub fn score(&self, subject: &MatchingProfile, candidate: &MatchingProfile) -> CompatibilityScore {
        calculate_compatibility(subject, candidate, &self.weights)
    }

    /// Rank `candidates` for `subject`.
    ///
    /// Equal scores keep the pool's iteration order; the sort is stable and
    /// there is no secondary key.
    pub fn rank_matches(
        &self,
        subject: &MatchingProfile,
        candidates: Vec<MatchingProfile>,
    ) -> MatchResult {
        let total_candidates = candidates.len();

        let mut scored_matches: Vec<ScoredMatch> = candidates
            .into_iter()
            .filter(|candidate| candidate.user_id != subject.user_id)
            .filter_map(|candidate| {
                let score = self.score(subject, &candidate);
                if score.total > self.min_score {
                    Some(into_scored_match(candidate, score))
                } else {
                    None
                }
            })
            .collect();

        // sort_by is stable
        scored_matches.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
        scored_matches.truncate(self.max_results);

        MatchResult {
            matches: scored_matches,
            total_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Conversation starter built from the strongest reason
pub fn icebreaker(reasons: &[String]) -> String {
    match reasons.first() {
        Some(reason) => format!("💡 Start with: \"{}\"", reason),
        None => "Ask about their experience at previous events!".to_string(),
    }
}

fn into_scored_match(candidate: MatchingProfile, score: CompatibilityScore) -> ScoredMatch {
    ScoredMatch {
        icebreaker: icebreaker(&score.reasons),
        user_id: candidate.user_id,
        name: candidate.name,
        organization: candidate.organization,
        experience_level: candidate.experience_level,
        skills: candidate.skills,
        looking_for: candidate.looking_for,
        interests: candidate.interests,
        compatibility_score: score.total,
        breakdown: score.breakdown,
        match_reasons: score.reasons,
    }
}
