use crate::models::{CompatibilityWeights, MatchingProfile, ScoreBreakdown};

/// Result of scoring one candidate against a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityScore {
    /// Sum of all factors, floored at zero
    pub total: i64,
    pub breakdown: ScoreBreakdown,
    /// One entry per triggered factor, in evaluation order
    pub reasons: Vec<String>,
}

pub const LOOKING_FOR_MENTORS: &str = "Mentors";
pub const LOOKING_FOR_MENTEES: &str = "Mentees";
pub const LOOKING_FOR_COFOUNDERS: &str = "Co-founders";
pub const LOOKING_FOR_TEAM_MEMBERS: &str = "Team Members";

/// Score how well `candidate` fits what `subject` is looking for.
///
/// Directional: mentor/mentee bonuses depend on the subject's `lookingFor` and
/// the candidate's experience, so `score(a, b)` and `score(b, a)` can differ.
/// Factors, in order:
/// 1. Shared interests: `interest_points` each, capped at `interest_cap`
/// 2. Mentor match: subject wants mentors, candidate is Advanced/Expert
/// 3. Mentee match: subject wants mentees, candidate is Beginner/Intermediate
/// 4. Complementary skills: some but fewer than `complementary_skills_limit` shared
/// 5. Shared goals: `goal_points` each, capped at `goal_cap`
/// 6. Both want co-founders, or else both want team members
/// 7. Same organization (case-insensitive): penalty
pub fn calculate_compatibility(
    subject: &MatchingProfile,
    candidate: &MatchingProfile,
    weights: &CompatibilityWeights,
) -> CompatibilityScore {
    let mut breakdown = ScoreBreakdown::default();
    let mut reasons = Vec::new();

    // Sets are ordered, so reason text is independent of submission order
    let shared_interests: Vec<&String> =
        subject.interests.intersection(&candidate.interests).collect();
    breakdown.interests =
        (weights.interest_points * shared_interests.len() as i64).min(weights.interest_cap);
    if !shared_interests.is_empty() {
        let listed: Vec<&str> = shared_interests.iter().take(2).map(|s| s.as_str()).collect();
        reasons.push(format!("Both interested in: {}", listed.join(", ")));
    }

    let mut mentorship = 0;
    if subject.is_looking_for(LOOKING_FOR_MENTORS) && candidate.experience_level.can_mentor() {
        mentorship += weights.mentor_bonus;
        reasons.push(format!("{} can mentor you", candidate.name));
    }
    if subject.is_looking_for(LOOKING_FOR_MENTEES) && candidate.experience_level.can_be_mentored()
    {
        mentorship += weights.mentee_bonus;
        reasons.push(format!("You can mentor {}", candidate.name));
    }
    if mentorship > 0 {
        breakdown.mentorship = Some(mentorship);
    }

    let skill_overlap = subject.skills.intersection(&candidate.skills).count();
    if skill_overlap > 0 && skill_overlap < weights.complementary_skills_limit {
        breakdown.skills = Some(weights.complementary_skills_bonus);
        reasons.push("Complementary skills for collaboration".to_string());
    }

    let mut shared_goals = subject.goals.intersection(&candidate.goals).peekable();
    let first_goal = shared_goals.peek().map(|g| g.to_string());
    let goal_count = shared_goals.count() as i64;
    breakdown.goals = (weights.goal_points * goal_count).min(weights.goal_cap);
    if let Some(goal) = first_goal {
        reasons.push(format!("Similar goals: {}", goal));
    }

    let both_want = |what: &str| subject.is_looking_for(what) && candidate.is_looking_for(what);
    if both_want(LOOKING_FOR_COFOUNDERS) {
        breakdown.looking_for = Some(weights.cofounder_bonus);
        reasons.push("Both looking for co-founders!".to_string());
    } else if both_want(LOOKING_FOR_TEAM_MEMBERS) {
        breakdown.looking_for = Some(weights.team_member_bonus);
        reasons.push("Both looking for team members".to_string());
    }

    if same_organization(&subject.organization, &candidate.organization) {
        breakdown.same_org = Some(-weights.same_org_penalty);
    }

    CompatibilityScore {
        total: breakdown.sum().max(0),
        breakdown,
        reasons,
    }
}

/// Case-insensitive; two profiles without an organization also match
fn same_organization(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExperienceLevel;
    use chrono::Utc;

    fn profile(
        name: &str,
        organization: &str,
        level: ExperienceLevel,
        looking_for: &[&str],
        interests: &[&str],
    ) -> MatchingProfile {
        MatchingProfile {
            user_id: name.to_lowercase(),
            event_id: "evt".to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            organization: organization.to_string(),
            skills: Default::default(),
            looking_for: looking_for.iter().map(|s| s.to_string()).collect(),
            experience_level: level,
            goals: Default::default(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_interest_points_are_capped() {
        let weights = CompatibilityWeights::default();
        let a = profile("A", "X", ExperienceLevel::Beginner, &[], &["ai", "web", "iot", "games"]);
        let b = profile("B", "Y", ExperienceLevel::Beginner, &[], &["ai", "web", "iot", "games"]);

        let score = calculate_compatibility(&a, &b, &weights);
        assert_eq!(score.breakdown.interests, 30);
        assert_eq!(score.total, 30);
        assert_eq!(score.reasons, vec!["Both interested in: ai, games"]);
    }

    #[test]
    fn test_mentor_and_mentee_are_directional() {
        let weights = CompatibilityWeights::default();
        let junior = profile("Junior", "X", ExperienceLevel::Beginner, &["Mentors"], &[]);
        let senior = profile("Senior", "Y", ExperienceLevel::Expert, &["Mentees"], &[]);

        let junior_view = calculate_compatibility(&junior, &senior, &weights);
        assert_eq!(junior_view.total, 25);
        assert_eq!(junior_view.reasons, vec!["Senior can mentor you"]);

        let senior_view = calculate_compatibility(&senior, &junior, &weights);
        assert_eq!(senior_view.total, 20);
        assert_eq!(senior_view.reasons, vec!["You can mentor Junior"]);
    }

    #[test]
    fn test_mentorship_follows_candidate_level() {
        let weights = CompatibilityWeights::default();
        let subject = profile("S", "X", ExperienceLevel::Expert, &["Mentors", "Mentees"], &[]);
        let advanced = profile("Adv", "Y", ExperienceLevel::Advanced, &[], &[]);
        let beginner = profile("Beg", "Y", ExperienceLevel::Beginner, &[], &[]);

        assert_eq!(calculate_compatibility(&subject, &advanced, &weights).total, 25);
        assert_eq!(calculate_compatibility(&subject, &beginner, &weights).total, 20);
    }

    #[test]
    fn test_complementary_skills_window() {
        let weights = CompatibilityWeights::default();
        let mut a = profile("A", "X", ExperienceLevel::Advanced, &[], &[]);
        let mut b = profile("B", "Y", ExperienceLevel::Advanced, &[], &[]);

        a.skills = ["rust", "go", "sql"].iter().map(|s| s.to_string()).collect();
        b.skills = ["rust", "python"].iter().map(|s| s.to_string()).collect();
        assert_eq!(calculate_compatibility(&a, &b, &weights).breakdown.skills, Some(15));

        b.skills = ["rust", "go", "sql"].iter().map(|s| s.to_string()).collect();
        assert_eq!(calculate_compatibility(&a, &b, &weights).breakdown.skills, None);
    }

    #[test]
    fn test_goals_capped_and_first_goal_reported() {
        let weights = CompatibilityWeights::default();
        let mut a = profile("A", "X", ExperienceLevel::Advanced, &[], &[]);
        let mut b = profile("B", "Y", ExperienceLevel::Advanced, &[], &[]);
        let goals: std::collections::BTreeSet<String> =
            ["hire", "learn", "pitch", "ship"].iter().map(|s| s.to_string()).collect();
        a.goals = goals.clone();
        b.goals = goals;

        let score = calculate_compatibility(&a, &b, &weights);
        assert_eq!(score.breakdown.goals, 25);
        assert_eq!(score.reasons, vec!["Similar goals: hire"]);
    }

    #[test]
    fn test_cofounder_wins_over_team_members() {
        let weights = CompatibilityWeights::default();
        let a = profile("A", "X", ExperienceLevel::Advanced, &["Co-founders", "Team Members"], &[]);
        let b = profile("B", "Y", ExperienceLevel::Advanced, &["Co-founders", "Team Members"], &[]);

        let score = calculate_compatibility(&a, &b, &weights);
        assert_eq!(score.breakdown.looking_for, Some(15));
        assert_eq!(score.reasons, vec!["Both looking for co-founders!"]);

        let c = profile("C", "Y", ExperienceLevel::Advanced, &["Team Members"], &[]);
        let score = calculate_compatibility(&a, &c, &weights);
        assert_eq!(score.breakdown.looking_for, Some(12));
    }

    #[test]
    fn test_same_org_penalty_floors_at_zero() {
        let weights = CompatibilityWeights::default();
        let a = profile("A", "Acme", ExperienceLevel::Beginner, &[], &[]);
        let b = profile("B", "ACME ", ExperienceLevel::Beginner, &[], &[]);

        let score = calculate_compatibility(&a, &b, &weights);
        assert_eq!(score.breakdown.same_org, Some(-10));
        assert_eq!(score.total, 0);
        assert!(score.reasons.is_empty());
    }

    #[test]
    fn test_blank_organizations_are_penalized() {
        let weights = CompatibilityWeights::default();
        let a = profile("A", "", ExperienceLevel::Beginner, &[], &["ai", "iot"]);
        let b = profile("B", "", ExperienceLevel::Beginner, &[], &["ai", "iot"]);

        let score = calculate_compatibility(&a, &b, &weights);
        assert_eq!(score.breakdown.same_org, Some(-10));
        assert_eq!(score.total, 10);
    }

    #[test]
    fn test_organization_match_is_not_trimmed() {
        let weights = CompatibilityWeights::default();
        let a = profile("A", "Acme", ExperienceLevel::Beginner, &[], &[]);
        let b = profile("B", " acme ", ExperienceLevel::Beginner, &[], &[]);

        assert_eq!(calculate_compatibility(&a, &b, &weights).breakdown.same_org, None);
    }
}
