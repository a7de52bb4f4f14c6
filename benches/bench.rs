// Criterion benchmarks for EventHub matchmaking

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eventhub::core::{calculate_compatibility, Matcher};
use eventhub::models::{CompatibilityWeights, ExperienceLevel, MatchingProfile};

const INTERESTS: [&str; 8] = ["ai", "web", "iot", "fintech", "health", "climate", "games", "security"];
const SKILLS: [&str; 6] = ["rust", "go", "design", "marketing", "sales", "ml"];
const GOALS: [&str; 4] = ["launch", "hire", "learn", "fundraise"];
const LOOKING_FOR: [&str; 5] = ["Mentors", "Mentees", "Co-founders", "Team Members", "Networking"];

fn pick(items: &[&str], seed: usize, count: usize) -> std::collections::BTreeSet<String> {
    (0..count)
        .map(|k| items[(seed * 7 + k * 3) % items.len()].to_string())
        .collect()
}

fn create_profile(id: usize) -> MatchingProfile {
    let level = match id % 4 {
        0 => ExperienceLevel::Beginner,
        1 => ExperienceLevel::Intermediate,
        2 => ExperienceLevel::Advanced,
        _ => ExperienceLevel::Expert,
    };

    MatchingProfile {
        user_id: id.to_string(),
        event_id: "bench-event".to_string(),
        name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        organization: format!("Org {}", id % 20),
        skills: pick(&SKILLS, id, 2),
        looking_for: pick(&LOOKING_FOR, id, 2),
        experience_level: level,
        goals: pick(&GOALS, id, 2),
        interests: pick(&INTERESTS, id, 4),
        created_at: Utc::now(),
    }
}

fn bench_compatibility(c: &mut Criterion) {
    let weights = CompatibilityWeights::default();
    let subject = create_profile(1);
    let candidate = create_profile(2);

    c.bench_function("calculate_compatibility", |b| {
        b.iter(|| calculate_compatibility(black_box(&subject), black_box(&candidate), &weights));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = Matcher::with_default_weights();
    let subject = create_profile(0);

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates: Vec<MatchingProfile> = (1..=*candidate_count).map(create_profile).collect();

        group.bench_with_input(
            BenchmarkId::new("rank_matches", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| matcher.rank_matches(black_box(&subject), black_box(candidates.clone())));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compatibility, bench_ranking);

criterion_main!(benches);
