//! Algorithmic pre-filter — deterministic heuristic scorer used as the
//! admission-control gate in front of the inference tiers.
//!
//! Pure and total: the function never fails. Each component only counts
//! when both sides carry the data it compares, and the final score is
//! renormalized over the components that did — a skills-only pairing is
//! judged on its skills, not penalized for fields nobody filled in.
//! Postings below the configured threshold are marked Skipped and never
//! reach the orchestrator.

use crate::models::posting::JobPosting;
use crate::models::profile::CandidateProfile;

// Relative component weights. The score is renormalized over the components
// with data, so only their ratios matter.
const SKILL_WEIGHT: f64 = 50.0;
const LOCATION_WEIGHT: f64 = 20.0;
const SALARY_WEIGHT: f64 = 15.0;
const EXPERIENCE_WEIGHT: f64 = 15.0;

/// Default minimum score required before a posting is escalated to inference.
pub const DEFAULT_THRESHOLD: u8 = 70;

/// Scores a (profile, posting) pair on 0–100 from deterministic rules:
/// skill-overlap ratio, location match, salary-range overlap, and
/// experience-level distance. Components without data on both sides are
/// excluded and the rest renormalized; a pair with no data at all scores 0.
pub fn score(profile: &CandidateProfile, posting: &JobPosting) -> u8 {
    let components = [
        (SKILL_WEIGHT, skill_overlap(profile, posting)),
        (LOCATION_WEIGHT, location_match(profile, posting)),
        (SALARY_WEIGHT, salary_overlap(profile, posting)),
        (EXPERIENCE_WEIGHT, experience_proximity(profile, posting)),
    ];

    let mut weighted = 0.0;
    let mut weight_with_data = 0.0;
    for (weight, value) in components {
        if let Some(value) = value {
            weighted += weight * value;
            weight_with_data += weight;
        }
    }
    if weight_with_data == 0.0 {
        return 0;
    }
    (weighted / weight_with_data * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Fraction of the posting's required skills the candidate covers, or None
/// when the posting requires none.
fn skill_overlap(profile: &CandidateProfile, posting: &JobPosting) -> Option<f64> {
    if posting.required_skills.is_empty() {
        return None;
    }
    let candidate: Vec<String> = profile.skills.iter().map(|s| normalize(s)).collect();
    let covered = posting
        .required_skills
        .iter()
        .filter(|req| candidate.contains(&normalize(req)))
        .count();
    Some(covered as f64 / posting.required_skills.len() as f64)
}

/// 1.0 for remote postings or an exact location match, 0.5 when one side
/// contains the other (city vs "city, country"), else 0.0. None when either
/// side omits a location.
fn location_match(profile: &CandidateProfile, posting: &JobPosting) -> Option<f64> {
    let (Some(candidate), Some(target)) = (&profile.location, &posting.location) else {
        return None;
    };
    let candidate = normalize(candidate);
    let target = normalize(target);
    if target.contains("remote") || candidate == target {
        Some(1.0)
    } else if candidate.contains(&target) || target.contains(&candidate) {
        Some(0.5)
    } else {
        Some(0.0)
    }
}

fn salary_overlap(profile: &CandidateProfile, posting: &JobPosting) -> Option<f64> {
    match (&profile.desired_salary, &posting.salary) {
        (Some(desired), Some(offered)) => Some(desired.overlap_ratio(offered)),
        _ => None,
    }
}

/// Full credit at equal seniority, decaying linearly to zero at a distance
/// of three rungs on the ladder. None when either side's level is absent or
/// off-ladder.
fn experience_proximity(profile: &CandidateProfile, posting: &JobPosting) -> Option<f64> {
    let (Some(candidate), Some(target)) = (
        profile.experience_level.as_deref().and_then(level_rank),
        posting.experience_level.as_deref().and_then(level_rank),
    ) else {
        return None;
    };
    let distance = candidate.abs_diff(target).min(3);
    Some(1.0 - distance as f64 / 3.0)
}

fn level_rank(level: &str) -> Option<u8> {
    match normalize(level).as_str() {
        "intern" | "internship" => Some(0),
        "entry" | "junior" => Some(1),
        "mid" | "mid-level" | "intermediate" => Some(2),
        "senior" => Some(3),
        "staff" | "lead" => Some(4),
        "principal" => Some(5),
        "director" | "executive" => Some(6),
        _ => None,
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::profile::SalaryRange;

    fn profile_with_skills(skills: &[&str]) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            version: 1,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            work_history: vec![],
            education: vec![],
            location: None,
            desired_salary: None,
            experience_level: None,
        }
    }

    fn posting_with_skills(skills: &[&str]) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            description: String::new(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            location: None,
            salary: None,
            experience_level: None,
            source: None,
        }
    }

    #[test]
    fn test_disjoint_skills_score_below_threshold() {
        // Candidate {Python, Django} vs posting {JavaScript, React}:
        // no overlap, nothing else known — must stay below the gate.
        let profile = profile_with_skills(&["Python", "Django"]);
        let posting = posting_with_skills(&["JavaScript", "React"]);
        assert!(score(&profile, &posting) < DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_high_skill_overlap_alone_clears_threshold() {
        // 8/10 skill overlap with nothing else known: the score is judged
        // on skills alone (80), not dragged under the gate by absent fields.
        let required: Vec<String> = (0..10).map(|i| format!("skill-{i}")).collect();
        let profile = profile_with_skills(
            &required[..8]
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        );
        let posting =
            posting_with_skills(&required.iter().map(String::as_str).collect::<Vec<_>>());

        assert_eq!(score(&profile, &posting), 80);
        assert!(score(&profile, &posting) >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_high_overlap_with_matching_context_clears_threshold() {
        // 8/10 skill overlap plus matching location/salary/level → ≥ 70.
        let required: Vec<String> = (0..10).map(|i| format!("skill-{i}")).collect();
        let mut profile = profile_with_skills(
            &required[..8]
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        );
        profile.location = Some("Berlin".to_string());
        profile.desired_salary = Some(SalaryRange {
            min: 80_000,
            max: 100_000,
        });
        profile.experience_level = Some("senior".to_string());

        let mut posting =
            posting_with_skills(&required.iter().map(String::as_str).collect::<Vec<_>>());
        posting.location = Some("Berlin".to_string());
        posting.salary = Some(SalaryRange {
            min: 75_000,
            max: 110_000,
        });
        posting.experience_level = Some("senior".to_string());

        assert!(score(&profile, &posting) >= DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let mut profile = profile_with_skills(&["Rust", "Tokio"]);
        profile.location = Some("Remote".to_string());
        profile.desired_salary = Some(SalaryRange {
            min: 90_000,
            max: 110_000,
        });
        profile.experience_level = Some("senior".to_string());

        let mut posting = posting_with_skills(&["Rust", "Tokio"]);
        posting.location = Some("Remote (EU)".to_string());
        posting.salary = Some(SalaryRange {
            min: 80_000,
            max: 120_000,
        });
        posting.experience_level = Some("senior".to_string());

        assert_eq!(score(&profile, &posting), 100);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let profile = profile_with_skills(&[]);
        let posting = posting_with_skills(&[]);
        assert_eq!(score(&profile, &posting), 0);
    }

    #[test]
    fn test_skill_matching_is_case_insensitive() {
        let profile = profile_with_skills(&["rust", "PYTHON"]);
        let posting = posting_with_skills(&["Rust", "Python"]);
        assert_eq!(score(&profile, &posting), 100);
    }

    #[test]
    fn test_remote_posting_gets_full_location_credit() {
        // Location is the only component with data, so it carries the score.
        let mut profile = profile_with_skills(&[]);
        profile.location = Some("Osaka".to_string());
        let mut posting = posting_with_skills(&[]);
        posting.location = Some("Remote".to_string());
        assert_eq!(score(&profile, &posting), 100);
    }

    #[test]
    fn test_partial_location_containment_gets_half_credit() {
        let mut profile = profile_with_skills(&[]);
        profile.location = Some("Tokyo".to_string());
        let mut posting = posting_with_skills(&[]);
        posting.location = Some("Tokyo, Japan".to_string());
        assert_eq!(score(&profile, &posting), 50);
    }

    #[test]
    fn test_experience_distance_decays() {
        let mut profile = profile_with_skills(&[]);
        profile.experience_level = Some("junior".to_string());
        let mut posting = posting_with_skills(&[]);
        posting.experience_level = Some("mid".to_string());
        // distance 1 of 3 → 2/3 credit
        assert_eq!(score(&profile, &posting), 67);

        posting.experience_level = Some("principal".to_string());
        // distance ≥ 3 → zero
        assert_eq!(score(&profile, &posting), 0);
    }

    #[test]
    fn test_absent_fields_do_not_dilute_present_ones() {
        // Full skill match with no location/salary/level on either side
        // must not score lower than the same match with full context.
        let sparse_profile = profile_with_skills(&["Rust", "Tokio"]);
        let sparse_posting = posting_with_skills(&["Rust", "Tokio"]);
        assert_eq!(score(&sparse_profile, &sparse_posting), 100);
    }

    #[test]
    fn test_unknown_experience_level_contributes_zero() {
        let mut profile = profile_with_skills(&[]);
        profile.experience_level = Some("wizard".to_string());
        let mut posting = posting_with_skills(&[]);
        posting.experience_level = Some("senior".to_string());
        assert_eq!(score(&profile, &posting), 0);
    }

    #[test]
    fn test_score_is_deterministic() {
        let profile = profile_with_skills(&["Rust", "SQL"]);
        let posting = posting_with_skills(&["Rust", "SQL", "Go"]);
        assert_eq!(score(&profile, &posting), score(&profile, &posting));
    }
}
