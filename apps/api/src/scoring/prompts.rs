//! Prompt builder — turns a (profile, posting) pair into the model-agnostic
//! structured prompt shared by every inference tier.
//!
//! Deterministic: the same inputs always produce the same prompt, and the
//! prompt enumerates the exact output schema (all 10 dimension keys and
//! their weights) so the validator's checks are mechanical.

use serde_json::json;

use crate::models::analysis::DIMENSION_WEIGHTS;
use crate::models::posting::JobPosting;
use crate::models::profile::CandidateProfile;

/// Character budgets keeping the prompt inside the smallest tier's context
/// window (~8k tokens at ~4 chars/token, with headroom for the template).
const POSTING_DESCRIPTION_BUDGET: usize = 6_000;
const WORK_DESCRIPTION_BUDGET: usize = 600;
const USER_PROMPT_BUDGET: usize = 24_000;

/// System prompt — enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str = "You are an expert technical recruiter scoring \
    how well a candidate matches a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Analysis prompt template.
/// Replace: {dimension_table}, {candidate_json}, {posting_json}
const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Score the candidate below against the job posting and return a JSON object with this EXACT schema (no extra fields):
{
  "overallScore": 78,
  "recommendation": "GoodMatch",
  "dimensions": {
    "skillMatch": {"score": 8, "justification": "at least 30 characters explaining the score"}
  },
  "strengths": ["exactly", "three", "strings"],
  "gaps": ["exactly", "three", "strings"],
  "redFlags": []
}

HARD RULES:
1. "dimensions" MUST contain ALL of these keys and no others, each with an integer "score" in 1-10 and a "justification" of at least 30 characters:
{dimension_table}
2. "overallScore" is an integer 0-100 equal to the weighted combination of the dimension scores scaled to 0-100 (score x weight, summed, divided by 10).
3. "recommendation" MUST be consistent with "overallScore": StrongMatch >= 85, GoodMatch 70-84, ModerateMatch 50-69, PoorMatch < 50.
4. "strengths" and "gaps" MUST each contain exactly 3 strings.
5. "redFlags" MUST be present; an empty array is acceptable.

CANDIDATE:
{candidate_json}

JOB POSTING:
{posting_json}"#;

/// A model-agnostic prompt: system instruction plus serialized user content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the analysis prompt for one (profile, posting) pair.
pub fn build(profile: &CandidateProfile, posting: &JobPosting) -> StructuredPrompt {
    let dimension_table: String = DIMENSION_WEIGHTS
        .iter()
        .map(|(key, weight)| format!("   - {key} (weight {weight}%)"))
        .collect::<Vec<_>>()
        .join("\n");

    let candidate = json!({
        "skills": profile.skills,
        "workHistory": profile
            .work_history
            .iter()
            .map(|entry| json!({
                "title": entry.title,
                "company": entry.company,
                "start": entry.start,
                "end": entry.end,
                "description": truncate(&entry.description, WORK_DESCRIPTION_BUDGET),
            }))
            .collect::<Vec<_>>(),
        "education": profile.education,
        "location": profile.location,
        "desiredSalary": profile.desired_salary,
        "experienceLevel": profile.experience_level,
    });

    let posting_json = json!({
        "title": posting.title,
        "company": posting.company,
        "description": truncate(&posting.description, POSTING_DESCRIPTION_BUDGET),
        "requiredSkills": posting.required_skills,
        "location": posting.location,
        "salary": posting.salary,
        "experienceLevel": posting.experience_level,
    });

    let user = ANALYSIS_PROMPT_TEMPLATE
        .replace("{dimension_table}", &dimension_table)
        .replace("{candidate_json}", &candidate.to_string())
        .replace("{posting_json}", &posting_json.to_string());

    StructuredPrompt {
        system: ANALYSIS_SYSTEM.to_string(),
        user: truncate(&user, USER_PROMPT_BUDGET).to_string(),
    }
}

/// Truncates at a char boundary without allocating when within budget.
fn truncate(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
