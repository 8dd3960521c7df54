//! Quality validator — structural checks over raw tier output.
//!
//! Validation never panics and never judges semantic quality: it parses the
//! raw text leniently, then collects EVERY violated rule (not just the first)
//! so fallback decisions are observable.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::models::analysis::{
    weighted_overall, AnalysisStatus, CompatibilityAnalysis, DimensionScore, Recommendation,
    DIMENSION_WEIGHTS,
};

/// Justifications shorter than this are rejected as non-explanations.
const MIN_JUSTIFICATION_CHARS: usize = 30;

/// Tolerance between `overallScore` and the weighted dimension combination,
/// absorbing model-introduced rounding.
const WEIGHTED_TOLERANCE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("output is not a valid analysis object: {0}")]
    Unparseable(String),
    #[error("overallScore is missing")]
    MissingOverallScore,
    #[error("overallScore {0} is outside 0-100")]
    OverallScoreOutOfRange(i64),
    #[error("recommendation is missing or unknown: {0:?}")]
    UnknownRecommendation(Option<String>),
    #[error("recommendation {found:?} is inconsistent with overallScore {score}")]
    RecommendationMismatch {
        found: Recommendation,
        score: u8,
    },
    #[error("dimension {0} is missing")]
    MissingDimension(&'static str),
    #[error("dimension {key} score {score} is outside 1-10")]
    DimensionScoreOutOfRange { key: String, score: i64 },
    #[error("dimension {0} justification is shorter than 30 characters")]
    JustificationTooShort(String),
    #[error("strengths must contain exactly 3 entries, found {0}")]
    StrengthsCount(usize),
    #[error("gaps must contain exactly 3 entries, found {0}")]
    GapsCount(usize),
    #[error("redFlags key is missing (an empty array is acceptable, absence is not)")]
    MissingRedFlags,
    #[error("overallScore {overall} deviates from the weighted dimensions ({expected}) by more than 5")]
    WeightedMismatch { overall: u8, expected: u8 },
}

// Lenient mirror of the wire schema: everything optional so one missing key
// cannot mask the remaining checks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    overall_score: Option<i64>,
    recommendation: Option<String>,
    #[serde(default)]
    dimensions: BTreeMap<String, RawDimension>,
    strengths: Option<Vec<String>>,
    gaps: Option<Vec<String>>,
    red_flags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawDimension {
    score: Option<i64>,
    justification: Option<String>,
}

/// A raw output that passed every structural check. Terminal fields the
/// validator cannot know (tier id, algorithmic score) are filled by the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct ValidatedOutput {
    pub overall_score: u8,
    pub recommendation: Recommendation,
    pub dimensions: BTreeMap<String, DimensionScore>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub red_flags: Vec<String>,
}

impl ValidatedOutput {
    pub fn into_analysis(self, produced_by: &str, algorithmic_score: u8) -> CompatibilityAnalysis {
        CompatibilityAnalysis {
            overall_score: self.overall_score,
            recommendation: self.recommendation,
            dimensions: self.dimensions,
            strengths: self.strengths,
            gaps: self.gaps,
            red_flags: self.red_flags,
            produced_by: produced_by.to_string(),
            analysis_status: AnalysisStatus::Complete,
            algorithmic_score,
        }
    }
}

/// Validates raw tier output against the analysis contract.
/// Returns the full list of violated rules on failure.
pub fn validate(raw: &str) -> Result<ValidatedOutput, Vec<Violation>> {
    let raw = strip_json_fences(raw);
    let parsed: RawAnalysis = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(e) => return Err(vec![Violation::Unparseable(e.to_string())]),
    };

    let mut violations = Vec::new();

    let overall_score = match parsed.overall_score {
        None => {
            violations.push(Violation::MissingOverallScore);
            None
        }
        Some(s) if !(0..=100).contains(&s) => {
            violations.push(Violation::OverallScoreOutOfRange(s));
            None
        }
        Some(s) => Some(s as u8),
    };

    let recommendation = match parsed.recommendation.as_deref().and_then(parse_recommendation) {
        None => {
            violations.push(Violation::UnknownRecommendation(parsed.recommendation.clone()));
            None
        }
        Some(r) => Some(r),
    };

    if let (Some(found), Some(score)) = (recommendation, overall_score) {
        if found != Recommendation::from_score(score) {
            violations.push(Violation::RecommendationMismatch { found, score });
        }
    }

    let mut dimensions = BTreeMap::new();
    for (key, _) in DIMENSION_WEIGHTS {
        let Some(raw_dim) = parsed.dimensions.get(key) else {
            violations.push(Violation::MissingDimension(key));
            continue;
        };
        let score = match raw_dim.score {
            Some(s) if (1..=10).contains(&s) => Some(s as u8),
            other => {
                violations.push(Violation::DimensionScoreOutOfRange {
                    key: key.to_string(),
                    score: other.unwrap_or(0),
                });
                None
            }
        };
        let justification = raw_dim.justification.clone().unwrap_or_default();
        if justification.chars().count() < MIN_JUSTIFICATION_CHARS {
            violations.push(Violation::JustificationTooShort(key.to_string()));
        }
        if let Some(score) = score {
            dimensions.insert(key.to_string(), DimensionScore {
                score,
                justification,
            });
        }
    }

    let strengths = parsed.strengths.unwrap_or_default();
    if strengths.len() != 3 {
        violations.push(Violation::StrengthsCount(strengths.len()));
    }
    let gaps = parsed.gaps.unwrap_or_default();
    if gaps.len() != 3 {
        violations.push(Violation::GapsCount(gaps.len()));
    }
    let red_flags = match parsed.red_flags {
        Some(flags) => flags,
        None => {
            violations.push(Violation::MissingRedFlags);
            vec![]
        }
    };

    // Weighted-consistency invariant, checked only once the dimensions
    // themselves are structurally sound.
    if let Some(overall) = overall_score {
        if dimensions.len() == DIMENSION_WEIGHTS.len() {
            let expected = weighted_overall(&dimensions);
            if overall.abs_diff(expected) > WEIGHTED_TOLERANCE {
                violations.push(Violation::WeightedMismatch { overall, expected });
            }
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    // A None in either field always pushed a violation and returned above.
    let (Some(overall_score), Some(recommendation)) = (overall_score, recommendation) else {
        return Err(vec![Violation::MissingOverallScore]);
    };

    Ok(ValidatedOutput {
        overall_score,
        recommendation,
        dimensions,
        strengths,
        gaps,
        red_flags,
    })
}

fn parse_recommendation(raw: &str) -> Option<Recommendation> {
    match raw {
        "StrongMatch" => Some(Recommendation::StrongMatch),
        "GoodMatch" => Some(Recommendation::GoodMatch),
        "ModerateMatch" => Some(Recommendation::ModerateMatch),
        "PoorMatch" => Some(Recommendation::PoorMatch),
        _ => None,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
