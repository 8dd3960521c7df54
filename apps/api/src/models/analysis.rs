//! Compatibility analysis — the one output record per (profile version, posting).
//!
//! Serialized field names are part of the wire contract consumed by the UI;
//! everything here is camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel used in `produced_by` when no inference tier contributed.
pub const PRODUCED_BY_DEGRADED: &str = "Degraded";

/// The 10 fixed scoring dimensions and their weights (percent, summing to 100).
pub const DIMENSION_WEIGHTS: [(&str, u8); 10] = [
    ("skillMatch", 30),
    ("experienceLevel", 20),
    ("industryMatch", 15),
    ("locationMatch", 10),
    ("seniorityLevel", 5),
    ("educationCertification", 5),
    ("softSkillsLeadership", 5),
    ("employmentStability", 5),
    ("growthPotential", 3),
    ("companyScaleAlignment", 2),
];

/// Coarse recommendation bucket derived from `overall_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    ModerateMatch,
    PoorMatch,
}

impl Recommendation {
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=100 => Recommendation::StrongMatch,
            70..=84 => Recommendation::GoodMatch,
            50..=69 => Recommendation::ModerateMatch,
            _ => Recommendation::PoorMatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    /// A tier produced a validated full analysis.
    Complete,
    /// Every tier failed; only the algorithmic score is available.
    Degraded,
    /// Never escalated past the pre-filter.
    Skipped,
}

/// Score and justification for a single dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u8,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityAnalysis {
    pub overall_score: u8,
    pub recommendation: Recommendation,
    pub dimensions: BTreeMap<String, DimensionScore>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub red_flags: Vec<String>,
    /// Tier id that produced the result, or `"Degraded"`.
    pub produced_by: String,
    pub analysis_status: AnalysisStatus,
    /// The deterministic pre-filter score, carried for logging and tests.
    /// Not part of the serialized record, so a cached round trip resets it.
    #[serde(skip)]
    pub algorithmic_score: u8,
}

impl CompatibilityAnalysis {
    /// Coarse result carrying only the pre-filter score. Used when every
    /// tier failed or the batch deadline cancelled the posting's task.
    pub fn degraded(algorithmic_score: u8) -> Self {
        Self::fallback(algorithmic_score, AnalysisStatus::Degraded)
    }

    /// Result for a posting the pre-filter never escalated.
    pub fn skipped(algorithmic_score: u8) -> Self {
        Self::fallback(algorithmic_score, AnalysisStatus::Skipped)
    }

    fn fallback(algorithmic_score: u8, status: AnalysisStatus) -> Self {
        CompatibilityAnalysis {
            overall_score: algorithmic_score,
            recommendation: Recommendation::from_score(algorithmic_score),
            dimensions: BTreeMap::new(),
            strengths: vec![],
            gaps: vec![],
            red_flags: vec![],
            produced_by: PRODUCED_BY_DEGRADED.to_string(),
            analysis_status: status,
            algorithmic_score,
        }
    }
}

/// Weighted combination of dimension scores scaled to 0–100.
/// Assumes all 10 dimensions are present; missing keys contribute zero.
pub fn weighted_overall(dimensions: &BTreeMap<String, DimensionScore>) -> u8 {
    let total: f64 = DIMENSION_WEIGHTS
        .iter()
        .filter_map(|(key, weight)| {
            dimensions
                .get(*key)
                .map(|d| d.score as f64 * *weight as f64)
        })
        .sum();
    // score ∈ [1,10], weights sum to 100 → total ∈ [100, 1000]
    (total / 10.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_weights_sum_to_100() {
        let sum: u32 = DIMENSION_WEIGHTS.iter().map(|(_, w)| *w as u32).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn test_recommendation_buckets() {
        assert_eq!(Recommendation::from_score(100), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(85), Recommendation::StrongMatch);
        assert_eq!(Recommendation::from_score(84), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(70), Recommendation::GoodMatch);
        assert_eq!(Recommendation::from_score(69), Recommendation::ModerateMatch);
        assert_eq!(Recommendation::from_score(50), Recommendation::ModerateMatch);
        assert_eq!(Recommendation::from_score(49), Recommendation::PoorMatch);
        assert_eq!(Recommendation::from_score(0), Recommendation::PoorMatch);
    }

    #[test]
    fn test_weighted_overall_all_tens_is_100() {
        let dims: BTreeMap<String, DimensionScore> = DIMENSION_WEIGHTS
            .iter()
            .map(|(key, _)| {
                (
                    key.to_string(),
                    DimensionScore {
                        score: 10,
                        justification: String::new(),
                    },
                )
            })
            .collect();
        assert_eq!(weighted_overall(&dims), 100);
    }

    #[test]
    fn test_weighted_overall_all_ones_is_10() {
        let dims: BTreeMap<String, DimensionScore> = DIMENSION_WEIGHTS
            .iter()
            .map(|(key, _)| {
                (
                    key.to_string(),
                    DimensionScore {
                        score: 1,
                        justification: String::new(),
                    },
                )
            })
            .collect();
        assert_eq!(weighted_overall(&dims), 10);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let analysis = CompatibilityAnalysis::degraded(42);
        let json = serde_json::to_value(&analysis).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "overallScore",
            "recommendation",
            "dimensions",
            "strengths",
            "gaps",
            "redFlags",
            "producedBy",
            "analysisStatus",
        ] {
            assert!(obj.contains_key(key), "missing wire field {key}");
        }
        assert_eq!(obj.len(), 8, "unexpected extra wire fields: {obj:?}");
        assert!(!obj.contains_key("algorithmicScore"));
        assert_eq!(json["analysisStatus"], "Degraded");
        assert_eq!(json["producedBy"], "Degraded");
        assert_eq!(json["overallScore"], 42);
    }

    #[test]
    fn test_skipped_carries_algorithmic_score_and_bucket() {
        let analysis = CompatibilityAnalysis::skipped(55);
        assert_eq!(analysis.analysis_status, AnalysisStatus::Skipped);
        assert_eq!(analysis.overall_score, 55);
        assert_eq!(analysis.recommendation, Recommendation::ModerateMatch);
        assert!(analysis.dimensions.is_empty());
    }
}
