//! Candidate profile — read-only input owned by the external profile store.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A salary range in whole currency units per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
}

impl SalaryRange {
    /// Fraction of `self` covered by `other`, in 0.0–1.0.
    /// Degenerate ranges (min ≥ max) count as full overlap when they fall inside `other`.
    pub fn overlap_ratio(&self, other: &SalaryRange) -> f64 {
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        if lo > hi {
            return 0.0;
        }
        let span = self.max.saturating_sub(self.min);
        if span == 0 {
            return 1.0;
        }
        (hi - lo) as f64 / span as f64
    }
}

/// One position in the candidate's work history, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    pub start: NaiveDate,
    /// `None` means the position is current.
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// Candidate profile snapshot at a specific `version`.
///
/// `version` is a monotonic counter bumped by the profile store on any
/// material edit; it doubles as the natural cache-invalidation key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub version: u64,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub work_history: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub desired_salary: Option<SalaryRange>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_ratio_disjoint_is_zero() {
        let a = SalaryRange {
            min: 50_000,
            max: 70_000,
        };
        let b = SalaryRange {
            min: 90_000,
            max: 120_000,
        };
        assert_eq!(a.overlap_ratio(&b), 0.0);
    }

    #[test]
    fn test_overlap_ratio_contained_is_full() {
        let a = SalaryRange {
            min: 80_000,
            max: 100_000,
        };
        let b = SalaryRange {
            min: 60_000,
            max: 120_000,
        };
        assert_eq!(a.overlap_ratio(&b), 1.0);
    }

    #[test]
    fn test_overlap_ratio_partial() {
        let a = SalaryRange {
            min: 80_000,
            max: 120_000,
        };
        let b = SalaryRange {
            min: 100_000,
            max: 160_000,
        };
        assert!((a.overlap_ratio(&b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlap_ratio_degenerate_range_inside() {
        let a = SalaryRange {
            min: 90_000,
            max: 90_000,
        };
        let b = SalaryRange {
            min: 80_000,
            max: 100_000,
        };
        assert_eq!(a.overlap_ratio(&b), 1.0);
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let json = r#"{"id": "6f2a1b9e-8a6a-4e8e-9c3e-0f5f3f2a1b9e", "version": 3}"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.version, 3);
        assert!(profile.skills.is_empty());
        assert!(profile.desired_salary.is_none());
    }
}
