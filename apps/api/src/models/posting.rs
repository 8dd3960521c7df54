//! Job posting — read-only input produced by the external ingestion pipeline.
//!
//! Postings are immutable once ingested; a re-ingestion creates a new record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::SalaryRange;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_skills: BTreeSet<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub experience_level: Option<String>,
    /// Which scraper/board the posting came from, e.g. "linkedin".
    #[serde(default)]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_deserializes_with_minimal_fields() {
        let json = r#"{
            "id": "b43c6f1a-2a7e-4b63-8f50-1d9a2c4e7b11",
            "title": "Backend Engineer",
            "company": "Acme"
        }"#;
        let posting: JobPosting = serde_json::from_str(json).unwrap();
        assert!(posting.required_skills.is_empty());
        assert!(posting.salary.is_none());
        assert!(posting.source.is_none());
    }
}
