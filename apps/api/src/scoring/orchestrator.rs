//! Tiered inference orchestrator — walks the ordered tier list for a single
//! posting, validating after every attempt and degrading instead of failing.
//!
//! Policy in one place:
//! - transient provider errors retry on the same tier, bounded, with
//!   exponential backoff;
//! - structural validation failures escalate to the next tier immediately
//!   (the same model on the same prompt is unlikely to fix a structural
//!   defect);
//! - unconfigured tiers are skipped without consuming retry budget;
//! - exhausting the list yields a Degraded analysis, never an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::analysis::CompatibilityAnalysis;
use crate::models::posting::JobPosting;
use crate::models::profile::CandidateProfile;
use crate::scoring::prompts::{self, StructuredPrompt};
use crate::scoring::tiers::{InferenceTier, TierError};
use crate::scoring::validation;

/// Backoff bounds for transient-error retries within a single tier.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so `max_retries + 1` attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-based): base doubling, capped.
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt - 1).min(16);
        (self.base_delay * factor).min(self.max_delay)
    }
}

pub struct Orchestrator {
    tiers: Vec<Arc<dyn InferenceTier>>,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(tiers: Vec<Arc<dyn InferenceTier>>, retry: RetryPolicy) -> Self {
        Self { tiers, retry }
    }

    /// Analyzes one (profile, posting) pair. Infallible: the worst outcome
    /// is a Degraded analysis carrying the algorithmic score.
    pub async fn analyze(
        &self,
        profile: &CandidateProfile,
        posting: &JobPosting,
        algorithmic_score: u8,
    ) -> CompatibilityAnalysis {
        // Built once, reused across every tier.
        let prompt = prompts::build(profile, posting);

        for tier in &self.tiers {
            if !tier.configured() {
                debug!(tier = tier.id(), "tier not configured, skipping");
                continue;
            }

            let raw = match self.invoke_with_retry(tier.as_ref(), &prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(tier = tier.id(), error = %e, "tier failed, escalating");
                    continue;
                }
            };

            match validation::validate(&raw) {
                Ok(output) => {
                    debug!(tier = tier.id(), posting = %posting.id, "analysis complete");
                    return output.into_analysis(tier.id(), algorithmic_score);
                }
                Err(violations) => {
                    // No same-tier retry for structural defects.
                    warn!(
                        tier = tier.id(),
                        posting = %posting.id,
                        violations = ?violations,
                        "validation failed, escalating"
                    );
                }
            }
        }

        warn!(posting = %posting.id, "all tiers exhausted, degrading to algorithmic score");
        CompatibilityAnalysis::degraded(algorithmic_score)
    }

    async fn invoke_with_retry(
        &self,
        tier: &dyn InferenceTier,
        prompt: &StructuredPrompt,
    ) -> Result<String, TierError> {
        let mut attempt = 0u32;
        loop {
            match tier.invoke(prompt).await {
                Ok(raw) => return Ok(raw),
                Err(TierError::Transient { status, message }) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(
                        tier = tier.id(),
                        attempt,
                        status,
                        delay_ms = delay.as_millis() as u64,
                        "transient provider error, retrying: {message}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
