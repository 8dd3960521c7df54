//! Batch coordinator — fans one candidate out across many postings.
//!
//! Control flow per batch: pre-filter every posting synchronously, resolve
//! below-threshold postings and cache hits immediately, dispatch the rest to
//! the orchestrator under a bounded worker pool, and reassemble results by
//! input index. A single posting's failure never affects another posting's
//! outcome, and the batch deadline degrades still-outstanding postings
//! instead of blocking.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::models::analysis::{AnalysisStatus, CompatibilityAnalysis};
use crate::models::posting::JobPosting;
use crate::models::profile::CandidateProfile;
use crate::scoring::cache::{ResultCache, DEFAULT_TTL};
use crate::scoring::orchestrator::Orchestrator;
use crate::scoring::prefilter;

/// Feature flags and tunables, passed at construction — never module-level
/// mutable state.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Minimum algorithmic score before a posting is escalated to inference.
    pub prefilter_threshold: u8,
    /// Worker-pool size when the caller does not specify one.
    pub default_concurrency: usize,
    pub cache_ttl: Duration,
    /// When false the tier chain is bypassed entirely and every escalated
    /// posting resolves as algorithmic-only.
    pub hybrid_enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            prefilter_threshold: prefilter::DEFAULT_THRESHOLD,
            default_concurrency: 5,
            cache_ttl: DEFAULT_TTL,
            hybrid_enabled: true,
        }
    }
}

pub struct BatchCoordinator {
    orchestrator: Arc<Orchestrator>,
    cache: Arc<dyn ResultCache>,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        cache: Arc<dyn ResultCache>,
        config: BatchConfig,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            config,
        }
    }

    /// The sole entry point: analyzes every posting for one candidate.
    /// The returned vec has the same length and order as `postings`.
    pub async fn run(
        &self,
        profile: &CandidateProfile,
        postings: &[JobPosting],
        concurrency_limit: Option<usize>,
        deadline: Duration,
    ) -> Vec<CompatibilityAnalysis> {
        let deadline_at = Instant::now() + deadline;
        let concurrency = concurrency_limit
            .unwrap_or(self.config.default_concurrency)
            .max(1);

        // Cheap, synchronous pass over the whole batch.
        let scores: Vec<u8> = postings
            .iter()
            .map(|posting| prefilter::score(profile, posting))
            .collect();

        let mut results: Vec<Option<CompatibilityAnalysis>> = Vec::with_capacity(postings.len());
        results.resize_with(postings.len(), || None);

        let mut cache_hits = 0usize;
        let mut dispatched = Vec::new();
        for (index, posting) in postings.iter().enumerate() {
            let score = scores[index];
            if score < self.config.prefilter_threshold {
                results[index] = Some(CompatibilityAnalysis::skipped(score));
                continue;
            }
            if !self.config.hybrid_enabled {
                results[index] = Some(CompatibilityAnalysis::degraded(score));
                continue;
            }
            // A hung cache backend must not stall the batch past its
            // deadline; an expired lookup is just a miss.
            let lookup = tokio::time::timeout_at(
                deadline_at,
                self.cache.get(profile.id, profile.version, posting.id),
            )
            .await;
            match lookup {
                Ok(Some(hit)) => {
                    cache_hits += 1;
                    results[index] = Some(hit);
                }
                Ok(None) => dispatched.push(index),
                Err(_) => {
                    warn!(posting = %posting.id, "cache lookup abandoned at deadline");
                    dispatched.push(index);
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let shared_profile = Arc::new(profile.clone());
        let mut tasks: JoinSet<(usize, CompatibilityAnalysis)> = JoinSet::new();

        for index in &dispatched {
            let index = *index;
            let score = scores[index];
            let posting = postings[index].clone();
            let profile = shared_profile.clone();
            let orchestrator = self.orchestrator.clone();
            let cache = self.cache.clone();
            let semaphore = semaphore.clone();
            let ttl = self.config.cache_ttl;

            tasks.spawn(async move {
                let outcome = tokio::time::timeout_at(deadline_at, async {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return CompatibilityAnalysis::degraded(score);
                    };
                    orchestrator.analyze(&profile, &posting, score).await
                })
                .await;

                let analysis = match outcome {
                    Ok(analysis) => {
                        if analysis.analysis_status == AnalysisStatus::Complete {
                            // The result is kept either way; a write the
                            // deadline cuts off is simply dropped.
                            let write = tokio::time::timeout_at(
                                deadline_at,
                                cache.put(profile.id, profile.version, posting.id, &analysis, ttl),
                            )
                            .await;
                            if write.is_err() {
                                warn!(posting = %posting.id, "cache write abandoned at deadline");
                            }
                        }
                        analysis
                    }
                    Err(_) => {
                        warn!(posting = %posting.id, "batch deadline expired, degrading posting");
                        CompatibilityAnalysis::degraded(score)
                    }
                };
                (index, analysis)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, analysis)) => results[index] = Some(analysis),
                // A panicked task only loses its own slot; the backfill
                // below degrades it.
                Err(e) => warn!(error = %e, "analysis task failed to join"),
            }
        }

        let results: Vec<CompatibilityAnalysis> = results
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| CompatibilityAnalysis::degraded(scores[index]))
            })
            .collect();

        let complete = count(&results, AnalysisStatus::Complete);
        let skipped = count(&results, AnalysisStatus::Skipped);
        let degraded = count(&results, AnalysisStatus::Degraded);
        info!(
            profile = %profile.id,
            profile_version = profile.version,
            postings = postings.len(),
            complete,
            skipped,
            degraded,
            cache_hits,
            "batch analysis finished"
        );

        results
    }
}

fn count(results: &[CompatibilityAnalysis], status: AnalysisStatus) -> usize {
    results
        .iter()
        .filter(|r| r.analysis_status == status)
        .count()
}
