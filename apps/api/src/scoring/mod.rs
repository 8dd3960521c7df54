//! The hybrid compatibility scoring core: deterministic pre-filter,
//! tiered LLM inference with validation and fallback, result caching, and
//! batch fan-out.

pub mod batch;
pub mod cache;
pub mod orchestrator;
pub mod prefilter;
pub mod prompts;
pub mod tiers;
pub mod validation;
