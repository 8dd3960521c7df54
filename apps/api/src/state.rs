use std::sync::Arc;

use crate::scoring::batch::BatchCoordinator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The whole scoring pipeline behind its single entry point.
    pub coordinator: Arc<BatchCoordinator>,
}
