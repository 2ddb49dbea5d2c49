use std::sync::Arc;

use crate::insights::InsightGateway;
use crate::jobs::JobRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Job store backend, selected by STORE_BACKEND.
    pub store: Arc<dyn JobRepository>,
    /// Live only when OPENAI_API_KEY is set.
    pub gateway: InsightGateway,
}

impl AppState {
    pub fn new(store: Arc<dyn JobRepository>, gateway: InsightGateway) -> Self {
        Self { store, gateway }
    }
}
