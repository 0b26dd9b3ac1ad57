use std::sync::Arc;

use crate::services::{MetadataService, RecommendationIndex};

/// Shared application state
///
/// Built once at startup. The index is read-only for the life of the process,
/// so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<RecommendationIndex>,
    pub metadata: MetadataService,
}

impl AppState {
    pub fn new(index: RecommendationIndex, metadata: MetadataService) -> Self {
        Self {
            index: Arc::new(index),
            metadata,
        }
    }
}
