use std::sync::Arc;

use crate::infra::db::DbCoordinator;
use crate::usecase::Registry;

/// Shared application state passed to every handler via axum `State`.
pub struct AppState<C = DbCoordinator> {
    pub registry: Arc<Registry<C>>,
}

impl<C> AppState<C> {
    pub fn new(registry: Arc<Registry<C>>) -> Self {
        Self { registry }
    }
}

// Derived Clone would require `C: Clone`.
impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}
