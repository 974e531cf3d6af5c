//! Keyed store of per-user flow state.

use crate::conversation::domain::FlowState;
use crate::directory::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for flow store operations.
pub type FlowStoreResult<T> = Result<T, FlowStoreError>;

/// Holds the current [`FlowState`] of every user with a flow in progress.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Returns the user's state, [`FlowState::Idle`] when none is stored.
    async fn load(&self, user: UserId) -> FlowStoreResult<FlowState>;

    /// Replaces the user's state. Saving [`FlowState::Idle`] removes it.
    async fn save(&self, user: UserId, state: FlowState) -> FlowStoreResult<()>;

    /// Discards the user's state.
    async fn clear(&self, user: UserId) -> FlowStoreResult<()>;
}

/// Errors returned by flow store implementations.
#[derive(Debug, Clone, Error)]
pub enum FlowStoreError {
    /// Storage failure.
    #[error("flow state storage error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FlowStoreError {
    /// Wraps a storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
