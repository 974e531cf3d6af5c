//! Process-wide in-memory flow store. State is lost on restart.

use crate::conversation::{
    domain::FlowState,
    ports::{FlowStore, FlowStoreError, FlowStoreResult},
};
use crate::directory::domain::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory flow store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlowStore {
    states: Arc<RwLock<HashMap<UserId, FlowState>>>,
}

impl InMemoryFlowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a flow in progress.
    #[must_use]
    pub fn active_flows(&self) -> usize {
        self.states.read().map(|states| states.len()).unwrap_or_default()
    }

    fn read(&self) -> FlowStoreResult<RwLockReadGuard<'_, HashMap<UserId, FlowState>>> {
        self.states
            .read()
            .map_err(|err| FlowStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> FlowStoreResult<RwLockWriteGuard<'_, HashMap<UserId, FlowState>>> {
        self.states
            .write()
            .map_err(|err| FlowStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl FlowStore for InMemoryFlowStore {
    async fn load(&self, user: UserId) -> FlowStoreResult<FlowState> {
        let states = self.read()?;
        Ok(states.get(&user).cloned().unwrap_or_default())
    }

    async fn save(&self, user: UserId, state: FlowState) -> FlowStoreResult<()> {
        let mut states = self.write()?;
        if state == FlowState::Idle {
            states.remove(&user);
        } else {
            states.insert(user, state);
        }
        Ok(())
    }

    async fn clear(&self, user: UserId) -> FlowStoreResult<()> {
        let mut states = self.write()?;
        states.remove(&user);
        Ok(())
    }
}
