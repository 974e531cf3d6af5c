//! Port contracts for conversational state.

mod flow_store;

pub use flow_store::{FlowStore, FlowStoreError, FlowStoreResult};
