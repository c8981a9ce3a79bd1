pub mod auth;
pub mod graph;
pub mod store;

pub use auth::TestAuth;
pub use graph::TestGraph;
pub use store::{MemoryGraphStore, MemoryStoreError};
