use graphlog_core::{MutationEvent, StatementSet};

use crate::error::EngineError;

/// Rollback target. Each call must apply every statement or none of them.
pub trait GraphStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn add_statements(&mut self, graph: &str, statements: &StatementSet)
    -> Result<(), Self::Error>;

    fn delete_statements(
        &mut self,
        graph: &str,
        statements: &StatementSet,
    ) -> Result<(), Self::Error>;
}

/// Supplies the acting principal when an action is persisted.
pub trait UserProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// A caller that never authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl UserProvider for Anonymous {
    fn current_user(&self) -> Option<String> {
        None
    }
}

/// Receiver of store mutation notifications.
pub trait MutationObserver {
    fn observe(&mut self, event: MutationEvent) -> Result<(), EngineError>;
}
