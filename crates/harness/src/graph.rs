use std::path::Path;
use std::sync::Arc;

use graphlog_core::{ActionId, DeletedMatch, Statement, StatementSet};
use graphlog_engine::{EngineError, GraphStore, RollbackReport, Versioning, VersioningConfig};
use graphlog_storage::SqliteStorage;

use crate::auth::TestAuth;
use crate::store::MemoryGraphStore;

/// A store wired to a versioning engine the way an application would be:
/// every mutation is applied first and then announced.
pub struct TestGraph {
    pub store: MemoryGraphStore,
    pub versioning: Versioning,
    pub auth: TestAuth,
    /// Deletes matching more statements than this are reported without
    /// enumerating them.
    pub enumeration_limit: Option<usize>,
}

impl TestGraph {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(SqliteStorage::open_in_memory()?, &VersioningConfig::default())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::with_config(SqliteStorage::open(path)?, &VersioningConfig::default())
    }

    pub fn with_config(
        storage: SqliteStorage,
        config: &VersioningConfig,
    ) -> Result<Self, EngineError> {
        let auth = TestAuth::new();
        let versioning = Versioning::from_config(storage, Arc::new(auth.clone()), config)?;
        Ok(Self {
            store: MemoryGraphStore::new(),
            versioning,
            auth,
            enumeration_limit: None,
        })
    }

    pub fn add_statement(
        &mut self,
        graph: &str,
        statement: Statement,
    ) -> Result<Option<ActionId>, Box<dyn std::error::Error>> {
        self.store
            .add_statements(graph, &StatementSet::from(statement.clone()))?;
        Ok(self.versioning.on_add_statement(graph.to_string(), statement)?)
    }

    pub fn add_statements(
        &mut self,
        graph: &str,
        statements: StatementSet,
    ) -> Result<Option<ActionId>, Box<dyn std::error::Error>> {
        self.store.add_statements(graph, &statements)?;
        Ok(self
            .versioning
            .on_add_multiple_statements(graph.to_string(), statements)?)
    }

    pub fn delete_statements(
        &mut self,
        graph: &str,
        statements: StatementSet,
    ) -> Result<Option<ActionId>, Box<dyn std::error::Error>> {
        self.store.delete_statements(graph, &statements)?;
        Ok(self
            .versioning
            .on_delete_multiple_statements(graph.to_string(), statements)?)
    }

    /// Delete everything about `resource`, the way a wildcard delete would.
    pub fn delete_matching(
        &mut self,
        graph: &str,
        resource: &str,
    ) -> Result<Option<ActionId>, Box<dyn std::error::Error>> {
        let removed = self.store.delete_resource(graph, resource)?;
        let matched = match self.enumeration_limit {
            Some(limit) if removed.len() > limit => DeletedMatch::Unenumerated {
                resource: resource.to_string(),
            },
            _ => DeletedMatch::Statements {
                resource: Some(resource.to_string()),
                statements: removed,
            },
        };
        Ok(self
            .versioning
            .on_delete_matching_statements(graph.to_string(), matched)?)
    }

    pub fn rollback(&mut self, id: ActionId) -> Result<RollbackReport, EngineError> {
        self.versioning.rollback_action(id, &mut self.store)
    }
}
