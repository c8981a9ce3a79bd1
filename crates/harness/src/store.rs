use std::collections::BTreeMap;

use graphlog_core::{Statement, StatementSet};
use graphlog_engine::GraphStore;

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("write to graph {0} rejected")]
    WriteRejected(String),
}

/// In-memory quad store. Writes are all-or-nothing; `fail_writes` makes
/// every write fail before touching any graph.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graphs: BTreeMap<String, StatementSet>,
    pub fail_writes: bool,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self, graph: &str) -> StatementSet {
        self.graphs.get(graph).cloned().unwrap_or_default()
    }

    pub fn contains(&self, graph: &str, statement: &Statement) -> bool {
        self.graphs
            .get(graph)
            .is_some_and(|set| set.contains(statement))
    }

    pub fn len(&self, graph: &str) -> usize {
        self.graphs.get(graph).map_or(0, StatementSet::len)
    }

    /// Remove every statement about `resource` and return what was removed.
    pub fn delete_resource(
        &mut self,
        graph: &str,
        resource: &str,
    ) -> Result<StatementSet, MemoryStoreError> {
        self.check_writable(graph)?;
        Ok(self
            .graphs
            .get_mut(graph)
            .map(|set| set.remove_resource(resource))
            .unwrap_or_default())
    }

    fn check_writable(&self, graph: &str) -> Result<(), MemoryStoreError> {
        if self.fail_writes {
            return Err(MemoryStoreError::WriteRejected(graph.to_string()));
        }
        Ok(())
    }
}

impl GraphStore for MemoryGraphStore {
    type Error = MemoryStoreError;

    fn add_statements(
        &mut self,
        graph: &str,
        statements: &StatementSet,
    ) -> Result<(), Self::Error> {
        self.check_writable(graph)?;
        self.graphs
            .entry(graph.to_string())
            .or_default()
            .merge(statements);
        Ok(())
    }

    fn delete_statements(
        &mut self,
        graph: &str,
        statements: &StatementSet,
    ) -> Result<(), Self::Error> {
        self.check_writable(graph)?;
        if let Some(set) = self.graphs.get_mut(graph) {
            for statement in statements.statements() {
                set.remove(&statement);
            }
        }
        Ok(())
    }
}
