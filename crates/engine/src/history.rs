use serde::{Serialize, Serializer};

use graphlog_core::{Action, ActionId, ActionType, StatementSet, Timestamp};
use graphlog_storage::{ActionLog, HistoryWindow};

use crate::Versioning;
use crate::error::EngineError;

/// Rows expose `tstamp` as whole seconds since the Unix epoch.
fn unix_seconds<S: Serializer>(tstamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(tstamp.unix_seconds())
}

/// Row of [`Versioning::history_for_graph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphHistoryRow {
    pub id: ActionId,
    pub user: Option<String>,
    pub resource: Option<String>,
    #[serde(serialize_with = "unix_seconds")]
    pub tstamp: Timestamp,
    pub action_type: ActionType,
}

/// Row of [`Versioning::history_for_resource`] and
/// [`Versioning::last_modified_for_resource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHistoryRow {
    pub id: ActionId,
    pub user: Option<String>,
    #[serde(serialize_with = "unix_seconds")]
    pub tstamp: Timestamp,
    pub action_type: ActionType,
}

/// Row of [`Versioning::history_for_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserHistoryRow {
    pub id: ActionId,
    pub resource: Option<String>,
    #[serde(serialize_with = "unix_seconds")]
    pub tstamp: Timestamp,
    pub action_type: ActionType,
}

impl From<Action> for GraphHistoryRow {
    fn from(action: Action) -> Self {
        Self {
            id: action.id,
            user: action.user,
            resource: action.resource,
            tstamp: action.timestamp,
            action_type: action.action_type,
        }
    }
}

impl From<Action> for ResourceHistoryRow {
    fn from(action: Action) -> Self {
        Self {
            id: action.id,
            user: action.user,
            tstamp: action.timestamp,
            action_type: action.action_type,
        }
    }
}

impl From<Action> for UserHistoryRow {
    fn from(action: Action) -> Self {
        Self {
            id: action.id,
            resource: action.resource,
            tstamp: action.timestamp,
            action_type: action.action_type,
        }
    }
}

/// An action together with its payload, `None` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDetails {
    pub action: Action,
    pub payload: Option<StatementSet>,
}

fn project<R: From<Action>>(actions: Vec<Action>) -> Vec<R> {
    actions.into_iter().map(R::from).collect()
}

impl<L: ActionLog> Versioning<L> {
    // ========================================================================
    // History Queries (newest first, at most `limit` rows)
    // ========================================================================

    pub fn history_for_graph(&self, graph: &str) -> Result<Vec<GraphHistoryRow>, EngineError> {
        self.history_for_graph_page(graph, 1)
    }

    /// 1-based page of [`Self::history_for_graph`].
    pub fn history_for_graph_page(
        &self,
        graph: &str,
        page: usize,
    ) -> Result<Vec<GraphHistoryRow>, EngineError> {
        let window = HistoryWindow::page(self.limit, page);
        Ok(project(self.log.actions_for_graph(graph, window)?))
    }

    pub fn history_for_resource(
        &self,
        resource: &str,
        graph: &str,
    ) -> Result<Vec<ResourceHistoryRow>, EngineError> {
        self.history_for_resource_page(resource, graph, 1)
    }

    pub fn history_for_resource_page(
        &self,
        resource: &str,
        graph: &str,
        page: usize,
    ) -> Result<Vec<ResourceHistoryRow>, EngineError> {
        let window = HistoryWindow::page(self.limit, page);
        Ok(project(self.log.actions_for_resource(resource, graph, window)?))
    }

    pub fn history_for_user(&self, user: &str) -> Result<Vec<UserHistoryRow>, EngineError> {
        self.history_for_user_page(user, 1)
    }

    pub fn history_for_user_page(
        &self,
        user: &str,
        page: usize,
    ) -> Result<Vec<UserHistoryRow>, EngineError> {
        let window = HistoryWindow::page(self.limit, page);
        Ok(project(self.log.actions_for_user(user, window)?))
    }

    /// Most recent action on `resource` in `graph`, `None` if never modified.
    pub fn last_modified_for_resource(
        &self,
        resource: &str,
        graph: &str,
    ) -> Result<Option<ResourceHistoryRow>, EngineError> {
        let newest = self
            .log
            .actions_for_resource(resource, graph, HistoryWindow::first(1))?;
        Ok(newest.into_iter().next().map(ResourceHistoryRow::from))
    }

    pub fn details_for_action(&self, id: ActionId) -> Result<ActionDetails, EngineError> {
        let action = self
            .log
            .get_action(id)?
            .ok_or(EngineError::UnknownAction(id))?;
        let payload = self.log.get_payload(id)?;
        Ok(ActionDetails { action, payload })
    }
}
