use graphlog_core::{Action, ActionDraft, ActionId, PayloadCapture, StatementSet, Timestamp};

use crate::error::StorageError;

/// Slice of a newest-first history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl HistoryWindow {
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    /// 1-based page of `limit` rows. Page 0 is treated as page 1.
    pub fn page(limit: usize, page: usize) -> Self {
        Self {
            limit,
            offset: page.saturating_sub(1).saturating_mul(limit),
        }
    }
}

/// Persistence for action records and their payloads.
pub trait ActionLog {
    /// Persist an action together with its payload. Both are written or
    /// neither is. A suppressed capture stores no payload row.
    fn append_action(
        &mut self,
        draft: &ActionDraft,
        payload: &PayloadCapture,
    ) -> Result<ActionId, StorageError>;

    fn get_action(&self, id: ActionId) -> Result<Option<Action>, StorageError>;

    /// `None` when the action has no payload or does not exist.
    fn get_payload(&self, id: ActionId) -> Result<Option<StatementSet>, StorageError>;

    fn actions_for_graph(
        &self,
        graph: &str,
        window: HistoryWindow,
    ) -> Result<Vec<Action>, StorageError>;

    fn actions_for_resource(
        &self,
        resource: &str,
        graph: &str,
        window: HistoryWindow,
    ) -> Result<Vec<Action>, StorageError>;

    fn actions_for_user(&self, user: &str, window: HistoryWindow)
    -> Result<Vec<Action>, StorageError>;

    fn action_count(&self) -> Result<u64, StorageError>;

    /// Newest timestamp on record, used to seed the clock after a reopen.
    fn latest_timestamp(&self) -> Result<Option<Timestamp>, StorageError>;
}
