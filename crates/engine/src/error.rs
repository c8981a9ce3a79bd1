use graphlog_core::{ActionId, ActionType, CoreError};
use graphlog_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("an action is already open")]
    ActionAlreadyOpen,

    #[error("no action is open")]
    NoActionOpen,

    #[error("invalid history limit {0}: must be at least 1")]
    InvalidLimit(usize),

    #[error("unknown action: {0}")]
    UnknownAction(ActionId),

    #[error("action {0} has no payload to roll back")]
    NoPayload(ActionId),

    #[error("open action targets graph {open}, notification is for {event}")]
    GraphMismatch { open: String, event: String },

    #[error("open action is {}, notification is {}", .open.as_str(), .event.as_str())]
    ActionTypeMismatch { open: ActionType, event: ActionType },

    #[error("rolled back action {action_id} but could not record the rollback: {source}")]
    RollbackNotRecorded {
        action_id: ActionId,
        #[source]
        source: Box<EngineError>,
    },

    #[error("graph store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}
