pub mod action;
pub mod clock;
pub mod error;
pub mod event;
pub mod ids;
pub mod statement;

pub use action::{Action, ActionDraft, ActionType, PayloadCapture};
pub use clock::{Clock, Timestamp};
pub use error::CoreError;
pub use event::{DeletedMatch, MutationEvent};
pub use ids::ActionId;
pub use statement::{Statement, StatementSet, Term, TermKind};
