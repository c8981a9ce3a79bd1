use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::error::CoreError;
use crate::ids::ActionId;
use crate::statement::StatementSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    StatementAdded,
    StatementRemoved,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatementAdded => "statement_added",
            Self::StatementRemoved => "statement_removed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "statement_added" => Ok(Self::StatementAdded),
            "statement_removed" => Ok(Self::StatementRemoved),
            _ => Err(CoreError::InvalidData(format!("unknown action type: {s}"))),
        }
    }

    /// The type whose application undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Self::StatementAdded => Self::StatementRemoved,
            Self::StatementRemoved => Self::StatementAdded,
        }
    }
}

/// The statement diff captured for an action. `Suppressed` is a legitimate
/// terminal state: the affected set was too large to enumerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadCapture {
    Captured(StatementSet),
    Suppressed,
}

impl PayloadCapture {
    pub fn empty() -> Self {
        Self::Captured(StatementSet::new())
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }

    pub fn statements(&self) -> Option<&StatementSet> {
        match self {
            Self::Captured(set) => Some(set),
            Self::Suppressed => None,
        }
    }

    /// Fold another capture into this one. Once suppressed, always suppressed.
    pub fn absorb(&mut self, other: PayloadCapture) {
        match other {
            Self::Suppressed => *self = Self::Suppressed,
            Self::Captured(theirs) => {
                if let Self::Captured(mine) = self {
                    mine.merge(&theirs);
                }
            }
        }
    }
}

/// Everything about an action except the id, which the log assigns when
/// the draft is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDraft {
    pub action_type: ActionType,
    pub user: Option<String>,
    pub graph: String,
    pub resource: Option<String>,
    pub timestamp: Timestamp,
    pub rollback_of: Option<ActionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub action_type: ActionType,
    pub user: Option<String>,
    pub graph: String,
    pub resource: Option<String>,
    pub timestamp: Timestamp,
    pub rollback_of: Option<ActionId>,
}

impl Action {
    pub fn from_draft(id: ActionId, draft: ActionDraft) -> Self {
        Self {
            id,
            action_type: draft.action_type,
            user: draft.user,
            graph: draft.graph,
            resource: draft.resource,
            timestamp: draft.timestamp,
            rollback_of: draft.rollback_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{Statement, Term};

    #[test]
    fn action_type_names_roundtrip() {
        for ty in [ActionType::StatementAdded, ActionType::StatementRemoved] {
            assert_eq!(ActionType::parse(ty.as_str()).unwrap(), ty);
            assert_eq!(ty.inverse().inverse(), ty);
            assert_ne!(ty.inverse(), ty);
        }
        assert!(ActionType::parse("statement_changed").is_err());
    }

    #[test]
    fn suppression_is_sticky() {
        let one = StatementSet::from(Statement::new("r1", "p1", Term::literal("a")));

        let mut capture = PayloadCapture::empty();
        capture.absorb(PayloadCapture::Captured(one.clone()));
        assert_eq!(capture.statements().map(StatementSet::len), Some(1));

        capture.absorb(PayloadCapture::Suppressed);
        assert!(capture.is_suppressed());

        capture.absorb(PayloadCapture::Captured(one));
        assert!(capture.is_suppressed());
        assert!(capture.statements().is_none());
    }
}
