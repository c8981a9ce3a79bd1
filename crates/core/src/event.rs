use crate::action::{ActionType, PayloadCapture};
use crate::statement::{Statement, StatementSet};

/// What a delete-matching notification knows about the removed statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletedMatch {
    /// The removed statements, with the resource the match was made
    /// against when the pattern named one.
    Statements {
        resource: Option<String>,
        statements: StatementSet,
    },
    /// The store decided the matching set was too large to enumerate and
    /// only reports the resource it was matched against.
    Unenumerated { resource: String },
}

/// A mutation notification emitted by the graph store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    AddStatement {
        graph: String,
        statement: Statement,
    },
    AddMultipleStatements {
        graph: String,
        statements: StatementSet,
    },
    DeleteMatchingStatements {
        graph: String,
        matched: DeletedMatch,
    },
    DeleteMultipleStatements {
        graph: String,
        statements: StatementSet,
    },
}

impl MutationEvent {
    pub fn graph(&self) -> &str {
        match self {
            Self::AddStatement { graph, .. }
            | Self::AddMultipleStatements { graph, .. }
            | Self::DeleteMatchingStatements { graph, .. }
            | Self::DeleteMultipleStatements { graph, .. } => graph,
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::AddStatement { .. } | Self::AddMultipleStatements { .. } => {
                ActionType::StatementAdded
            }
            Self::DeleteMatchingStatements { .. } | Self::DeleteMultipleStatements { .. } => {
                ActionType::StatementRemoved
            }
        }
    }

    /// String name of the notification for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::AddStatement { .. } => "add_statement",
            Self::AddMultipleStatements { .. } => "add_multiple_statements",
            Self::DeleteMatchingStatements { .. } => "delete_matching_statements",
            Self::DeleteMultipleStatements { .. } => "delete_multiple_statements",
        }
    }

    /// The single resource this notification is about, if there is one.
    /// Notifications spanning several resources have no resource context.
    pub fn resource_context(&self) -> Option<&str> {
        match self {
            Self::AddStatement { statement, .. } => Some(&statement.resource),
            Self::DeleteMatchingStatements {
                matched: DeletedMatch::Unenumerated { resource },
                ..
            } => Some(resource),
            Self::DeleteMatchingStatements {
                matched:
                    DeletedMatch::Statements {
                        resource,
                        statements,
                    },
                ..
            } => resource.as_deref().or_else(|| statements.single_resource()),
            Self::AddMultipleStatements { statements, .. }
            | Self::DeleteMultipleStatements { statements, .. } => statements.single_resource(),
        }
    }

    pub fn capture(&self) -> PayloadCapture {
        match self {
            Self::AddStatement { statement, .. } => {
                PayloadCapture::Captured(StatementSet::from(statement.clone()))
            }
            Self::DeleteMatchingStatements {
                matched: DeletedMatch::Unenumerated { .. },
                ..
            } => PayloadCapture::Suppressed,
            Self::DeleteMatchingStatements {
                matched: DeletedMatch::Statements { statements, .. },
                ..
            }
            | Self::AddMultipleStatements { statements, .. }
            | Self::DeleteMultipleStatements { statements, .. } => {
                PayloadCapture::Captured(statements.clone())
            }
        }
    }
}
