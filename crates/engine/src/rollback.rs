use graphlog_core::{Action, ActionDraft, ActionId, ActionType, PayloadCapture, StatementSet};
use graphlog_storage::ActionLog;

use crate::Versioning;
use crate::collab::GraphStore;
use crate::error::EngineError;

/// The mutation that undoes a recorded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseMutation {
    pub graph: String,
    /// Type of the mutation to apply, the inverse of the recorded one.
    pub action_type: ActionType,
    pub statements: StatementSet,
}

impl InverseMutation {
    /// Added statements are deleted, removed statements are re-added with
    /// their original datatype and language.
    pub fn for_action(action: &Action, payload: StatementSet) -> Self {
        Self {
            graph: action.graph.clone(),
            action_type: action.action_type.inverse(),
            statements: payload,
        }
    }

    /// One call into the store, which applies all statements or none.
    pub fn apply<G: GraphStore + ?Sized>(&self, store: &mut G) -> Result<(), EngineError> {
        let result = match self.action_type {
            ActionType::StatementAdded => store.add_statements(&self.graph, &self.statements),
            ActionType::StatementRemoved => store.delete_statements(&self.graph, &self.statements),
        };
        result.map_err(|e| EngineError::Store(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub action_id: ActionId,
    /// Type of the mutation applied to the store.
    pub applied: ActionType,
    pub statements: usize,
    /// Compensating action, when rollbacks are recorded.
    pub recorded: Option<ActionId>,
}

impl<L: ActionLog> Versioning<L> {
    /// Compute the inverse of a recorded action without applying it.
    pub fn inverse_of(&self, id: ActionId) -> Result<InverseMutation, EngineError> {
        let action = self
            .log
            .get_action(id)?
            .ok_or(EngineError::UnknownAction(id))?;
        let payload = self
            .log
            .get_payload(id)?
            .ok_or(EngineError::NoPayload(id))?;
        Ok(InverseMutation::for_action(&action, payload))
    }

    /// Apply the inverse of `id` to `store`.
    ///
    /// When rollbacks are recorded, the compensating action is prepared
    /// before the store is touched. If it cannot be persisted after the
    /// inverse was applied, the error is [`EngineError::RollbackNotRecorded`];
    /// any other error means the store is unchanged.
    pub fn rollback_action<G: GraphStore + ?Sized>(
        &mut self,
        id: ActionId,
        store: &mut G,
    ) -> Result<RollbackReport, EngineError> {
        let inverse = self.inverse_of(id)?;

        let draft = if self.record_rollbacks && self.enabled {
            Some(ActionDraft {
                action_type: inverse.action_type,
                user: self.auth.current_user(),
                graph: inverse.graph.clone(),
                resource: inverse.statements.single_resource().map(str::to_string),
                timestamp: self.clock.tick()?,
                rollback_of: Some(id),
            })
        } else {
            None
        };

        if !inverse.statements.is_empty() {
            inverse.apply(store)?;
        }

        let recorded = match draft {
            Some(draft) => {
                let payload = PayloadCapture::Captured(inverse.statements.clone());
                let recorded = self.log.append_action(&draft, &payload).map_err(|e| {
                    tracing::warn!(action_id = %id, error = %e, "rollback applied but not recorded");
                    EngineError::RollbackNotRecorded {
                        action_id: id,
                        source: Box::new(e.into()),
                    }
                })?;
                Some(recorded)
            }
            None => None,
        };

        tracing::info!(
            action_id = %id,
            graph = %inverse.graph,
            action_type = inverse.action_type.as_str(),
            statements = inverse.statements.len(),
            recorded = recorded.is_some(),
            "action rolled back"
        );

        Ok(RollbackReport {
            action_id: id,
            applied: inverse.action_type,
            statements: inverse.statements.len(),
            recorded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlog_core::{Statement, Term, Timestamp};

    fn action(action_type: ActionType) -> Action {
        Action {
            id: ActionId::new(),
            action_type,
            user: None,
            graph: "http://example.org/".into(),
            resource: None,
            timestamp: Timestamp::new(1, 0),
            rollback_of: None,
        }
    }

    #[test]
    fn inverse_of_add_deletes_same_statements() {
        let payload = StatementSet::from(Statement::new("r1", "p1", Term::literal("a")));
        let inverse =
            InverseMutation::for_action(&action(ActionType::StatementAdded), payload.clone());
        assert_eq!(inverse.action_type, ActionType::StatementRemoved);
        assert_eq!(inverse.graph, "http://example.org/");
        assert_eq!(inverse.statements, payload);
    }

    #[test]
    fn inverse_of_remove_keeps_literal_metadata() {
        let value = Term::literal("1.5")
            .with_datatype("http://www.w3.org/2001/XMLSchema#decimal");
        let tagged = Term::literal("Wert").with_language("de");
        let payload: StatementSet = [
            Statement::new("r1", "p1", value.clone()),
            Statement::new("r1", "p2", tagged.clone()),
        ]
        .into_iter()
        .collect();

        let inverse = InverseMutation::for_action(&action(ActionType::StatementRemoved), payload);
        assert_eq!(inverse.action_type, ActionType::StatementAdded);
        assert!(inverse.statements.contains(&Statement::new("r1", "p1", value)));
        assert!(inverse.statements.contains(&Statement::new("r1", "p2", tagged)));
    }
}
