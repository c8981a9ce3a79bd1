pub mod collab;
pub mod config;
pub mod error;
pub mod history;
pub mod rollback;
pub mod session;

pub use collab::{Anonymous, GraphStore, MutationObserver, UserProvider};
pub use config::VersioningConfig;
pub use error::EngineError;
pub use history::{ActionDetails, GraphHistoryRow, ResourceHistoryRow, UserHistoryRow};
pub use rollback::{InverseMutation, RollbackReport};
pub use session::{ActionSpec, OpenAction, ResourceScope, Session, SessionState};

use std::sync::Arc;

use graphlog_core::{
    ActionDraft, ActionId, ActionType, Clock, DeletedMatch, MutationEvent, Statement,
    StatementSet,
};
use graphlog_storage::{ActionLog, SqliteStorage};

/// Records store mutations as attributable actions and rolls them back.
///
/// One instance serves one unit of work at a time: its session holds at
/// most one open action. Give each independent request its own instance,
/// or serialize access to a shared one.
pub struct Versioning<L: ActionLog = SqliteStorage> {
    log: L,
    auth: Arc<dyn UserProvider>,
    session: Session,
    clock: Clock,
    enabled: bool,
    limit: usize,
    record_rollbacks: bool,
}

impl<L: ActionLog> Versioning<L> {
    pub fn new(log: L, auth: Arc<dyn UserProvider>) -> Result<Self, EngineError> {
        Self::from_config(log, auth, &VersioningConfig::default())
    }

    pub fn from_config(
        log: L,
        auth: Arc<dyn UserProvider>,
        config: &VersioningConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut clock = Clock::new();
        if let Some(latest) = log.latest_timestamp()? {
            clock.observe(latest);
        }
        Ok(Self {
            log,
            auth,
            session: Session::new(),
            clock,
            enabled: config.enabled,
            limit: config.limit,
            record_rollbacks: config.record_rollbacks,
        })
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn enable_versioning(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_versioning_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fails for `limit < 1`, leaving the current limit in place.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), EngineError> {
        if limit < 1 {
            return Err(EngineError::InvalidLimit(limit));
        }
        self.limit = limit;
        Ok(())
    }

    pub fn records_rollbacks(&self) -> bool {
        self.record_rollbacks
    }

    pub fn set_record_rollbacks(&mut self, record: bool) {
        self.record_rollbacks = record;
    }

    // ========================================================================
    // Explicit Actions
    // ========================================================================

    /// Open an action; notifications until [`Self::end_action`] are grouped into it.
    pub fn start_action(&mut self, action_type: ActionType) -> Result<(), EngineError> {
        self.session.start(ActionSpec::new(action_type))
    }

    pub fn start_action_with(&mut self, spec: ActionSpec) -> Result<(), EngineError> {
        self.session.start(spec)
    }

    pub fn is_action_started(&self) -> bool {
        self.session.is_open()
    }

    /// Close the open action and persist it with its accumulated payload.
    ///
    /// Returns `None` when versioning is disabled or the action never
    /// learned which graph it targets. The session is idle afterwards even
    /// if persisting fails.
    pub fn end_action(&mut self) -> Result<Option<ActionId>, EngineError> {
        let open = self.session.finish()?;
        if !self.enabled {
            return Ok(None);
        }
        let Some(graph) = open.graph else {
            tracing::debug!(
                action_type = open.action_type.as_str(),
                "closed action without a graph, nothing recorded"
            );
            return Ok(None);
        };

        let draft = ActionDraft {
            action_type: open.action_type,
            user: self.auth.current_user(),
            graph,
            resource: open.resource.resource().map(str::to_string),
            timestamp: self.clock.tick()?,
            rollback_of: None,
        };
        let id = self.log.append_action(&draft, &open.capture)?;

        match open.capture.statements() {
            Some(statements) => tracing::info!(
                action_id = %id,
                graph = %draft.graph,
                action_type = draft.action_type.as_str(),
                tstamp = %draft.timestamp,
                statements = statements.len(),
                "action recorded"
            ),
            None => tracing::warn!(
                action_id = %id,
                graph = %draft.graph,
                action_type = draft.action_type.as_str(),
                tstamp = %draft.timestamp,
                "action recorded without payload"
            ),
        }
        Ok(Some(id))
    }

    // ========================================================================
    // Mutation Hooks
    // ========================================================================

    /// Dispatch a notification to its hook.
    pub fn handle(&mut self, event: MutationEvent) -> Result<Option<ActionId>, EngineError> {
        match event {
            MutationEvent::AddStatement { graph, statement } => {
                self.on_add_statement(graph, statement)
            }
            MutationEvent::AddMultipleStatements { graph, statements } => {
                self.on_add_multiple_statements(graph, statements)
            }
            MutationEvent::DeleteMatchingStatements { graph, matched } => {
                self.on_delete_matching_statements(graph, matched)
            }
            MutationEvent::DeleteMultipleStatements { graph, statements } => {
                self.on_delete_multiple_statements(graph, statements)
            }
        }
    }

    pub fn on_add_statement(
        &mut self,
        graph: String,
        statement: Statement,
    ) -> Result<Option<ActionId>, EngineError> {
        self.record(MutationEvent::AddStatement { graph, statement })
    }

    pub fn on_add_multiple_statements(
        &mut self,
        graph: String,
        statements: StatementSet,
    ) -> Result<Option<ActionId>, EngineError> {
        self.record(MutationEvent::AddMultipleStatements { graph, statements })
    }

    pub fn on_delete_matching_statements(
        &mut self,
        graph: String,
        matched: DeletedMatch,
    ) -> Result<Option<ActionId>, EngineError> {
        self.record(MutationEvent::DeleteMatchingStatements { graph, matched })
    }

    pub fn on_delete_multiple_statements(
        &mut self,
        graph: String,
        statements: StatementSet,
    ) -> Result<Option<ActionId>, EngineError> {
        self.record(MutationEvent::DeleteMultipleStatements { graph, statements })
    }

    /// Merge into the open action, or record the notification as an action
    /// of its own. Returns the id of an action persisted by this call.
    fn record(&mut self, event: MutationEvent) -> Result<Option<ActionId>, EngineError> {
        if !self.enabled {
            return Ok(None);
        }
        if self.session.is_open() {
            self.session.merge(&event)?;
            return Ok(None);
        }

        self.session.start(ActionSpec::new(event.action_type()))?;
        if let Err(e) = self.session.merge(&event) {
            let _ = self.session.finish();
            return Err(e);
        }
        self.end_action()
    }
}

impl<L: ActionLog> MutationObserver for Versioning<L> {
    fn observe(&mut self, event: MutationEvent) -> Result<(), EngineError> {
        self.handle(event).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlog_core::Term;

    fn versioning() -> Versioning {
        let storage = SqliteStorage::open_in_memory().unwrap();
        Versioning::new(storage, Arc::new(Anonymous)).unwrap()
    }

    #[test]
    fn versioning_enabled_by_default() {
        let mut v = versioning();
        assert!(v.is_versioning_enabled());
        v.enable_versioning(false);
        assert!(!v.is_versioning_enabled());
        v.enable_versioning(true);
        assert!(v.is_versioning_enabled());
    }

    #[test]
    fn action_started_lifecycle() {
        let mut v = versioning();
        assert!(!v.is_action_started());
        v.start_action(ActionType::StatementAdded).unwrap();
        assert!(v.is_action_started());
        assert_eq!(v.end_action().unwrap(), None);
        assert!(!v.is_action_started());
    }

    #[test]
    fn end_without_start_fails() {
        let mut v = versioning();
        assert!(matches!(v.end_action(), Err(EngineError::NoActionOpen)));
    }

    #[test]
    fn start_while_open_fails() {
        let mut v = versioning();
        v.start_action(ActionType::StatementAdded).unwrap();
        assert!(matches!(
            v.start_action(ActionType::StatementRemoved),
            Err(EngineError::ActionAlreadyOpen)
        ));
        assert!(v.is_action_started());
    }

    #[test]
    fn limit_defaults_and_validation() {
        let mut v = versioning();
        assert_eq!(v.limit(), 10);
        v.set_limit(100).unwrap();
        assert_eq!(v.limit(), 100);
        assert!(matches!(v.set_limit(0), Err(EngineError::InvalidLimit(0))));
        assert_eq!(v.limit(), 100);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let config = VersioningConfig {
            limit: 0,
            ..VersioningConfig::default()
        };
        assert!(matches!(
            Versioning::from_config(storage, Arc::new(Anonymous), &config),
            Err(EngineError::InvalidLimit(0))
        ));
    }

    #[test]
    fn state_machine_runs_while_disabled() {
        let mut v = versioning();
        v.enable_versioning(false);
        v.start_action(ActionType::StatementAdded).unwrap();
        let id = v
            .on_add_statement(
                "g".into(),
                Statement::new("r", "p", Term::literal("v")),
            )
            .unwrap();
        assert_eq!(id, None);
        assert!(v.is_action_started());
        assert_eq!(v.end_action().unwrap(), None);
        assert_eq!(v.log().action_count().unwrap(), 0);
    }

    #[test]
    fn graph_mismatch_keeps_explicit_action_open() {
        let mut v = versioning();
        v.start_action_with(ActionSpec::new(ActionType::StatementAdded).in_graph("g1"))
            .unwrap();
        let err = v
            .on_add_statement("g2".into(), Statement::new("r", "p", Term::literal("v")))
            .unwrap_err();
        assert!(matches!(err, EngineError::GraphMismatch { .. }));
        // The explicit action is still open; the stray notification was not merged.
        assert!(v.is_action_started());
        assert_eq!(v.session().open_action().map(|o| o.merged), Some(0));
    }
}
