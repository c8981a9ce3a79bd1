use graphlog_core::{ActionType, MutationEvent, PayloadCapture};

use crate::error::EngineError;

/// What an explicitly opened action is about. Graph and resource may be
/// left for the first notification to fill in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub action_type: ActionType,
    pub graph: Option<String>,
    pub resource: Option<String>,
}

impl ActionSpec {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            graph: None,
            resource: None,
        }
    }

    pub fn in_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    pub fn for_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl From<ActionType> for ActionSpec {
    fn from(action_type: ActionType) -> Self {
        Self::new(action_type)
    }
}

/// Resource an open action is attributed to, narrowed as notifications merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceScope {
    Unset,
    Single(String),
    /// Set by the caller when opening the action; merges do not change it.
    Pinned(String),
    Multiple,
}

impl ResourceScope {
    fn absorb(&mut self, resource: Option<&str>) {
        let next = match (&*self, resource) {
            (Self::Pinned(_) | Self::Multiple, _) => return,
            (_, None) => Self::Multiple,
            (Self::Unset, Some(r)) => Self::Single(r.to_string()),
            (Self::Single(current), Some(r)) if current == r => return,
            (Self::Single(_), Some(_)) => Self::Multiple,
        };
        *self = next;
    }

    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Single(r) | Self::Pinned(r) => Some(r),
            Self::Unset | Self::Multiple => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAction {
    pub action_type: ActionType,
    pub graph: Option<String>,
    pub resource: ResourceScope,
    pub capture: PayloadCapture,
    pub merged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Open(OpenAction),
}

/// One logical unit of work at a time. Carries no locking: share it across
/// threads only behind exclusive access.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn open_action(&self) -> Option<&OpenAction> {
        match &self.state {
            SessionState::Open(open) => Some(open),
            SessionState::Idle => None,
        }
    }

    pub fn start(&mut self, spec: ActionSpec) -> Result<(), EngineError> {
        if self.is_open() {
            return Err(EngineError::ActionAlreadyOpen);
        }
        let resource = match spec.resource {
            Some(r) => ResourceScope::Pinned(r),
            None => ResourceScope::Unset,
        };
        tracing::debug!(action_type = spec.action_type.as_str(), "action opened");
        self.state = SessionState::Open(OpenAction {
            action_type: spec.action_type,
            graph: spec.graph,
            resource,
            capture: PayloadCapture::empty(),
            merged: 0,
        });
        Ok(())
    }

    /// Fold a notification into the open action. Nothing is merged if the
    /// notification targets a different graph or is of the other kind.
    pub fn merge(&mut self, event: &MutationEvent) -> Result<(), EngineError> {
        let SessionState::Open(open) = &mut self.state else {
            return Err(EngineError::NoActionOpen);
        };

        if let Some(graph) = &open.graph
            && graph != event.graph()
        {
            return Err(EngineError::GraphMismatch {
                open: graph.clone(),
                event: event.graph().to_string(),
            });
        }
        if event.action_type() != open.action_type {
            tracing::warn!(
                open = open.action_type.as_str(),
                event = event.kind_name(),
                "notification kind differs from open action type"
            );
            return Err(EngineError::ActionTypeMismatch {
                open: open.action_type,
                event: event.action_type(),
            });
        }

        let capture = event.capture();
        if capture.is_suppressed() && !open.capture.is_suppressed() {
            tracing::warn!(graph = event.graph(), "payload suppressed for open action");
        }

        open.graph.get_or_insert_with(|| event.graph().to_string());
        open.resource.absorb(event.resource_context());
        open.capture.absorb(capture);
        open.merged += 1;
        tracing::debug!(event = event.kind_name(), merged = open.merged, "notification merged");
        Ok(())
    }

    /// Close the open action and hand back what it accumulated.
    pub fn finish(&mut self) -> Result<OpenAction, EngineError> {
        match std::mem::take(&mut self.state) {
            SessionState::Open(open) => {
                tracing::debug!(merged = open.merged, "action closed");
                Ok(open)
            }
            SessionState::Idle => Err(EngineError::NoActionOpen),
        }
    }
}
