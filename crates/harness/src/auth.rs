use std::sync::{Arc, Mutex};

use graphlog_engine::UserProvider;

/// Switchable principal. Clones share the same login state.
#[derive(Debug, Clone, Default)]
pub struct TestAuth {
    user: Arc<Mutex<Option<String>>>,
}

impl TestAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, user: impl Into<String>) {
        if let Ok(mut current) = self.user.lock() {
            *current = Some(user.into());
        }
    }

    pub fn logout(&self) {
        if let Ok(mut current) = self.user.lock() {
            *current = None;
        }
    }
}

impl UserProvider for TestAuth {
    fn current_user(&self) -> Option<String> {
        self.user.lock().ok().and_then(|user| user.clone())
    }
}
