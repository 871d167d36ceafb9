use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::chat::{ModelGateway, Session};
use crate::core::AppConfig;

/// Each session is locked on its own so actions on one session run
/// one at a time without blocking any other session.
pub type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionEntry {
    handle: SessionHandle,
    last_used: std::sync::Mutex<Instant>,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            handle: Arc::new(Mutex::new(session)),
            last_used: std::sync::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_used.lock().expect("Unable to read session clock") = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_used
            .lock()
            .expect("Unable to read session clock")
            .elapsed()
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub gateway: Arc<dyn ModelGateway>,
    pub sessions: HashMap<String, SessionEntry>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            config,
            gateway,
            sessions: HashMap::new(),
        }
    }

    /// Starts an empty session and returns its ID. Sessions idle for
    /// longer than the configured timeout are dropped first.
    pub fn create_session(&mut self) -> String {
        self.evict_idle();
        let session = Session::new(&self.config.system_message);
        let id = session.id().to_string();
        self.sessions.insert(id.clone(), SessionEntry::new(session));
        tracing::info!("Created session {} ({} active)", id, self.sessions.len());
        id
    }

    /// Looks up a session and marks it as in use
    pub fn session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| {
            entry.touch();
            entry.handle.clone()
        })
    }

    pub fn remove_session(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Disposed session {}", id);
        }
        removed
    }

    fn evict_idle(&mut self) {
        let timeout = self.config.session_idle_timeout;
        let before = self.sessions.len();
        // A session an action is still running on stays regardless
        self.sessions
            .retain(|_, entry| entry.idle_for() < timeout || entry.handle.try_lock().is_err());
        let evicted = before - self.sessions.len();
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions", evicted);
        }
    }
}
