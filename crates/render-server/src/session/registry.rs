//! Session registry
//!
//! Owned by the supervisor and touched only from its task, so a plain map is
//! enough. Finished sessions are reaped lazily by [`SessionRegistry::sweep`]
//! each time a new one is added; [`SessionRegistry::drain`] waits for the
//! rest at shutdown.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use render_core::error::SessionError;
use render_core::SessionId;

use super::handle::Session;

/// Tracks running worker sessions
#[derive(Debug)]
pub struct SessionRegistry {
    /// Sessions indexed by ID
    sessions: HashMap<SessionId, Session>,
    /// Next ID to hand out
    next_id: SessionId,
    /// Cap on running sessions
    max_sessions: Option<u32>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(max_sessions: Option<u32>) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: SessionId::new(1),
            max_sessions,
        }
    }

    /// Allocate the ID for the next session
    pub fn allocate_id(&mut self) -> SessionId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Number of tracked sessions whose worker is still running
    pub fn running(&self) -> usize {
        self.sessions.values().filter(|s| !s.is_finished()).count()
    }

    /// Fail if starting one more session would exceed the cap
    ///
    /// Finished-but-unreaped sessions don't count against the cap.
    pub fn check_capacity(&self) -> Result<(), SessionError> {
        match self.max_sessions {
            Some(limit) if self.running() >= limit as usize => {
                Err(SessionError::LimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    /// Track a started session
    ///
    /// A session whose ID is already tracked is handed back untouched.
    pub fn insert(&mut self, session: Session) -> Result<(), Session> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(_) => Err(session),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    /// Remove and release every session that has finished
    ///
    /// Returns the number of sessions reaped.
    pub fn sweep(&mut self) -> usize {
        let finished: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_finished())
            .map(|(id, _)| *id)
            .collect();

        for id in &finished {
            if let Some(mut session) = self.sessions.remove(id) {
                match session.try_exit_status() {
                    Some(Ok(status)) => {
                        tracing::debug!(
                            "Reaped {} (exit status {}, ran {:?})",
                            id,
                            status,
                            session.uptime()
                        );
                    }
                    Some(Err(e)) => tracing::warn!("Reaped {}: {}", id, e),
                    None => tracing::debug!("Reaped {}", id),
                }
            }
        }

        finished.len()
    }

    /// Wait for every session to finish, then forget them all
    ///
    /// Returns the number of sessions joined. There is no timeout: draining
    /// waits for workers to end on their own.
    pub async fn drain(&mut self) -> usize {
        let sessions: Vec<Session> = self.sessions.drain().map(|(_, s)| s).collect();
        let count = sessions.len();

        if count > 0 {
            tracing::info!("Waiting for {} session(s) to finish", count);
        }

        for session in sessions {
            let id = session.id();
            match session.join().await {
                Ok(status) => tracing::debug!("{} finished with exit status {}", id, status),
                Err(e) => tracing::warn!("{}", e),
            }
        }

        count
    }

    /// Whether a session is tracked
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// IDs of every tracked session
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Number of tracked sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
