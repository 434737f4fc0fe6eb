//! Session manager: current-session binding and session history.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::StoreGateway;
use crate::domain::{Error, IdentityRegistry, SessionId, SessionSummary, UserId, Username, keys};

/// Starts and stops user sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn StoreGateway>,
    identity: IdentityRegistry,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create a session manager.
    pub fn new(
        store: Arc<dyn StoreGateway>,
        identity: IdentityRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            identity,
            clock,
        }
    }

    /// Allocate a session, make it current and append it to the history.
    pub async fn start_session(&self, username: &Username) -> Result<SessionId, Error> {
        let user_id = self.identity.resolve(username).await?;
        let session_id = SessionId::new(self.store.incr(keys::NEXT_SESSION_ID).await?);
        self.store
            .hset(
                &keys::user(user_id),
                &[(
                    keys::FIELD_CURRENT_SESSION.to_owned(),
                    session_id.to_string(),
                )],
            )
            .await?;
        self.store
            .zadd(
                &keys::user_sessions(user_id),
                &session_id.to_string(),
                self.clock.utc().timestamp(),
            )
            .await?;

        info!(username = %username, session_id = %session_id, "session started");
        Ok(session_id)
    }

    /// Clear the current-session pointer; the history entry is kept.
    pub async fn stop_session(&self, username: &Username) -> Result<(), Error> {
        let user_id = self.identity.resolve(username).await?;
        self.store
            .hdel(&keys::user(user_id), keys::FIELD_CURRENT_SESSION)
            .await?;
        info!(username = %username, "session stopped");
        Ok(())
    }

    /// Session history ascending by start time.
    pub async fn list_sessions(&self, username: &Username) -> Result<Vec<SessionSummary>, Error> {
        let user_id = self.identity.resolve(username).await?;
        self.store
            .zrange_with_scores(&keys::user_sessions(user_id))
            .await?
            .into_iter()
            .map(|(member, started_at)| -> Result<SessionSummary, Error> {
                Ok(SessionSummary {
                    session_id: keys::parse_stored(&member, "session id")?,
                    started_at,
                })
            })
            .collect()
    }

    /// The session reports are currently appended to, if any.
    pub async fn current_session(&self, user_id: UserId) -> Result<Option<SessionId>, Error> {
        self.store
            .hget(&keys::user(user_id), keys::FIELD_CURRENT_SESSION)
            .await?
            .map(|raw| keys::parse_stored(&raw, "current session id"))
            .transpose()
    }
}
