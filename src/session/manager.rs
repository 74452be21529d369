use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::clock::Clock;
use super::token;
use crate::api::InventoryApi;
use crate::domain::Credentials;
use crate::error::{SessionError, StoreError};
use crate::store::KeyValueStore;

pub const TOKEN_KEY: &str = "auth_token";
pub const USERNAME_KEY: &str = "username";

/// What the rest of the client is told about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated { username: String },
    Unauthenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { username } => Some(username),
            SessionState::Unauthenticated => None,
        }
    }
}

/// A persisted token and the username it was issued to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: String,
    /// Derived from the token's `exp` claim; `None` when it cannot be read.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(token: String, username: String) -> Self {
        let expires_at = token::decode_claims(&token)
            .ok()
            .and_then(|claims| claims.expires_at());
        Self {
            token,
            username,
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now < expiry)
    }
}

/// Single owner of the session keys and of the session broadcast.
///
/// The broadcast is a `watch` channel: every subscriber sees the current value
/// immediately and then each transition.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn InventoryApi>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Reads the persisted keys and publishes the initial state.
    #[instrument(name = "session_init", skip_all)]
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn InventoryApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        let manager = Self {
            store,
            api,
            clock,
            state,
        };
        let initial = manager.evaluate();
        info!(authenticated = initial.is_authenticated(), "Session initialized");
        manager.publish(initial);
        manager
    }

    /// Logs in and persists the returned token and username together.
    ///
    /// On failure nothing is persisted and the broadcast state is untouched.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session, SessionError> {
        debug!("Processing login request");
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login rejected");
                return Err(e.into());
            }
        };

        self.persist(&response.token, &response.username)?;
        let session = Session::new(response.token, response.username);
        self.publish(SessionState::Authenticated {
            username: session.username.clone(),
        });
        info!(expires_at = ?session.expires_at, "Logged in");
        Ok(session)
    }

    /// Removes both keys and broadcasts the unauthenticated state.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), StoreError> {
        self.clear()?;
        self.publish(SessionState::Unauthenticated);
        info!("Logged out");
        Ok(())
    }

    /// Whether the stored token is present, decodable and not yet expired.
    ///
    /// Never fails: any problem reading or decoding the token counts as "not
    /// authenticated". A token found to be unusable is destroyed.
    pub fn is_authenticated(&self) -> bool {
        let state = self.evaluate();
        let authenticated = state.is_authenticated();
        self.publish(state);
        authenticated
    }

    /// Latest broadcast value.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribes to session transitions, starting with the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Username for display purposes.
    pub fn username(&self) -> Option<String> {
        self.store.get(USERNAME_KEY).ok().flatten()
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).ok().flatten()
    }

    pub fn current_session(&self) -> Option<Session> {
        match (self.token(), self.username()) {
            (Some(token), Some(username)) => Some(Session::new(token, username)),
            _ => None,
        }
    }

    /// Reads both keys and decides the state, destroying a session that is
    /// expired, undecodable or only half present.
    fn evaluate(&self) -> SessionState {
        let pair = self
            .store
            .get(TOKEN_KEY)
            .and_then(|token| Ok((token, self.store.get(USERNAME_KEY)?)));

        match pair {
            Ok((Some(token), Some(username))) => {
                if token::is_live(&token, self.clock.now()) {
                    SessionState::Authenticated { username }
                } else {
                    debug!("Stored token expired or unreadable; discarding session");
                    self.discard();
                    SessionState::Unauthenticated
                }
            }
            Ok((None, None)) => SessionState::Unauthenticated,
            Ok(_) => {
                warn!("Only one session key present; discarding session");
                self.discard();
                SessionState::Unauthenticated
            }
            Err(e) => {
                warn!(error = %e, "Could not read session keys");
                SessionState::Unauthenticated
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Could not discard session keys");
        }
    }

    fn persist(&self, token: &str, username: &str) -> Result<(), StoreError> {
        self.store.set(TOKEN_KEY, token)?;
        if let Err(e) = self.store.set(USERNAME_KEY, username) {
            // Without the username the token alone is not a session.
            if let Err(rollback) = self.store.remove(TOKEN_KEY) {
                warn!(error = %rollback, "Could not roll back session token");
            }
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let previous = self.store.get(TOKEN_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        if let Err(e) = self.store.remove(USERNAME_KEY) {
            if let Some(token) = previous {
                if let Err(restore) = self.store.set(TOKEN_KEY, &token) {
                    warn!(error = %restore, "Could not restore session token");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn publish(&self, next: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
        if changed {
            debug!(authenticated = next.is_authenticated(), "Session state changed");
        }
    }
}
