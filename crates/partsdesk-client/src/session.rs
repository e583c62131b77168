//! # Session
//!
//! Who is logged in, and whether they may open a page.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 ┌──────────┐                                            │
//! │   startup ─────►│ Loading  │                                            │
//! │                 └────┬─────┘                                            │
//! │                      │ verify(): GET /api/auth/me with `token` cookie   │
//! │          ┌───────────┴────────────┐                                     │
//! │          ▼ 200                    ▼ no cookie / 401 / network error     │
//! │  ┌───────────────┐         ┌───────────┐                                │
//! │  │ Authenticated │◄─login──│ Anonymous │  (cookie cleared)              │
//! │  │    (User)     │──logout►│           │                                │
//! │  └───────────────┘         └───────────┘                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Gatekeeper`] runs before every navigation. It asks the server again
//! instead of trusting the in-memory state, so a cookie revoked server-side
//! takes effect on the next page change.

use std::sync::{Arc, PoisonError, RwLock};

use partsdesk_core::auth_gate::{self, GateDecision, RouteKind, SessionState};
use partsdesk_core::{LoginRequest, User};
use tracing::{debug, info, warn};

use crate::error::ClientResult;
use crate::http::ApiClient;

/// Shared session state.
///
/// Clones share the state, like the `ApiClient` they wrap.
#[derive(Debug, Clone)]
pub struct AuthContext {
    api: ApiClient,
    state: Arc<RwLock<SessionState>>,
}

impl AuthContext {
    pub fn new(api: ApiClient) -> Self {
        AuthContext {
            api,
            state: Arc::new(RwLock::new(SessionState::Loading)),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Checks the cookie with the server.
    ///
    /// Any failure leaves the session anonymous and drops the cookie, so a
    /// stale token is never sent again.
    pub async fn verify(&self) -> SessionState {
        if !self.api.has_token() {
            debug!("No session cookie");
            self.set_state(SessionState::Anonymous);
            return SessionState::Anonymous;
        }

        let state = match self.api.auth().me().await {
            Ok(user) => {
                debug!(user = %user.username, "Session verified");
                SessionState::Authenticated(user)
            }
            Err(err) => {
                warn!(error = %err, "Session verification failed, clearing cookie");
                self.api.clear_token();
                SessionState::Anonymous
            }
        };
        self.set_state(state.clone());
        state
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        match self.api.auth().login(request).await {
            Ok(user) => {
                info!(user = %user.username, admin = user.is_admin(), "Logged in");
                self.set_state(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(err) => {
                self.api.clear_token();
                self.set_state(SessionState::Anonymous);
                Err(err)
            }
        }
    }

    /// Logs out. The local session ends even when the server call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.api.auth().logout().await;
        self.set_state(SessionState::Anonymous);
        info!("Logged out");
        result
    }
}

// =============================================================================
// Gatekeeper
// =============================================================================

/// Request-time route guard.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    auth: AuthContext,
}

impl Gatekeeper {
    pub fn new(auth: AuthContext) -> Self {
        Gatekeeper { auth }
    }

    /// Decides whether `path` may be opened.
    ///
    /// Static assets pass without a server round trip; everything else
    /// re-verifies the cookie first.
    pub async fn check(&self, path: &str) -> GateDecision {
        if auth_gate::classify(path) == RouteKind::Asset {
            return GateDecision::Allow;
        }

        let session = self.auth.verify().await;
        let decision = auth_gate::decide(path, &session);
        if let GateDecision::Redirect(to) = &decision {
            debug!(path, to = %to, "Navigation redirected");
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn context() -> AuthContext {
        AuthContext::new(ApiClient::new(&ClientConfig::default()).unwrap())
    }

    #[test]
    fn test_starts_loading() {
        let auth = context();
        assert!(auth.state().is_loading());
        assert!(!auth.is_authenticated());
        assert!(auth.user().is_none());
    }

    #[tokio::test]
    async fn test_verify_without_cookie_is_anonymous() {
        let auth = context();
        assert_eq!(auth.verify().await, SessionState::Anonymous);
        assert_eq!(auth.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_assets_pass_without_session() {
        let gate = Gatekeeper::new(context());
        assert_eq!(gate.check("/_next/static/app.js").await, GateDecision::Allow);
        assert_eq!(
            gate.check("/products").await,
            GateDecision::Redirect("/login".to_string())
        );
    }
}
