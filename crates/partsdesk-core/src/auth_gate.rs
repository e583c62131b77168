//! # Route Gate Policy
//!
//! Decides, for a requested path and the current session, whether the page
//! may render or where the user should be sent instead.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Path kind          Anonymous         User            Admin             │
//! │  ─────────          ─────────         ────            ─────             │
//! │  asset (/_next,..)  Allow             Allow           Allow             │
//! │  /login             Allow             → /             → /               │
//! │  protected          → /login          Allow           Allow             │
//! │  admin-only         → /login          → /             Allow             │
//! │                                                                         │
//! │  Session still Loading → Pending (render nothing yet)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The policy is a pure function. Verifying the cookie against the backend
//! is done by the client crate before calling [`decide`].

use crate::types::User;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Landing page for authenticated users.
pub const HOME_PATH: &str = "/";

/// Screens only `ROLE_ADMIN` may open.
pub const ADMIN_PREFIXES: &[&str] = &["/users", "/signup", "/expenses", "/reports"];

const ASSET_PREFIXES: &[&str] = &["/_next", "/static", "/assets", "/api", "/favicon"];

const ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".map", ".png", ".jpg", ".jpeg", ".svg", ".ico", ".webp", ".woff", ".woff2",
];

/// What is known about the current visitor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Verification has not completed yet.
    #[default]
    Loading,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
    /// Session unknown yet; show nothing until it resolves.
    Pending,
}

impl GateDecision {
    fn redirect(to: &str) -> Self {
        GateDecision::Redirect(to.to_string())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    /// Where to send the visitor instead, if anywhere.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GateDecision::Redirect(to) => Some(to.as_str()),
            _ => None,
        }
    }
}

/// Kinds of paths the gate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Asset,
    Login,
    Protected,
    AdminOnly,
}

/// Classifies a request path. Query strings and fragments are ignored.
pub fn classify(path: &str) -> RouteKind {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = if path.is_empty() { HOME_PATH } else { path };

    if ASSET_PREFIXES.iter().any(|p| has_segment_prefix(path, p))
        || ASSET_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    {
        return RouteKind::Asset;
    }

    if has_segment_prefix(path, LOGIN_PATH) {
        return RouteKind::Login;
    }

    if ADMIN_PREFIXES.iter().any(|p| has_segment_prefix(path, p)) {
        return RouteKind::AdminOnly;
    }

    RouteKind::Protected
}

/// `/users` matches `/users` and `/users/3`, not `/usersettings`.
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Applies the decision table.
///
/// ## Example
/// ```rust
/// use partsdesk_core::auth_gate::{decide, GateDecision, SessionState};
///
/// assert_eq!(
///     decide("/products", &SessionState::Anonymous),
///     GateDecision::Redirect("/login".to_string())
/// );
/// assert_eq!(decide("/login", &SessionState::Anonymous), GateDecision::Allow);
/// ```
pub fn decide(path: &str, session: &SessionState) -> GateDecision {
    let kind = classify(path);
    if kind == RouteKind::Asset {
        return GateDecision::Allow;
    }

    let user = match session {
        SessionState::Loading => return GateDecision::Pending,
        SessionState::Anonymous => None,
        SessionState::Authenticated(user) => Some(user),
    };

    match (kind, user) {
        (RouteKind::Login, Some(_)) => GateDecision::redirect(HOME_PATH),
        (RouteKind::Login, None) => GateDecision::Allow,
        (_, None) => GateDecision::redirect(LOGIN_PATH),
        (RouteKind::AdminOnly, Some(user)) if !user.is_admin() => {
            GateDecision::redirect(HOME_PATH)
        }
        _ => GateDecision::Allow,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
