//! # Auth API
//!
//! Raw calls behind the session context. The backend sets and clears the
//! `token` cookie; [`ApiClient`] picks it up from `Set-Cookie`.

use partsdesk_core::{LoginRequest, SignupRequest, User};
use serde::Deserialize;
use tracing::debug;

use super::{routes, Draft};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// The shapes `/login`, `/me` and `/signup` answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserBody {
    User { user: User },
    Data { data: User },
    Raw(User),
}

impl From<UserBody> for User {
    fn from(body: UserBody) -> Self {
        match body {
            UserBody::User { user } | UserBody::Data { data: user } | UserBody::Raw(user) => user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        AuthApi { client }
    }

    /// Logs in and returns the user.
    ///
    /// Some backends answer `/login` with only a message; the user is then
    /// read from `/me` with the freshly set cookie.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        request.validate()?;
        let body: serde_json::Value = self.client.post(routes::LOGIN, request).await?;

        if !self.client.has_token() {
            if let Some(token) = body.get("token").and_then(|t| t.as_str()) {
                self.client.set_token(token);
            }
        }
        if !self.client.has_token() {
            return Err(ClientError::InvalidResponse(
                "login succeeded without a token cookie".to_string(),
            ));
        }

        match serde_json::from_value::<UserBody>(body) {
            Ok(user) => Ok(user.into()),
            Err(_) => {
                debug!("Login response carried no user, asking /me");
                self.me().await
            }
        }
    }

    /// The user the current cookie belongs to.
    pub async fn me(&self) -> ClientResult<User> {
        let body: UserBody = self.client.get(routes::ME).await?;
        Ok(body.into())
    }

    /// Ends the server session. The local token is dropped even if the
    /// request fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result: ClientResult<serde_json::Value> = self.client.post_empty(routes::LOGOUT).await;
        self.client.clear_token();
        result.map(|_| ())
    }

    /// Creates a user (admin only).
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<User> {
        Draft::validate(request)?;
        let body: UserBody = self.client.post(routes::SIGNUP, request).await?;
        Ok(body.into())
    }
}
