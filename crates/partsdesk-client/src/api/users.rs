//! # Users API
//!
//! Admin screen for dashboard accounts. Creation goes through
//! [`super::AuthApi::signup`].

use partsdesk_core::pagination::ListQuery;
use partsdesk_core::{User, UserUpdate};

use super::{routes, Draft};
use crate::error::ClientResult;
use crate::http::{parse_item, ApiClient, Page};

#[derive(Debug, Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        UsersApi { client }
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<Page<User>> {
        self.client.get_list(routes::USERS, query).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<User> {
        self.client
            .get_item(&format!("{}/{}", routes::USERS, id))
            .await
    }

    pub async fn update(&self, id: i64, update: &UserUpdate) -> ClientResult<User> {
        update.validate()?;
        let body: serde_json::Value = self
            .client
            .put(&format!("{}/{}", routes::USERS, id), update)
            .await?;
        parse_item(body)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client
            .delete(&format!("{}/{}", routes::USERS, id))
            .await
    }
}
