//! # Generic Resource API
//!
//! Plain CRUD over a `/api/v1/<name>` collection. Brands, suppliers,
//! shelves, compatible models and expenses all share it.

use std::marker::PhantomData;

use partsdesk_core::pagination::ListQuery;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Draft, Identified};
use crate::error::ClientResult;
use crate::http::{parse_item, ApiClient, Page};

/// CRUD client for one collection.
///
/// ## Usage
/// ```rust,ignore
/// let brands = api.brands();
/// let page = brands.list(&ListQuery::new(1, 10)).await?;
/// let honda = brands.create(&NameDraft::new("Honda")).await?;
/// ```
#[derive(Debug)]
pub struct ResourceApi<T> {
    client: ApiClient,
    path: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceApi<T> {
    fn clone(&self) -> Self {
        ResourceApi {
            client: self.client.clone(),
            path: self.path,
            _record: PhantomData,
        }
    }
}

impl<T> ResourceApi<T>
where
    T: DeserializeOwned + Identified + Send,
{
    pub fn new(client: ApiClient, path: &'static str) -> Self {
        ResourceApi {
            client,
            path,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.path, id)
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<Page<T>> {
        self.client.get_list(self.path, query).await
    }

    /// Every row, for dropdowns.
    pub async fn all(&self) -> ClientResult<Vec<T>> {
        self.client.get_all(self.path).await
    }

    pub async fn get(&self, id: i64) -> ClientResult<T> {
        self.client.get_item(&self.item_path(id)).await
    }

    /// Validates locally, then creates.
    pub async fn create<D: Draft>(&self, draft: &D) -> ClientResult<T> {
        draft.validate()?;
        let body: serde_json::Value = self.client.post(self.path, draft).await?;
        let created: T = parse_item(body)?;
        debug!(path = self.path, id = created.id(), "Record created");
        Ok(created)
    }

    pub async fn update<D: Draft>(&self, id: i64, draft: &D) -> ClientResult<T> {
        draft.validate()?;
        let body: serde_json::Value = self.client.put(&self.item_path(id), draft).await?;
        parse_item(body)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client.delete(&self.item_path(id)).await?;
        debug!(path = self.path, id, "Record deleted");
        Ok(())
    }
}
