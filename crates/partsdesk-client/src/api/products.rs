//! # Products API
//!
//! Catalogue CRUD plus the low-stock query behind the dashboard badge.

use partsdesk_core::inventory;
use partsdesk_core::pagination::ListQuery;
use partsdesk_core::{Product, ProductDraft};
use tracing::debug;

use super::{routes, Draft};
use crate::error::ClientResult;
use crate::http::{parse_item, parse_list, ApiClient, Page};

#[derive(Debug, Clone)]
pub struct ProductsApi {
    client: ApiClient,
}

impl ProductsApi {
    pub fn new(client: ApiClient) -> Self {
        ProductsApi { client }
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<Page<Product>> {
        self.client.get_list(routes::PRODUCTS, query).await
    }

    /// The whole catalogue, for the store cache and the sale form picker.
    pub async fn all(&self) -> ClientResult<Vec<Product>> {
        self.client.get_all(routes::PRODUCTS).await
    }

    /// First `limit` products matching `term` by name or SKU.
    pub async fn search(&self, term: &str, limit: u32) -> ClientResult<Vec<Product>> {
        let term = partsdesk_core::validation::validate_search_query(term)?;
        let query = ListQuery::new(1, limit).with_search(term);
        Ok(self.list(&query).await?.items)
    }

    pub async fn get(&self, id: i64) -> ClientResult<Product> {
        self.client
            .get_item(&format!("{}/{}", routes::PRODUCTS, id))
            .await
    }

    pub async fn create(&self, draft: &ProductDraft) -> ClientResult<Product> {
        Draft::validate(draft)?;
        let body: serde_json::Value = self.client.post(routes::PRODUCTS, draft).await?;
        parse_item(body)
    }

    pub async fn update(&self, id: i64, draft: &ProductDraft) -> ClientResult<Product> {
        Draft::validate(draft)?;
        let body: serde_json::Value = self
            .client
            .put(&format!("{}/{}", routes::PRODUCTS, id), draft)
            .await?;
        parse_item(body)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        self.client
            .delete(&format!("{}/{}", routes::PRODUCTS, id))
            .await
    }

    /// Products at or below `threshold`, lowest stock first.
    ///
    /// The threshold is sent to the backend and applied again here, so every
    /// screen agrees on what "low" means whatever the backend defaults to.
    pub async fn low_stock(&self, threshold: i64) -> ClientResult<Vec<Product>> {
        let query = [("threshold".to_string(), threshold.to_string())];
        let body: serde_json::Value = self
            .client
            .get_with_query(routes::LOW_STOCK, &query)
            .await?;
        let products: Vec<Product> = parse_list(body)?.items;

        let low: Vec<Product> = inventory::low_stock(&products, threshold)
            .into_iter()
            .cloned()
            .collect();
        debug!(threshold, count = low.len(), "Low-stock products fetched");
        Ok(low)
    }
}
