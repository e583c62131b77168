//! # HTTP Client
//!
//! Thin wrapper over `reqwest` that knows the backend's conventions: the
//! `token` cookie, the error bodies, and the three shapes list endpoints
//! answer with.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  api::products().list(&query)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiClient::request()  ── join path onto base URL                      │
//! │       │                ── attach `Cookie: token=...` if we have one    │
//! │       ▼                                                                 │
//! │  reqwest send ─────────── timeout from ClientConfig                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handle_response()     ── Set-Cookie token=... → remember / forget     │
//! │       │                ── non-2xx → ClientError (see error.rs)         │
//! │       ▼                                                                 │
//! │  parse_list()          ── {data, pagination} | {data} | [..]           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cookie is kept by hand rather than in a cookie jar so the session
//! context can clear it the moment verification fails.

use std::sync::{Arc, PoisonError, RwLock};

use partsdesk_core::pagination::{ListQuery, Pagination};
use partsdesk_core::FieldErrors;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Name of the session cookie set by `/api/auth/login`.
pub const TOKEN_COOKIE: &str = "token";

/// Keys of an error body that describe the error rather than a field.
const NON_FIELD_KEYS: &[&str] = &["message", "error", "status", "timestamp", "path", "code"];

// =============================================================================
// Api Client
// =============================================================================

/// Shared REST client.
///
/// Cloning is cheap; clones share the connection pool and the session
/// token, so a logout through one clone is seen by all of them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(ApiClient {
            client,
            base_url: config.base_url()?,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Session Token
    // =========================================================================

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Resolves an API path (`/api/v1/products`) against the base URL.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!(%method, %url, "API request");

        let mut req = self.client.request(method, url);
        if let Some(token) = self.token() {
            req = req.header(COOKIE, format!("{}={}", TOKEN_COOKIE, token));
        }
        Ok(req)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.request(Method::GET, path)?;
        self.send(req).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ClientResult<T> {
        let req = self.request(Method::GET, path)?.query(query);
        self.send(req).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::POST, path)?.json(body);
        self.send(req).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.request(Method::POST, path)?;
        self.send(req).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::PUT, path)?.json(body);
        self.send(req).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::PATCH, path)?.json(body);
        self.send(req).await
    }

    /// Deletes and discards whatever body comes back.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let req = self.request(Method::DELETE, path)?;
        let _: serde_json::Value = self.send(req).await?;
        Ok(())
    }

    /// GET a list endpoint and normalize its shape.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> ClientResult<Page<T>> {
        let body: serde_json::Value = self.get_with_query(path, &query.to_pairs()).await?;
        normalize_list(body, Some(query.limit))
    }

    /// GET a list endpoint without paging parameters.
    pub async fn get_all<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Vec<T>> {
        let body: serde_json::Value = self.get(path).await?;
        Ok(parse_list(body)?.items)
    }

    /// GET a single record, accepting `{data: {...}}` or the bare object.
    pub async fn get_item<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body: serde_json::Value = self.get(path).await?;
        parse_item(body)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ClientResult<T> {
        self.capture_token(&response);

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = error_from_status(status, &text);
            debug!(status = status.as_u16(), error = %err, "API request failed");
            return Err(err);
        }

        // Empty 2xx bodies (204, bare 200) read as JSON null
        let body = if text.trim().is_empty() { "null" } else { &text };
        Ok(serde_json::from_str(body)?)
    }

    fn capture_token(&self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                warn!("Ignoring non-ASCII Set-Cookie header");
                continue;
            };
            match parse_token_cookie(raw) {
                Some(CookieUpdate::Set(token)) => {
                    debug!("Session token received");
                    self.set_token(token);
                }
                Some(CookieUpdate::Cleared) => {
                    debug!("Session token cleared by server");
                    self.clear_token();
                }
                None => {}
            }
        }
    }
}

// =============================================================================
// Cookie Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CookieUpdate {
    Set(String),
    Cleared,
}

/// Reads a `Set-Cookie` value. Returns `None` for cookies other than
/// `token`. An empty value or `Max-Age=0` means the server dropped it.
pub(crate) fn parse_token_cookie(raw: &str) -> Option<CookieUpdate> {
    let mut parts = raw.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;
    if name.trim() != TOKEN_COOKIE {
        return None;
    }

    let expired = parts.any(|attr| {
        attr.split_once('=')
            .map(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
            .unwrap_or(false)
    });

    let value = value.trim().trim_matches('"');
    if value.is_empty() || expired {
        Some(CookieUpdate::Cleared)
    } else {
        Some(CookieUpdate::Set(value.to_string()))
    }
}

// =============================================================================
// Error Bodies
// =============================================================================

/// Maps a non-success response to a `ClientError`.
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden(extract_message(status, body)),
        StatusCode::NOT_FOUND => ClientError::NotFound(extract_message(status, body)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            match extract_field_errors(body) {
                Some(errors) => ClientError::Validation(errors),
                None => ClientError::Api {
                    status: status.as_u16(),
                    message: extract_message(status, body),
                },
            }
        }
        _ => ClientError::Api {
            status: status.as_u16(),
            message: extract_message(status, body),
        },
    }
}

/// `{"message": ".."}`, `{"error": ".."}`, plain text, or the status reason.
fn extract_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = obj.get(key) {
                return msg.clone();
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') {
        return text.chars().take(200).collect();
    }

    status.canonical_reason().unwrap_or("error").to_string()
}

/// `{field: message}`, optionally nested under `errors`.
fn extract_field_errors(body: &str) -> Option<FieldErrors> {
    let serde_json::Value::Object(mut obj) = serde_json::from_str::<serde_json::Value>(body).ok()?
    else {
        return None;
    };
    if let Some(serde_json::Value::Object(nested)) = obj.remove("errors") {
        obj = nested;
    }

    let mut errors = FieldErrors::new();
    for (field, value) in &obj {
        if NON_FIELD_KEYS.contains(&field.as_str()) {
            continue;
        }
        if let serde_json::Value::String(message) = value {
            errors.insert(field.clone(), message.clone());
        }
    }

    (!errors.is_empty()).then_some(errors)
}

// =============================================================================
// Response Shapes
// =============================================================================

/// One page of rows plus where it sits in the full list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Wrapped { data: Vec<T> },
    Raw(Vec<T>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemBody<T> {
    Wrapped { data: T },
    Raw(T),
}

/// Pagination block as sent. Backends leave keys out now and then, so each
/// one is optional and filled in by [`PaginationBlock::resolve`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationBlock {
    page: Option<u32>,
    limit: Option<u32>,
    total: Option<u64>,
    total_pages: Option<u32>,
}

impl PaginationBlock {
    /// Missing `limit` falls back to the requested limit, then to the rows
    /// received. Missing `total` is estimated from `totalPages`. A block with
    /// neither `total` nor `totalPages` says nothing about the list size and
    /// is rejected.
    fn resolve(self, rows: usize, requested_limit: Option<u32>) -> ClientResult<Pagination> {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .or(requested_limit)
            .unwrap_or(rows as u32)
            .max(1);

        let total = match (self.total, self.total_pages) {
            (Some(total), _) => total,
            (None, Some(pages)) if page >= pages => {
                u64::from(pages.saturating_sub(1)) * u64::from(limit) + rows as u64
            }
            (None, Some(pages)) => u64::from(pages) * u64::from(limit),
            (None, None) => {
                return Err(ClientError::InvalidResponse(
                    "pagination block has neither total nor totalPages".to_string(),
                ))
            }
        };

        Ok(Pagination::new(page, limit, total))
    }
}

/// Normalizes the three list shapes the backend uses.
///
/// Unpaged answers become a single page holding every row.
pub fn parse_list<T: DeserializeOwned>(body: serde_json::Value) -> ClientResult<Page<T>> {
    normalize_list(body, None)
}

fn normalize_list<T: DeserializeOwned>(
    mut body: serde_json::Value,
    requested_limit: Option<u32>,
) -> ClientResult<Page<T>> {
    // A pagination key commits the body to the paged shape; a malformed
    // block must not fall through to "one page holding everything".
    let block = match body.as_object_mut().and_then(|obj| obj.remove("pagination")) {
        Some(raw) => Some(serde_json::from_value::<PaginationBlock>(raw).map_err(|e| {
            ClientError::InvalidResponse(format!("malformed pagination block: {}", e))
        })?),
        None => None,
    };

    let parsed: ListBody<T> = serde_json::from_value(body).map_err(|_| {
        ClientError::InvalidResponse(
            "expected a list, {data: [...]} or {data: [...], pagination}".to_string(),
        )
    })?;
    let items = match parsed {
        ListBody::Wrapped { data } | ListBody::Raw(data) => data,
    };

    let pagination = match block {
        Some(block) => block.resolve(items.len(), requested_limit)?,
        None => Pagination::single_page(items.len()),
    };
    Ok(Page { items, pagination })
}

pub fn parse_item<T: DeserializeOwned>(body: serde_json::Value) -> ClientResult<T> {
    let parsed: ItemBody<T> = serde_json::from_value(body)
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
    Ok(match parsed {
        ItemBody::Wrapped { data } | ItemBody::Raw(data) => data,
    })
}

/// Reads the record out of a 2xx reply to a mutation.
///
/// The request already succeeded, so a reply without the record (empty,
/// `{"message": ..}`) is `None` rather than an error.
pub fn accepted_item<T: DeserializeOwned>(body: serde_json::Value) -> Option<T> {
    if body.is_null() {
        return None;
    }
    match parse_item(body) {
        Ok(item) => Some(item),
        Err(err) => {
            debug!(error = %err, "Mutation accepted without a record in the reply");
            None
        }
    }
}
