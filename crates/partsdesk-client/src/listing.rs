//! # List Pages
//!
//! Every table screen (products, brands, sales, debtors, users, ...) loads
//! and mutates its rows the same way. [`ListPage`] is that behaviour once,
//! generic over where the rows come from.
//!
//! ## Load Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  search("brake") ──► Debouncer (400 ms) ──► page = 1 ──┐                │
//! │  go_to_page(n) ──────────── clamp to [1, totalPages] ──┤                │
//! │  set_filter(k, v) ─────────────────────── page = 1 ────┤                │
//! │  retry() ──────────────────────────────────────────────┤                │
//! │                                                        ▼                │
//! │                                  load():  seq += 1, loading = true      │
//! │                                           source.fetch(query)           │
//! │                                                        │                │
//! │                      ┌─────────────────────────────────┼──────────┐     │
//! │                      ▼                                 ▼          ▼     │
//! │               seq outdated              Ok(page)             Err(e)     │
//! │               → Stale, dropped          → items, pagination  → banner,  │
//! │                                                                empty    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Optimistic Delete
//! ```text
//!   delete(id)
//!     ├── snapshot rows, splice row out        (table updates at once)
//!     ├── source.remove(id)
//!     │     └── Err → restore snapshot, banner, return Err
//!     ├── last row of page > 1 gone → page - 1
//!     └── load()                                (reconcile counts)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use partsdesk_core::pagination::{ListQuery, Pagination};
use partsdesk_core::{Debtor, Product, Sale, User};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{DebtorsApi, Identified, ProductsApi, ResourceApi, SalesApi, UsersApi};
use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::{ClientError, ClientResult, ErrorCode};
use crate::http::Page;

// =============================================================================
// List Source
// =============================================================================

/// Where a list page gets its rows.
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Clone + Send + Sync;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<Self::Item>>;

    /// Deletes one row. Read-only lists keep the default.
    async fn remove(&self, _id: i64) -> ClientResult<()> {
        Err(ClientError::Forbidden("this list is read-only".to_string()))
    }

    fn id_of(item: &Self::Item) -> i64;
}

#[async_trait]
impl<T> ListSource for ResourceApi<T>
where
    T: DeserializeOwned + Identified + Clone + Send + Sync,
{
    type Item = T;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<T>> {
        self.list(query).await
    }

    async fn remove(&self, id: i64) -> ClientResult<()> {
        self.delete(id).await
    }

    fn id_of(item: &T) -> i64 {
        item.id()
    }
}

#[async_trait]
impl ListSource for ProductsApi {
    type Item = Product;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<Product>> {
        self.list(query).await
    }

    async fn remove(&self, id: i64) -> ClientResult<()> {
        self.delete(id).await
    }

    fn id_of(item: &Product) -> i64 {
        item.id
    }
}

/// Sales cannot be deleted from the dashboard.
#[async_trait]
impl ListSource for SalesApi {
    type Item = Sale;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<Sale>> {
        self.list(query).await
    }

    fn id_of(item: &Sale) -> i64 {
        item.id
    }
}

#[async_trait]
impl ListSource for DebtorsApi {
    type Item = Debtor;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<Debtor>> {
        self.list(query).await
    }

    async fn remove(&self, id: i64) -> ClientResult<()> {
        self.delete(id).await
    }

    fn id_of(item: &Debtor) -> i64 {
        item.id
    }
}

#[async_trait]
impl ListSource for UsersApi {
    type Item = User;

    async fn fetch(&self, query: &ListQuery) -> ClientResult<Page<User>> {
        self.list(query).await
    }

    async fn remove(&self, id: i64) -> ClientResult<()> {
        self.delete(id).await
    }

    fn id_of(item: &User) -> i64 {
        item.id
    }
}

// =============================================================================
// Page State
// =============================================================================

/// Error shown above the table instead of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBanner {
    pub code: ErrorCode,
    pub message: String,
    /// Show a "Retry" button.
    pub retryable: bool,
}

impl From<&ClientError> for ErrorBanner {
    fn from(err: &ClientError) -> Self {
        ErrorBanner {
            code: err.code(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

/// What happened to a `load()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    /// A newer load was started while this one was in flight; its response
    /// was dropped.
    Stale,
}

/// Copy of the page state for rendering.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub loading: bool,
    pub error: Option<ErrorBanner>,
    pub search: Option<String>,
}

#[derive(Debug)]
struct ListState<T> {
    items: Vec<T>,
    pagination: Pagination,
    loading: bool,
    error: Option<ErrorBanner>,
    page: u32,
    limit: u32,
    search: Option<String>,
    filters: Vec<(String, String)>,
    /// Sequence number of the most recent load.
    seq: u64,
}

impl<T> ListState<T> {
    fn query(&self) -> ListQuery {
        let mut query = ListQuery::new(self.page, self.limit);
        if let Some(term) = &self.search {
            query = query.with_search(term.clone());
        }
        for (key, value) in &self.filters {
            query = query.with_filter(key.clone(), value.clone());
        }
        query
    }
}

// =============================================================================
// List Page
// =============================================================================

/// Controller behind one table screen.
///
/// Methods take `&self`; overlapping calls (a search typed while a page
/// change is loading) are resolved by sequence number, newest request wins.
pub struct ListPage<S: ListSource> {
    source: S,
    state: Arc<Mutex<ListState<S::Item>>>,
    debouncer: Debouncer,
}

impl<S: ListSource> ListPage<S> {
    pub fn new(source: S, config: &ClientConfig) -> Self {
        Self::with_settings(source, config.page_size(), Debouncer::new(config.debounce()))
    }

    pub fn with_settings(source: S, limit: u32, debouncer: Debouncer) -> Self {
        let limit = limit.max(1);
        ListPage {
            source,
            state: Arc::new(Mutex::new(ListState {
                items: Vec::new(),
                pagination: Pagination::new(1, limit, 0),
                loading: false,
                error: None,
                page: 1,
                limit,
                search: None,
                filters: Vec::new(),
                seq: 0,
            })),
            debouncer,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, ListState<S::Item>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetches the current page.
    ///
    /// When the list shrank under us (rows deleted elsewhere) and the
    /// requested page no longer exists, the last page is fetched instead.
    pub async fn load(&self) -> LoadOutcome {
        loop {
            let (seq, query) = {
                let mut state = self.lock();
                state.seq += 1;
                state.loading = true;
                (state.seq, state.query())
            };
            debug!(seq, page = query.page, search = ?query.search, "Loading list page");

            let result = self.source.fetch(&query).await;

            let mut state = self.lock();
            if state.seq != seq {
                warn!(seq, latest = state.seq, "Discarding stale list response");
                return LoadOutcome::Stale;
            }
            state.loading = false;

            match result {
                Ok(page) => {
                    let last = page.pagination.total_pages.max(1);
                    if query.page > last && page.pagination.total > 0 {
                        debug!(requested = query.page, last, "Requested page gone, stepping back");
                        state.page = last;
                        continue;
                    }
                    state.page = page.pagination.page;
                    state.pagination = page.pagination;
                    state.items = page.items;
                    state.error = None;
                    return LoadOutcome::Loaded;
                }
                Err(err) => {
                    warn!(error = %err, "List load failed");
                    state.items.clear();
                    state.pagination = Pagination::new(1, state.limit, 0);
                    state.error = Some(ErrorBanner::from(&err));
                    return LoadOutcome::Failed;
                }
            }
        }
    }

    /// Reloads after an error banner's "Retry".
    pub async fn retry(&self) -> LoadOutcome {
        self.load().await
    }

    /// Moves to `page`, clamped to the pages that exist.
    pub async fn go_to_page(&self, page: u32) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.page = state.pagination.clamp_page(page);
        }
        self.load().await
    }

    pub async fn next_page(&self) -> LoadOutcome {
        let page = self.lock().page.saturating_add(1);
        self.go_to_page(page).await
    }

    pub async fn prev_page(&self) -> LoadOutcome {
        let page = self.lock().page.saturating_sub(1);
        self.go_to_page(page).await
    }

    /// Debounced search. Returns `None` when a newer keystroke replaced this
    /// one before the delay ran out.
    pub async fn search(&self, term: &str) -> Option<LoadOutcome> {
        if !self.debouncer.settle().await {
            return None;
        }
        {
            let mut state = self.lock();
            let term = term.trim();
            state.search = (!term.is_empty()).then(|| term.to_string());
            state.page = 1;
        }
        Some(self.load().await)
    }

    /// Sets (or with an empty value, removes) a filter and reloads page 1.
    pub async fn set_filter(&self, key: &str, value: &str) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.filters.retain(|(k, _)| k != key);
            if !value.is_empty() {
                state.filters.push((key.to_string(), value.to_string()));
            }
            state.page = 1;
        }
        self.load().await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Deletes a row optimistically.
    ///
    /// ## Errors
    /// Whatever the source returned; the rows are restored and the banner
    /// set before returning.
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let (snapshot, rows_on_page) = {
            let mut state = self.lock();
            let snapshot = state.items.clone();
            let rows_on_page = snapshot.len();
            state.items.retain(|item| S::id_of(item) != id);
            (snapshot, rows_on_page)
        };

        if let Err(err) = self.source.remove(id).await {
            warn!(id, error = %err, "Delete failed, restoring rows");
            let mut state = self.lock();
            state.items = snapshot;
            state.error = Some(ErrorBanner::from(&err));
            return Err(err);
        }

        {
            let mut state = self.lock();
            let deleted = rows_on_page - state.items.len().min(rows_on_page);
            state.page = state.pagination.page_after_delete(rows_on_page, deleted);
        }
        self.load().await;
        Ok(())
    }

    /// Swaps a row for its edited copy without a round trip.
    pub fn replace_local(&self, item: S::Item) -> bool {
        let id = S::id_of(&item);
        let mut state = self.lock();
        match state.items.iter_mut().find(|row| S::id_of(row) == id) {
            Some(row) => {
                *row = item;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn items(&self) -> Vec<S::Item> {
        self.lock().items.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<ErrorBanner> {
        self.lock().error.clone()
    }

    pub fn query(&self) -> ListQuery {
        self.lock().query()
    }

    pub fn snapshot(&self) -> ListSnapshot<S::Item> {
        let state = self.lock();
        ListSnapshot {
            items: state.items.clone(),
            pagination: state.pagination,
            loading: state.loading,
            error: state.error.clone(),
            search: state.search.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
