//! Page context — everything a conditional can read: the current URL's query
//! string plus local and session storage.

use std::sync::Arc;

use optimize_core::storage::{KeyValueStore, MemoryStore};
use optimize_core::types::ConditionalType;

pub struct PageContext {
    page_url: String,
    query: Vec<(String, String)>,
    local_storage: Arc<dyn KeyValueStore>,
    session_storage: Arc<dyn KeyValueStore>,
}

impl PageContext {
    pub fn new(
        page_url: impl Into<String>,
        local_storage: Arc<dyn KeyValueStore>,
        session_storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let page_url = page_url.into();
        let query = parse_query(&page_url);
        Self {
            page_url,
            query,
            local_storage,
            session_storage,
        }
    }

    /// Context with empty in-memory storages.
    pub fn for_url(page_url: impl Into<String>) -> Self {
        Self::new(
            page_url,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// First value of a query parameter. Empty values count as absent.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Shared handle to local storage, for writers such as sticky assignments.
    pub fn local_storage_handle(&self) -> Arc<dyn KeyValueStore> {
        self.local_storage.clone()
    }

    pub fn local_storage(&self) -> &dyn KeyValueStore {
        self.local_storage.as_ref()
    }

    pub fn session_storage(&self) -> &dyn KeyValueStore {
        self.session_storage.as_ref()
    }

    /// Storage backing a conditional type; `None` for URL parameters.
    pub fn storage_for(&self, kind: ConditionalType) -> Option<&dyn KeyValueStore> {
        match kind {
            ConditionalType::LocalStorage => Some(self.local_storage()),
            ConditionalType::SessionStorage => Some(self.session_storage()),
            ConditionalType::UrlParameter => None,
        }
    }
}

/// Decodes the query component of a URL (absolute or relative).
fn parse_query(page_url: &str) -> Vec<(String, String)> {
    let without_fragment = page_url.split('#').next().unwrap_or_default();
    let Some((_, query)) = without_fragment.split_once('?') else {
        return Vec::new();
    };
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
