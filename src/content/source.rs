use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::content::query::Query;
use crate::store_client::StoreError;

/// Named collections of the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Articles,
    Events,
    Rankings,
    Categories,
    People,
    Tags,
    NewsletterSubscribers,
}

impl AsRef<str> for Collection {
    fn as_ref(&self) -> &str {
        match self {
            Collection::Articles => "articles",
            Collection::Events => "events",
            Collection::Rankings => "rankings",
            Collection::Categories => "categories",
            Collection::People => "people",
            Collection::Tags => "tags",
            Collection::NewsletterSubscribers => "newsletter-subscribers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

/// A result set, shaped like the store's list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Page {
            data: Vec::new(),
            meta: PageMeta::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn page_count(&self) -> u32 {
        self.meta
            .pagination
            .map_or(1, |pagination| pagination.page_count)
    }
}

/// Read capability shared by the live store and the built-in dataset.
pub trait ContentSource {
    fn find_many<T>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> impl Future<Output = Result<Page<T>, StoreError>> + Send
    where
        T: DeserializeOwned + Send;
}
