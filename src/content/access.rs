//! Read accessors for the portal's pages.
//!
//! Every accessor first asks the live store. When the store errors, times
//! out or has nothing to say, the same question goes to the built-in dataset
//! instead, usually in a degraded form (see each accessor). Callers always get
//! data back; `Fetched::origin` tells them which source produced it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::content::dataset::StaticDataset;
use crate::content::model::{
    Article, Category, Event, FeedItem, Ranking, SlugEntry, DEFAULT_CATEGORY_NAME,
    DEFAULT_CATEGORY_SLUG,
};
use crate::content::query::{FilterOperator, Query, QueryError, SortDirection};
use crate::content::source::{Collection, ContentSource, Page};
use crate::store_client::StoreClient;

const ARTICLE_RELATIONS: [&str; 4] = ["featured_image", "category", "tags", "author"];
const SLUG_ENUMERATION_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Live,
    Fallback,
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        match self {
            Origin::Live => "live",
            Origin::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            origin: self.origin,
        }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

pub struct ContentAccess<S = StoreClient> {
    live: S,
    fallback: StaticDataset,
}

impl<S: ContentSource> ContentAccess<S> {
    pub fn new(live: S, fallback: StaticDataset) -> Self {
        ContentAccess { live, fallback }
    }

    /// Up to `limit` featured, published articles, newest first.
    pub async fn featured_articles(&self, limit: u32) -> Fetched<Vec<Article>> {
        let live = published()
            .and_then(|query| query.filter("is_featured", FilterOperator::Eq, true))
            .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
            .and_then(|query| query.populate(&ARTICLE_RELATIONS))
            .and_then(|query| query.paginate(1, limit));
        let fallback = Query::new()
            .filter("is_featured", FilterOperator::Eq, true)
            .and_then(|query| query.paginate(1, limit));

        self.fetch(Collection::Articles, live, fallback)
            .await
            .map(|page| page.data)
    }

    pub async fn latest_articles(&self, page: u32, page_size: u32) -> Fetched<Page<Article>> {
        let live = published()
            .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
            .and_then(|query| query.populate(&ARTICLE_RELATIONS))
            .and_then(|query| query.paginate(page, page_size));
        let fallback = Query::new().paginate(page, page_size);

        self.fetch(Collection::Articles, live, fallback).await
    }

    /// The fallback ignores the category and always serves the first page of
    /// the built-in articles.
    pub async fn articles_by_category(
        &self,
        category_slug: &str,
        page: u32,
        page_size: u32,
    ) -> Fetched<Page<Article>> {
        let live = published()
            .and_then(|query| query.filter("category.slug", FilterOperator::Eq, category_slug))
            .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
            .and_then(|query| query.populate(&ARTICLE_RELATIONS))
            .and_then(|query| query.paginate(page, page_size));
        let fallback = Query::new().paginate(1, page_size);

        self.fetch(Collection::Articles, live, fallback).await
    }

    /// `None` when neither source knows the slug. A miss is never answered
    /// with some other built-in article.
    pub async fn article_by_slug(&self, slug: &str) -> Fetched<Option<Article>> {
        let live = by_slug(slug).and_then(|query| query.populate(&ARTICLE_RELATIONS));

        self.fetch(Collection::Articles, live, by_slug(slug))
            .await
            .map(first)
    }

    /// Without a category there is nothing to relate to, so only the
    /// built-in articles are consulted.
    pub async fn related_articles(
        &self,
        article_id: u64,
        category_slug: Option<&str>,
        limit: u32,
    ) -> Fetched<Vec<Article>> {
        let fallback = Query::new()
            .filter("id", FilterOperator::Ne, article_id)
            .and_then(|query| query.paginate(1, limit));

        let fetched = match category_slug {
            Some(category_slug) => {
                let live = published()
                    .and_then(|query| query.filter("category.slug", FilterOperator::Eq, category_slug))
                    .and_then(|query| query.filter("id", FilterOperator::Ne, article_id))
                    .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
                    .and_then(|query| query.populate(&["featured_image", "category"]))
                    .and_then(|query| query.paginate(1, limit));
                self.fetch(Collection::Articles, live, fallback).await
            }
            None => self.from_fallback(Collection::Articles, fallback),
        };

        fetched.map(|page| page.data)
    }

    pub async fn categories(&self) -> Fetched<Vec<Category>> {
        let query = Query::new()
            .sort("order", SortDirection::Asc)
            .and_then(|query| query.paginate(1, SLUG_ENUMERATION_LIMIT));

        self.fetch(Collection::Categories, query.clone(), query)
            .await
            .map(|page| page.data)
    }

    pub async fn events(&self, page: u32, page_size: u32) -> Fetched<Page<Event>> {
        let live = published()
            .and_then(|query| query.sort("start_date", SortDirection::Asc))
            .and_then(|query| query.populate(&["featured_image", "tags"]))
            .and_then(|query| query.paginate(page, page_size));
        let fallback = Query::new().paginate(page, page_size);

        self.fetch(Collection::Events, live, fallback).await
    }

    /// The fallback keeps the featured flag but not the date window.
    pub async fn featured_events(&self, limit: u32) -> Fetched<Vec<Event>> {
        let live = published()
            .and_then(|query| query.filter("is_featured", FilterOperator::Eq, true))
            .and_then(|query| query.filter("start_date", FilterOperator::Gte, now()))
            .and_then(|query| query.sort("start_date", SortDirection::Asc))
            .and_then(|query| query.populate(&["featured_image"]))
            .and_then(|query| query.paginate(1, limit));
        let fallback = Query::new()
            .filter("is_featured", FilterOperator::Eq, true)
            .and_then(|query| query.paginate(1, limit));

        self.fetch(Collection::Events, live, fallback)
            .await
            .map(|page| page.data)
    }

    /// The fallback ignores the date window: built-in events may be past.
    pub async fn upcoming_events(&self, limit: u32) -> Fetched<Vec<Event>> {
        let live = published()
            .and_then(|query| query.filter("start_date", FilterOperator::Gte, now()))
            .and_then(|query| query.sort("start_date", SortDirection::Asc))
            .and_then(|query| query.populate(&["featured_image"]))
            .and_then(|query| query.paginate(1, limit));
        let fallback = Query::new()
            .sort("start_date", SortDirection::Asc)
            .and_then(|query| query.paginate(1, limit));

        self.fetch(Collection::Events, live, fallback)
            .await
            .map(|page| page.data)
    }

    pub async fn event_by_slug(&self, slug: &str) -> Fetched<Option<Event>> {
        let live = by_slug(slug).and_then(|query| query.populate(&["featured_image", "tags", "author"]));

        self.fetch(Collection::Events, live, by_slug(slug))
            .await
            .map(first)
    }

    pub async fn rankings(&self, page: u32, page_size: u32) -> Fetched<Page<Ranking>> {
        let live = published()
            .and_then(|query| query.sort("year", SortDirection::Desc))
            .and_then(|query| query.populate(&["featured_image", "author"]))
            .and_then(|query| query.paginate(page, page_size));
        let fallback = Query::new().paginate(page, page_size);

        self.fetch(Collection::Rankings, live, fallback).await
    }

    pub async fn ranking_by_slug(&self, slug: &str) -> Fetched<Option<Ranking>> {
        let live = by_slug(slug).and_then(|query| {
            query.populate(&[
                "featured_image",
                "author",
                "categories.results",
                "jury_members.photo",
            ])
        });

        self.fetch(Collection::Rankings, live, by_slug(slug))
            .await
            .map(first)
    }

    pub async fn all_article_slugs(&self) -> Fetched<Vec<SlugEntry>> {
        let live = published()
            .and_then(|query| query.fields(&["slug", "updatedAt"]))
            .and_then(|query| query.populate(&["category"]))
            .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
            .and_then(|query| query.paginate(1, SLUG_ENUMERATION_LIMIT));

        self.fetch::<SlugRecord>(Collection::Articles, live, enumerate_all())
            .await
            .map(|page| page.data.into_iter().map(SlugRecord::into_article_entry).collect())
    }

    pub async fn all_event_slugs(&self) -> Fetched<Vec<SlugEntry>> {
        let live = published()
            .and_then(|query| query.fields(&["slug", "updatedAt"]))
            .and_then(|query| query.paginate(1, SLUG_ENUMERATION_LIMIT));

        self.fetch::<SlugRecord>(Collection::Events, live, enumerate_all())
            .await
            .map(|page| page.data.into_iter().map(|event| event.into_entry("eventos")).collect())
    }

    pub async fn all_ranking_slugs(&self) -> Fetched<Vec<SlugEntry>> {
        let live = published()
            .and_then(|query| query.fields(&["slug", "updatedAt"]))
            .and_then(|query| query.paginate(1, SLUG_ENUMERATION_LIMIT));

        self.fetch::<SlugRecord>(Collection::Rankings, live, enumerate_all())
            .await
            .map(|page| page.data.into_iter().map(|ranking| ranking.into_entry("rankings")).collect())
    }

    pub async fn latest_articles_for_feed(&self, limit: u32) -> Fetched<Vec<FeedItem>> {
        let live = published()
            .and_then(|query| query.sort("publishedAt", SortDirection::Desc))
            .and_then(|query| query.populate(&["category", "author"]))
            .and_then(|query| query.paginate(1, limit));
        let fallback = Query::new().paginate(1, limit);

        self.fetch::<Article>(Collection::Articles, live, fallback)
            .await
            .map(|page| page.data.iter().map(Article::to_feed_item).collect())
    }

    async fn fetch<T>(
        &self,
        collection: Collection,
        live: Result<Query, QueryError>,
        fallback: Result<Query, QueryError>,
    ) -> Fetched<Page<T>>
    where
        T: DeserializeOwned + Send,
    {
        let live = match live {
            Ok(query) => query,
            Err(err) => {
                tracing::error!(error = %err, collection = %collection.as_ref(), "Malformed content query");
                return self.from_fallback(collection, fallback);
            }
        };

        match self.live.find_many::<T>(collection, &live).await {
            Ok(page) if !page.is_empty() => Fetched {
                data: page,
                origin: Origin::Live,
            },
            Ok(_) => {
                tracing::info!(collection = %collection.as_ref(), "Content store returned no records, using built-in content");
                self.from_fallback(collection, fallback)
            }
            Err(err) => {
                tracing::warn!(error = ?err, collection = %collection.as_ref(), "Content store is unavailable, using built-in content");
                self.from_fallback(collection, fallback)
            }
        }
    }

    fn from_fallback<T: DeserializeOwned>(
        &self,
        collection: Collection,
        fallback: Result<Query, QueryError>,
    ) -> Fetched<Page<T>> {
        let data = fallback
            .map_err(|err| tracing::error!(error = %err, "Malformed fallback query"))
            .and_then(|query| {
                self.fallback
                    .query(collection, &query)
                    .map_err(|err| tracing::error!(error = ?err, "Built-in content is unreadable"))
            })
            .unwrap_or_else(|_| Page::empty());

        Fetched {
            data,
            origin: Origin::Fallback,
        }
    }
}

/// Projection of a record when only its address is requested.
#[derive(Deserialize)]
struct SlugRecord {
    slug: String,
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    category: Option<SlugCategory>,
}

#[derive(Deserialize)]
struct SlugCategory {
    slug: String,
    name: String,
}

impl SlugRecord {
    fn into_entry(self, section: &str) -> SlugEntry {
        SlugEntry {
            path: format!("{}/{}", section, self.slug),
            category: None,
            updated_at: self.updated_at,
        }
    }

    fn into_article_entry(self) -> SlugEntry {
        match self.category {
            Some(category) => SlugEntry {
                path: format!("{}/{}", category.slug, self.slug),
                category: Some(category.name),
                updated_at: self.updated_at,
            },
            None => SlugEntry {
                path: format!("{}/{}", DEFAULT_CATEGORY_SLUG, self.slug),
                category: Some(String::from(DEFAULT_CATEGORY_NAME)),
                updated_at: self.updated_at,
            },
        }
    }
}

fn published() -> Result<Query, QueryError> {
    Query::new().filter("status", FilterOperator::Eq, "published")
}

fn by_slug(slug: &str) -> Result<Query, QueryError> {
    Query::new()
        .filter("slug", FilterOperator::Eq, slug)
        .and_then(|query| query.paginate(1, 1))
}

fn enumerate_all() -> Result<Query, QueryError> {
    Query::new().paginate(1, SLUG_ENUMERATION_LIMIT)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn first<T>(page: Page<T>) -> Option<T> {
    page.data.into_iter().next()
}
