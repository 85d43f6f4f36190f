//! Read-only content endpoints for the page renderer.
//!
//! Responses are never errors: when the content store is down the built-in
//! content is served instead and `X-Content-Origin` says so.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::content::{ContentAccess, Fetched};
use crate::routes::ErrorBody;
use crate::startup::ContentCaching;

pub const CONTENT_ORIGIN_HEADER: &str = "X-Content-Origin";

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Deserialize, Debug)]
pub struct ListParameters {
    page: Option<u32>,
    #[serde(rename = "pageSize")]
    page_size: Option<u32>,
    category: Option<String>,
}

impl ListParameters {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_LIMIT)
    }
}

#[derive(Deserialize, Debug)]
pub struct LimitParameters {
    limit: Option<u32>,
}

impl LimitParameters {
    fn limit_or(&self, default: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

#[derive(Deserialize, Debug)]
pub struct RelatedParameters {
    category: Option<String>,
    limit: Option<u32>,
}

fn content_response<T: Serialize>(fetched: Fetched<T>, caching: &ContentCaching) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((
            header::CACHE_CONTROL,
            format!("public, max-age={}", caching.max_age),
        ))
        .insert_header((CONTENT_ORIGIN_HEADER, fetched.origin.as_ref()))
        .json(fetched.data)
}

fn single_content_response<T: Serialize>(
    fetched: Fetched<Option<T>>,
    caching: &ContentCaching,
) -> HttpResponse {
    match fetched.data {
        Some(data) => content_response(
            Fetched {
                data,
                origin: fetched.origin,
            },
            caching,
        ),
        None => HttpResponse::NotFound()
            .insert_header((CONTENT_ORIGIN_HEADER, fetched.origin.as_ref()))
            .json(ErrorBody {
                error: String::from("Content not found."),
            }),
    }
}

#[tracing::instrument(name = "Listing articles", skip(content, caching))]
pub async fn list_articles(
    parameters: web::Query<ListParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    let fetched = match parameters.category.as_deref() {
        Some(category) if !category.trim().is_empty() => {
            content
                .articles_by_category(category.trim(), parameters.page(), parameters.page_size())
                .await
        }
        _ => {
            content
                .latest_articles(parameters.page(), parameters.page_size())
                .await
        }
    };

    content_response(fetched, &caching)
}

#[tracing::instrument(name = "Listing featured articles", skip(content, caching))]
pub async fn featured_articles(
    parameters: web::Query<LimitParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(
        content.featured_articles(parameters.limit_or(3)).await,
        &caching,
    )
}

#[tracing::instrument(name = "Reading an article", skip(content, caching))]
pub async fn article_by_slug(
    slug: web::Path<String>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    single_content_response(content.article_by_slug(&slug).await, &caching)
}

#[tracing::instrument(name = "Listing related articles", skip(content, caching))]
pub async fn related_articles(
    article_id: web::Path<u64>,
    parameters: web::Query<RelatedParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    let category = parameters
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());
    let limit = parameters.limit.unwrap_or(2).clamp(1, MAX_LIMIT);

    content_response(
        content
            .related_articles(article_id.into_inner(), category, limit)
            .await,
        &caching,
    )
}

#[tracing::instrument(name = "Listing categories", skip(content, caching))]
pub async fn list_categories(
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(content.categories().await, &caching)
}

#[tracing::instrument(name = "Listing events", skip(content, caching))]
pub async fn list_events(
    parameters: web::Query<ListParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(
        content
            .events(parameters.page(), parameters.page_size())
            .await,
        &caching,
    )
}

#[tracing::instrument(name = "Listing featured events", skip(content, caching))]
pub async fn featured_events(
    parameters: web::Query<LimitParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(content.featured_events(parameters.limit_or(5)).await, &caching)
}

#[tracing::instrument(name = "Listing upcoming events", skip(content, caching))]
pub async fn upcoming_events(
    parameters: web::Query<LimitParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(content.upcoming_events(parameters.limit_or(3)).await, &caching)
}

#[tracing::instrument(name = "Reading an event", skip(content, caching))]
pub async fn event_by_slug(
    slug: web::Path<String>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    single_content_response(content.event_by_slug(&slug).await, &caching)
}

#[tracing::instrument(name = "Listing rankings", skip(content, caching))]
pub async fn list_rankings(
    parameters: web::Query<ListParameters>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    content_response(
        content
            .rankings(parameters.page(), parameters.page_size())
            .await,
        &caching,
    )
}

#[tracing::instrument(name = "Reading a ranking", skip(content, caching))]
pub async fn ranking_by_slug(
    slug: web::Path<String>,
    content: web::Data<ContentAccess>,
    caching: web::Data<ContentCaching>,
) -> HttpResponse {
    single_content_response(content.ranking_by_slug(&slug).await, &caching)
}
