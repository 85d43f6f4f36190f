use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::config::SiteSettings;
use crate::content::feed::{render_rss, render_sitemap, SitemapContent};
use crate::content::{ContentAccess, Origin};
use crate::routes::CONTENT_ORIGIN_HEADER;
use crate::startup::ApplicationBaseUrl;

const FEED_LENGTH: u32 = 20;
const FEED_MAX_AGE: &str = "public, max-age=3600";
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[tracing::instrument(name = "Rendering the RSS feed", skip(content, site, base_url))]
pub async fn rss_feed(
    content: web::Data<ContentAccess>,
    site: web::Data<SiteSettings>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> HttpResponse {
    let items = content.latest_articles_for_feed(FEED_LENGTH).await;
    let document = render_rss(&site, &base_url.0, &items.data, Utc::now());

    HttpResponse::Ok()
        .content_type(XML_CONTENT_TYPE)
        .insert_header((header::CACHE_CONTROL, FEED_MAX_AGE))
        .insert_header((CONTENT_ORIGIN_HEADER, items.origin.as_ref()))
        .body(document)
}

#[tracing::instrument(name = "Rendering the sitemap", skip(content, base_url))]
pub async fn sitemap(
    content: web::Data<ContentAccess>,
    base_url: web::Data<ApplicationBaseUrl>,
) -> HttpResponse {
    let (categories, articles, events, rankings) = tokio::join!(
        content.categories(),
        content.all_article_slugs(),
        content.all_event_slugs(),
        content.all_ranking_slugs(),
    );
    let origin = if [
        categories.origin,
        articles.origin,
        events.origin,
        rankings.origin,
    ]
    .contains(&Origin::Fallback)
    {
        Origin::Fallback
    } else {
        Origin::Live
    };

    let document = render_sitemap(
        &base_url.0,
        &SitemapContent {
            categories: &categories.data,
            articles: &articles.data,
            events: &events.data,
            rankings: &rankings.data,
        },
        Utc::now(),
    );

    HttpResponse::Ok()
        .content_type(XML_CONTENT_TYPE)
        .insert_header((header::CACHE_CONTROL, FEED_MAX_AGE))
        .insert_header((CONTENT_ORIGIN_HEADER, origin.as_ref()))
        .body(document)
}
