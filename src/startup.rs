use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use secrecy::Secret;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::Settings;
use crate::content::{ContentAccess, StaticDataset};
use crate::rate_limiter::RateLimiter;
use crate::routes::{
    article_by_slug, event_by_slug, featured_articles, featured_events,
    handle_confirm_subscription, handle_create_subscription, handle_export_subscribers,
    health_check, list_articles, list_categories, list_events, list_rankings, ranking_by_slug,
    related_articles, rss_feed, sitemap, upcoming_events,
};
use crate::store_client::StoreClient;
use crate::webhook_client::WebhookClient;

/// Public address of the portal, used to build links sent outside.
pub struct ApplicationBaseUrl(pub String);

pub struct AdminToken(pub Secret<String>);

pub struct ContentCaching {
    pub max_age: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Failed to bind the server address.")]
    Io(#[from] std::io::Error),
    #[error("Failed to build an HTTP client.")]
    HttpClient(#[from] reqwest::Error),
    #[error("Failed to open the Redis client.")]
    Redis(#[from] redis::RedisError),
    #[error("Built-in content is not valid.")]
    Dataset(#[from] serde_json::Error),
}

/// Long-lived collaborators shared by every worker.
pub struct Services {
    pub store_client: StoreClient,
    pub webhook_client: Option<WebhookClient>,
    pub rate_limiter: RateLimiter,
    pub content: ContentAccess,
}

impl Services {
    pub fn build(config: &Settings) -> Result<Self, ApplicationError> {
        let store_client = StoreClient::new(
            config.get_content_store_base_url(),
            config.get_content_store_api_token(),
            Some(config.get_content_store_timeout()),
        )?;
        let webhook_client = config
            .get_webhook_url()
            .map(|url| WebhookClient::new(url, Some(config.get_webhook_timeout())))
            .transpose()?;
        let rate_limiter =
            RateLimiter::from_settings(&config.rate_limit, &config.get_redis_address())?;
        let content = ContentAccess::new(store_client.clone(), StaticDataset::load()?);

        if webhook_client.is_none() {
            tracing::warn!("No webhook configured, new subscribers will not be notified");
        }

        Ok(Self {
            store_client,
            webhook_client,
            rate_limiter,
            content,
        })
    }
}

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, ApplicationError> {
        let services = Services::build(&config)?;

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, services, &config)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    services: Services,
    config: &Settings,
) -> Result<Server, std::io::Error> {
    // Created once so that every worker shares the same limiter and clients
    let store_client = web::Data::new(services.store_client);
    let webhook_client = web::Data::new(services.webhook_client);
    let rate_limiter = web::Data::new(services.rate_limiter);
    let content = web::Data::new(services.content);
    let base_url = web::Data::new(ApplicationBaseUrl(config.get_app_base_url()));
    let admin_token = web::Data::new(AdminToken(config.get_admin_token()));
    let caching = web::Data::new(ContentCaching {
        max_age: config.get_revalidate_seconds(),
    });
    let site = web::Data::new(config.site.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(handle_create_subscription))
            .route(
                "/subscriptions/confirm",
                web::get().to(handle_confirm_subscription),
            )
            .route(
                "/subscriptions/export",
                web::get().to(handle_export_subscribers),
            )
            .service(
                web::scope("/content")
                    // Fixed segments go before the slug routes that would shadow them
                    .route("/articles", web::get().to(list_articles))
                    .route("/articles/featured", web::get().to(featured_articles))
                    .route("/articles/{id}/related", web::get().to(related_articles))
                    .route("/articles/{slug}", web::get().to(article_by_slug))
                    .route("/categories", web::get().to(list_categories))
                    .route("/events", web::get().to(list_events))
                    .route("/events/featured", web::get().to(featured_events))
                    .route("/events/upcoming", web::get().to(upcoming_events))
                    .route("/events/{slug}", web::get().to(event_by_slug))
                    .route("/rankings", web::get().to(list_rankings))
                    .route("/rankings/{slug}", web::get().to(ranking_by_slug)),
            )
            .route("/rss.xml", web::get().to(rss_feed))
            .route("/sitemap.xml", web::get().to(sitemap))
            .app_data(store_client.clone())
            .app_data(webhook_client.clone())
            .app_data(rate_limiter.clone())
            .app_data(content.clone())
            .app_data(base_url.clone())
            .app_data(admin_token.clone())
            .app_data(caching.clone())
            .app_data(site.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
