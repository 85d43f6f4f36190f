use fake::faker::internet::en::IPv4;
use fake::Fake;
use reqwest::Response;
use secrecy::ExposeSecret;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_backend::config::{get_configuration, RateLimitBackend, Settings};
use portal_backend::startup::Application;

pub const SUBSCRIBERS_PATH: &str = "/api/newsletter-subscribers";
pub const WEBHOOK_PATH: &str = "/hooks/newsletter";

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub store_server: MockServer,
    pub webhook_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let store_server = MockServer::start().await;
        let webhook_server = MockServer::start().await;

        // Port 0 asks the OS for any free port, so every test gets its own server
        config.set_app_port(0);
        config.set_content_store_base_url(store_server.uri());
        config.set_webhook_url(Some(format!("{}{}", webhook_server.uri(), WEBHOOK_PATH)));
        config.set_rate_limit_backend(RateLimitBackend::Memory);

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            config,
            address,
            store_server,
            webhook_server,
            api_client: reqwest::Client::new(),
        }
    }

    /// Posts from a random client address, so the rate limiter stays out of the way.
    pub async fn post_subscription(&self, body: &Value) -> Response {
        let client_address: String = IPv4().fake();

        self.post_subscription_from(body, &client_address).await
    }

    pub async fn post_subscription_from(&self, body: &Value, client_address: &str) -> Response {
        self.api_client
            .post(format!("{}/subscriptions", self.address))
            .header("X-Forwarded-For", client_address)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw_subscription(&self, body: &'static str) -> Response {
        let client_address: String = IPv4().fake();

        self.api_client
            .post(format!("{}/subscriptions", self.address))
            .header("X-Forwarded-For", client_address)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_confirmation(&self, query: &str) -> Response {
        self.get(&format!("/subscriptions/confirm{}", query)).await
    }

    pub async fn get_export(&self, bearer_token: Option<&str>) -> Response {
        let request = self
            .api_client
            .get(format!("{}/subscriptions/export", self.address));
        let request = match bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.api_client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn admin_token(&self) -> String {
        self.config.get_admin_token().expose_secret().clone()
    }

    pub async fn mount_subscriber_creation(&self, status: u16, expected_calls: u64) {
        Mock::given(path(SUBSCRIBERS_PATH))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "data": {"id": 1}
            })))
            .expect(expected_calls)
            .mount(&self.store_server)
            .await;
    }

    pub async fn mount_webhook(&self, status: u16, expected_calls: u64) {
        Mock::given(path(WEBHOOK_PATH))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&self.webhook_server)
            .await;
    }

    /// JSON bodies the content store received, in arrival order.
    pub async fn store_bodies(&self) -> Vec<Value> {
        self.store_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    pub async fn webhook_bodies(&self) -> Vec<Value> {
        self.webhook_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}

/// A subscriber record as the content store serves it.
pub fn stored_subscriber(id: u64, email: &str, confirmed: bool, token: Option<&str>) -> Value {
    serde_json::json!({
        "id": id,
        "documentId": format!("doc{}", id),
        "email": email,
        "name": null,
        "segment": "importer",
        "confirmed": confirmed,
        "confirmation_token": token,
        "subscribed_at": "2026-01-06T10:00:00.000Z",
        "createdAt": "2026-01-06T10:00:00.000Z",
        "updatedAt": "2026-01-06T10:00:00.000Z"
    })
}

pub fn page_of(records: Vec<Value>, page: u32, page_count: u32, total: u64) -> Value {
    serde_json::json!({
        "data": records,
        "meta": {"pagination": {"page": page, "pageSize": 100, "pageCount": page_count, "total": total}}
    })
}
