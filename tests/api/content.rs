use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

async fn mount_store_outage(test_app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&test_app.store_server)
        .await;
}

fn header<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn featured_articles_fall_back_when_the_store_is_down() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let response = test_app.get("/content/articles/featured").await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "X-Content-Origin"), Some("fallback"));
    assert_eq!(
        header(&response, "Cache-Control"),
        Some(format!("public, max-age={}", test_app.config.get_revalidate_seconds()).as_str())
    );
    let articles: Vec<Value> = response.json().await.unwrap();
    assert_eq!(articles.len(), 3);
    assert!(articles.iter().all(|article| article["is_featured"] == true));
}

#[tokio::test]
async fn live_articles_are_served_when_the_store_answers() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/api/articles"))
        .and(method("GET"))
        .and(query_param("filters[status][$eq]", "published"))
        .and(query_param("filters[category][slug][$eq]", "varejo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 42,
                "documentId": "live42",
                "title": "Rede de supermercados amplia adega",
                "slug": "rede-amplia-adega",
                "status": "published",
                "is_featured": false,
                "is_sponsored": false,
                "createdAt": "2026-02-01T10:00:00.000Z",
                "updatedAt": "2026-02-01T10:00:00.000Z",
                "publishedAt": "2026-02-01T10:00:00.000Z"
            }],
            "meta": {"pagination": {"page": 1, "pageSize": 10, "pageCount": 1, "total": 1}}
        })))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app.get("/content/articles?category=varejo").await;

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "X-Content-Origin"), Some("live"));
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["data"][0]["id"], 42);
    assert_eq!(page["meta"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn empty_live_results_are_replaced_by_built_in_content() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "meta": {}})))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app.get("/content/categories").await;

    assert_eq!(header(&response, "X-Content-Origin"), Some("fallback"));
    let categories: Vec<Value> = response.json().await.unwrap();
    assert_eq!(categories.len(), 7);
    assert_eq!(categories[0]["slug"], "noticias");
}

#[tokio::test]
async fn article_by_slug_falls_back_or_returns_404() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let found = test_app
        .get("/content/articles/entrevista-ceo-wine-tendencias-2026")
        .await;
    let missing = test_app.get("/content/articles/nao-existe").await;

    assert_eq!(found.status(), 200);
    let article: Value = found.json().await.unwrap();
    assert_eq!(article["id"], 4);
    assert_eq!(missing.status(), 404);
    assert_eq!(header(&missing, "X-Content-Origin"), Some("fallback"));
}

#[tokio::test]
async fn fixed_routes_are_not_mistaken_for_slugs() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let featured = test_app.get("/content/events/featured").await;
    let upcoming = test_app.get("/content/events/upcoming").await;

    let featured: Vec<Value> = featured.json().await.unwrap();
    let upcoming: Vec<Value> = upcoming.json().await.unwrap();
    assert_eq!(featured.len(), 2);
    assert_eq!(upcoming.len(), 3);
    assert_eq!(upcoming[0]["slug"], "webinar-tendencias-mercado-vinhos-2026");
}

#[tokio::test]
async fn related_articles_exclude_the_current_article() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let response = test_app
        .get("/content/articles/1/related?category=noticias")
        .await;

    let related: Vec<Value> = response.json().await.unwrap();
    assert_eq!(related.len(), 2);
    assert!(related.iter().all(|article| article["id"] != 1));
}

#[tokio::test]
async fn rankings_and_events_fall_back() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let rankings: Value = test_app
        .get("/content/rankings?pageSize=2")
        .await
        .json()
        .await
        .unwrap();
    let events: Value = test_app.get("/content/events").await.json().await.unwrap();
    let ranking = test_app
        .get("/content/rankings/top-50-importadores-vinhos-brasil-2025")
        .await;
    let event = test_app.get("/content/events/prowein-2026").await;

    assert_eq!(rankings["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(rankings["meta"]["pagination"]["pageCount"], 2);
    assert_eq!(events["data"].as_array().map(Vec::len), Some(4));
    assert_eq!(ranking.status(), 200);
    assert_eq!(event.status(), 200);
}
