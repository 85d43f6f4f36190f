use serde_json::Value;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{page_of, stored_subscriber, TestApp, SUBSCRIBERS_PATH};

#[tokio::test]
async fn export_lists_only_confirmed_subscribers() {
    let test_app = TestApp::spawn_app().await;

    // The unconfirmed record slipping through the store filter must still be dropped
    Mock::given(path(SUBSCRIBERS_PATH))
        .and(method("GET"))
        .and(query_param("filters[confirmed][$eq]", "true"))
        .and(query_param("pagination[page]", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
            vec![
                stored_subscriber(1, "ana@vinhos.com.br", true, None),
                stored_subscriber(2, "bruno@adega.com.br", false, Some("pending")),
                stored_subscriber(3, "carla@importadora.com", true, None),
            ],
            1,
            1,
            3,
        )))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app.get_export(Some(test_app.admin_token().as_str())).await;

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("text/csv")));
    assert_eq!(
        response
            .headers()
            .get("Content-Disposition")
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"subscribers.csv\"")
    );

    let csv = response.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "email,name,segment,subscribed_at");
    assert!(lines[1].starts_with("ana@vinhos.com.br,,importer,"));
    assert!(lines[2].starts_with("carla@importadora.com,"));
    assert!(!csv.contains("bruno@adega.com.br"));
}

#[tokio::test]
async fn export_pages_through_every_subscriber() {
    let test_app = TestApp::spawn_app().await;

    for page in 1..=2u32 {
        Mock::given(path(SUBSCRIBERS_PATH))
            .and(method("GET"))
            .and(query_param("pagination[page]", page.to_string()))
            .and(query_param("pagination[pageSize]", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
                vec![stored_subscriber(
                    u64::from(page),
                    &format!("leitor{}@vinhos.com.br", page),
                    true,
                    None,
                )],
                page,
                2,
                2,
            )))
            .expect(1)
            .mount(&test_app.store_server)
            .await;
    }

    let response = test_app.get_export(Some(test_app.admin_token().as_str())).await;
    let csv = response.text().await.unwrap();

    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("leitor2@vinhos.com.br"));
}

#[tokio::test]
async fn export_requires_the_admin_token() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.store_server)
        .await;

    for token in [None, Some(""), Some("not-the-admin-token")] {
        let response = test_app.get_export(token).await;

        assert_eq!(response.status(), 401, "for token {:?}", token);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn export_returns_500_when_the_store_fails() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app.get_export(Some(test_app.admin_token().as_str())).await;

    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn export_keeps_subscribers_without_a_subscription_date() {
    let test_app = TestApp::spawn_app().await;
    let mut undated = stored_subscriber(2, "bruno@adega.com.br", true, None);
    undated["subscribed_at"] = Value::Null;

    Mock::given(path(SUBSCRIBERS_PATH))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
            vec![
                stored_subscriber(1, "ana@vinhos.com.br", true, None),
                undated,
            ],
            1,
            1,
            2,
        )))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app.get_export(Some(test_app.admin_token().as_str())).await;

    assert_eq!(response.status(), 200);
    let csv = response.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "bruno@adega.com.br,,importer,");
}
