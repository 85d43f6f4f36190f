use serde_json::Value;
use wiremock::matchers::{any, body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{page_of, stored_subscriber, TestApp, SUBSCRIBERS_PATH};

const TOKEN: &str = "m5FQd0X3zEw9cXk2VYbXzK8pQjT1rNa7LsUeGh4oWi6";

async fn mount_token_lookup(test_app: &TestApp, records: Vec<Value>, times: u64) {
    let total = records.len() as u64;

    Mock::given(path(SUBSCRIBERS_PATH))
        .and(method("GET"))
        .and(query_param("filters[confirmation_token][$eq]", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(records, 1, 1, total)))
        .up_to_n_times(times)
        .mount(&test_app.store_server)
        .await;
}

#[tokio::test]
async fn confirmation_without_token_is_rejected_with_400() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.store_server)
        .await;

    for query in ["", "?token=", "?token=%20%20"] {
        let response = test_app.get_confirmation(query).await;

        assert_eq!(response.status(), 400, "for query `{}`", query);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Missing confirmation token.");
    }
}

#[tokio::test]
async fn confirmation_with_unknown_token_returns_404() {
    let test_app = TestApp::spawn_app().await;

    mount_token_lookup(&test_app, vec![], 1).await;

    let response = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or expired token.");
}

#[tokio::test]
async fn confirmation_with_malformed_token_never_reaches_the_store() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.store_server)
        .await;

    let response = test_app
        .get_confirmation("?token=abc%5D%5B%24ne%5D")
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn confirmation_marks_the_subscriber_as_confirmed_and_clears_the_token() {
    let test_app = TestApp::spawn_app().await;

    mount_token_lookup(
        &test_app,
        vec![stored_subscriber(7, "ana@vinhos.com.br", false, Some(TOKEN))],
        1,
    )
    .await;
    Mock::given(path(format!("{}/doc7", SUBSCRIBERS_PATH)))
        .and(method("PUT"))
        .and(body_json(serde_json::json!({
            "data": {"confirmed": true, "confirmation_token": null}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email confirmed successfully!");
}

#[tokio::test]
async fn confirmation_token_can_only_be_used_once() {
    let test_app = TestApp::spawn_app().await;

    // The first lookup finds the subscriber, later ones find nothing
    mount_token_lookup(
        &test_app,
        vec![stored_subscriber(7, "ana@vinhos.com.br", false, Some(TOKEN))],
        1,
    )
    .await;
    mount_token_lookup(&test_app, vec![], 1).await;
    Mock::given(path(format!("{}/doc7", SUBSCRIBERS_PATH)))
        .and(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let first = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;
    let second = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;

    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 404);
}

#[tokio::test]
async fn confirmation_returns_500_when_the_update_fails() {
    let test_app = TestApp::spawn_app().await;

    mount_token_lookup(
        &test_app,
        vec![stored_subscriber(7, "ana@vinhos.com.br", false, Some(TOKEN))],
        1,
    )
    .await;
    Mock::given(path(format!("{}/doc7", SUBSCRIBERS_PATH)))
        .and(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to confirm email. Please try again.");
}

#[tokio::test]
async fn confirmation_accepts_records_without_a_subscription_date() {
    let test_app = TestApp::spawn_app().await;
    let mut record = stored_subscriber(9, "carla@importadora.com", false, Some(TOKEN));
    record["subscribed_at"] = Value::Null;

    mount_token_lookup(&test_app, vec![record], 1).await;
    Mock::given(path(format!("{}/doc9", SUBSCRIBERS_PATH)))
        .and(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.store_server)
        .await;

    let response = test_app
        .get_confirmation(&format!("?token={}", TOKEN))
        .await;

    assert_eq!(response.status(), 200);
}
