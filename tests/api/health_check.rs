use crate::helpers::TestApp;

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get("/health_check").await;

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length())
}

#[tokio::test]
async fn health_check_does_not_touch_the_content_store() {
    let test_app = TestApp::spawn_app().await;

    test_app.get("/health_check").await;

    let received_requests = test_app.store_server.received_requests().await.unwrap();
    assert!(received_requests.is_empty());
}
