use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

async fn mount_store_outage(test_app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&test_app.store_server)
        .await;
}

#[tokio::test]
async fn rss_feed_is_served_from_built_in_articles_when_the_store_is_down() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let response = test_app.get("/rss.xml").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("Cache-Control")
            .and_then(|value| value.to_str().ok()),
        Some("public, max-age=3600")
    );
    assert!(response
        .headers()
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("application/xml")));

    let document = response.text().await.unwrap();
    assert!(document.starts_with("<?xml"));
    assert!(document.contains("<rss version=\"2.0\""));
    assert_eq!(document.matches("<item>").count(), 5);
    assert!(document.contains(&format!(
        "<link>{}/noticias/importacoes-vinhos-crescem-15-primeiro-trimestre-2026</link>",
        test_app.config.get_app_base_url()
    )));
}

#[tokio::test]
async fn sitemap_lists_sections_and_content_pages() {
    let test_app = TestApp::spawn_app().await;
    mount_store_outage(&test_app).await;

    let response = test_app.get("/sitemap.xml").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("X-Content-Origin")
            .and_then(|value| value.to_str().ok()),
        Some("fallback")
    );

    let document = response.text().await.unwrap();
    let base_url = test_app.config.get_app_base_url();
    // home, 7 categories, 4 sections, 5 articles, 4 events, 4 rankings
    assert_eq!(document.matches("<url>").count(), 25);
    assert!(document.contains(&format!("<loc>{}/eventos/prowein-2026</loc>", base_url)));
    assert!(document.contains(&format!(
        "<loc>{}/rankings/premio-sommelier-ano-2025</loc>",
        base_url
    )));
    assert!(document.contains(&format!("<loc>{}/newsletter</loc>", base_url)));
}
