use reqwest::Client;
use serde::Serialize;
use std::time;

use crate::domain::subscriber_segment::SubscriberSegment;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(3);

/// Notifies the external automation endpoint about new subscriptions.
pub struct WebhookClient {
    http_client: Client,
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNotification<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub segment: SubscriberSegment,
    pub confirmation_token: &'a str,
    pub confirmation_url: String,
}

impl<'a> SubscriptionNotification<'a> {
    pub fn new(
        email: &'a str,
        name: Option<&'a str>,
        segment: SubscriberSegment,
        confirmation_token: &'a str,
        base_url: &str,
    ) -> Self {
        SubscriptionNotification {
            kind: "newsletter_subscription",
            email,
            name,
            segment,
            confirmation_token,
            confirmation_url: format!(
                "{}/subscriptions/confirm?token={}",
                base_url.trim_end_matches('/'),
                confirmation_token
            ),
        }
    }
}

impl WebhookClient {
    pub fn new(url: String, timeout: Option<time::Duration>) -> Result<WebhookClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(WebhookClient { http_client, url })
    }

    #[tracing::instrument(name = "Notifying the subscription webhook", skip(self, notification))]
    pub async fn notify(
        &self,
        notification: &SubscriptionNotification<'_>,
    ) -> Result<(), reqwest::Error> {
        self.http_client
            .post(&self.url)
            .json(notification)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
