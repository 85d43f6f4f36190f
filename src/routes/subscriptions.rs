use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;

use crate::content::source::Collection;
use crate::domain::confirmation_token::ConfirmationToken;
use crate::domain::new_subscriber::{NewSubscriber, NewSubscriberBody, NewSubscriberError};
use crate::rate_limiter::{client_key, RateLimiter};
use crate::routes::{error_chain_fmt, ErrorBody, SuccessBody};
use crate::startup::ApplicationBaseUrl;
use crate::store_client::{StoreClient, StoreError};
use crate::webhook_client::{SubscriptionNotification, WebhookClient};

const FORWARDED_FOR: &str = "X-Forwarded-For";

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(request, body, store_client, webhook_client, base_url, rate_limiter),
    fields(
        client_key = tracing::field::Empty,
        subscriber_email = tracing::field::Empty
    )
)]
pub async fn handle_create_subscription(
    request: HttpRequest,
    body: web::Bytes,
    store_client: web::Data<StoreClient>,
    webhook_client: web::Data<Option<WebhookClient>>,
    base_url: web::Data<ApplicationBaseUrl>,
    rate_limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, SubscribeError> {
    let client_key = client_key(
        request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok()),
    );
    tracing::Span::current().record("client_key", &tracing::field::display(&client_key));

    // The body is only read once the client is known to be within its quota
    if !rate_limiter.allow(&client_key).await {
        return Err(SubscribeError::RateLimited);
    }

    let body: NewSubscriberBody = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!("Malformed subscription body: {}", err);
        SubscribeError::MalformedBody
    })?;
    let new_subscriber = NewSubscriber::try_from(body)?;
    tracing::Span::current().record(
        "subscriber_email",
        &tracing::field::display(new_subscriber.email.as_ref()),
    );

    let confirmation_token = ConfirmationToken::generate();

    store_subscriber(&store_client, &new_subscriber, &confirmation_token).await?;

    if let Some(webhook_client) = webhook_client.get_ref() {
        notify_subscription(
            webhook_client,
            &new_subscriber,
            &confirmation_token,
            &base_url.0,
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(SuccessBody::new(
        "Subscription received! Check your email to confirm.",
    )))
}

#[tracing::instrument(
    name = "Storing a new subscriber in the content store",
    skip(store_client, new_subscriber, confirmation_token)
)]
async fn store_subscriber(
    store_client: &StoreClient,
    new_subscriber: &NewSubscriber,
    confirmation_token: &ConfirmationToken,
) -> Result<(), SubscribeError> {
    let record = new_subscriber.to_record(confirmation_token, Utc::now());

    store_client
        .create(Collection::NewsletterSubscribers, &record)
        .await
        .map_err(|err| match err {
            StoreError::Conflict(_) => SubscribeError::AlreadySubscribed,
            err => {
                tracing::error!("Failed to store the new subscriber: {:?}", err);
                SubscribeError::UpstreamUnavailable(err)
            }
        })
}

// Failures are logged only: the subscriber is already stored.
#[tracing::instrument(
    name = "Notifying the automation webhook",
    skip(webhook_client, new_subscriber, confirmation_token, base_url)
)]
async fn notify_subscription(
    webhook_client: &WebhookClient,
    new_subscriber: &NewSubscriber,
    confirmation_token: &ConfirmationToken,
    base_url: &str,
) {
    let notification = SubscriptionNotification::new(
        new_subscriber.email.as_ref(),
        new_subscriber.name.as_ref().map(AsRef::as_ref),
        new_subscriber.segment,
        confirmation_token.as_ref(),
        base_url,
    );

    if let Err(err) = webhook_client.notify(&notification).await {
        tracing::warn!(
            "Failed to notify the webhook about {}: {:?}",
            new_subscriber.email.as_ref(),
            err
        );
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Too many attempts. Please try again in a few minutes.")]
    RateLimited,
    #[error("Invalid request body.")]
    MalformedBody,
    #[error("Invalid email.")]
    InvalidEmail(String),
    #[error("Invalid name.")]
    InvalidName(String),
    #[error("This email is already subscribed.")]
    AlreadySubscribed,
    #[error("Internal error. Please try again later.")]
    UpstreamUnavailable(#[source] StoreError),
}

impl From<NewSubscriberError> for SubscribeError {
    fn from(err: NewSubscriberError) -> Self {
        match err {
            NewSubscriberError::InvalidEmail(reason) => SubscribeError::InvalidEmail(reason),
            NewSubscriberError::InvalidName(reason) => SubscribeError::InvalidName(reason),
        }
    }
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::InvalidEmail(reason) | SubscribeError::InvalidName(reason) => {
                write!(f, "{} ({})", self, reason)
            }
            _ => error_chain_fmt(self, f),
        }
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SubscribeError::MalformedBody
            | SubscribeError::InvalidEmail(_)
            | SubscribeError::InvalidName(_) => StatusCode::BAD_REQUEST,
            SubscribeError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscribeError::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
