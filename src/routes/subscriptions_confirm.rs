use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Deserialize;

use crate::content::query::{FilterOperator, Query, QueryError};
use crate::content::source::Collection;
use crate::domain::confirmation_token::ConfirmationToken;
use crate::domain::subscriber::{Subscriber, SubscriberConfirmation};
use crate::routes::{error_chain_fmt, ErrorBody, SuccessBody};
use crate::store_client::{StoreClient, StoreError};

#[derive(Deserialize, Debug)]
pub struct Parameters {
    pub token: Option<String>,
}

#[tracing::instrument(
    name = "Confirm a newsletter subscription",
    skip(parameters, store_client)
)]
pub async fn handle_confirm_subscription(
    parameters: web::Query<Parameters>,
    store_client: web::Data<StoreClient>,
) -> Result<HttpResponse, ConfirmError> {
    let token = parameters
        .into_inner()
        .token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(ConfirmError::MissingToken)?;
    // Anything that could not have been issued cannot match a subscriber
    let token = ConfirmationToken::parse(token).map_err(|_| ConfirmError::UnknownToken)?;

    let subscriber = find_subscriber_by_token(&store_client, &token)
        .await?
        .ok_or(ConfirmError::UnknownToken)?;

    store_client
        .update(
            Collection::NewsletterSubscribers,
            &subscriber.document_id,
            &SubscriberConfirmation::confirmed(),
        )
        .await
        .map_err(ConfirmError::UpstreamUnavailable)?;

    tracing::info!(
        subscriber_id = subscriber.id,
        document_id = %subscriber.document_id,
        "Subscription confirmed"
    );

    Ok(HttpResponse::Ok().json(SuccessBody::new("Email confirmed successfully!")))
}

#[tracing::instrument(name = "Looking up a subscriber by token", skip(store_client, token))]
async fn find_subscriber_by_token(
    store_client: &StoreClient,
    token: &ConfirmationToken,
) -> Result<Option<Subscriber>, ConfirmError> {
    let query = Query::new()
        .filter("confirmation_token", FilterOperator::Eq, token.as_ref())
        .and_then(|query| query.paginate(1, 1))?;

    let page = store_client
        .find_many::<Subscriber>(Collection::NewsletterSubscribers, &query)
        .await
        .map_err(ConfirmError::UpstreamUnavailable)?;

    Ok(page.data.into_iter().next())
}

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error("Missing confirmation token.")]
    MissingToken,
    #[error("Invalid or expired token.")]
    UnknownToken,
    #[error("Failed to confirm email. Please try again.")]
    UpstreamUnavailable(#[source] StoreError),
    #[error("Failed to confirm email. Please try again.")]
    InvalidQuery(#[from] QueryError),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConfirmError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmError::MissingToken => StatusCode::BAD_REQUEST,
            ConfirmError::UnknownToken => StatusCode::NOT_FOUND,
            ConfirmError::UpstreamUnavailable(_) | ConfirmError::InvalidQuery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
