use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time;

use crate::content::query::Query;
use crate::content::source::{Collection, ContentSource, Page};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(5);

/// Client for the headless content store's REST API.
#[derive(Clone)]
pub struct StoreClient {
    http_client: Client,
    base_url: String,
    api_token: Option<Secret<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to reach the content store.")]
    Request(#[from] reqwest::Error),
    #[error("The content store rejected a duplicated value: {0}")]
    Conflict(String),
    #[error("The content store answered with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Failed to decode content records.")]
    Decode(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct DataEnvelope<'a, D> {
    data: &'a D,
}

#[derive(Deserialize)]
struct StoreErrorBody {
    error: Option<StoreErrorDetail>,
}

#[derive(Deserialize)]
struct StoreErrorDetail {
    #[serde(default)]
    message: String,
}

impl StoreClient {
    pub fn new(
        base_url: String,
        api_token: Option<Secret<String>>,
        timeout: Option<time::Duration>,
    ) -> Result<StoreClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(StoreClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/api/{}", self.base_url, collection.as_ref())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    #[tracing::instrument(
        name = "Creating a record in the content store",
        skip(self, data, collection),
        fields(collection = %collection.as_ref())
    )]
    pub async fn create<D: Serialize>(
        &self,
        collection: Collection,
        data: &D,
    ) -> Result<(), StoreError> {
        let request = self
            .http_client
            .post(self.collection_url(collection))
            .json(&DataEnvelope { data });

        let response = self.authorize(request).send().await?;

        check_status(response).await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Querying the content store",
        skip(self, query, collection),
        fields(collection = %collection.as_ref())
    )]
    pub async fn find_many<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Page<T>, StoreError> {
        let request = self
            .http_client
            .get(self.collection_url(collection))
            .query(&query.to_query_pairs());

        let response = self.authorize(request).send().await?;
        let body = check_status(response).await?.bytes().await?;

        serde_json::from_slice(&body).map_err(StoreError::Decode)
    }

    #[tracing::instrument(
        name = "Updating a record in the content store",
        skip(self, data, collection),
        fields(collection = %collection.as_ref())
    )]
    pub async fn update<D: Serialize>(
        &self,
        collection: Collection,
        document_id: &str,
        data: &D,
    ) -> Result<(), StoreError> {
        let request = self
            .http_client
            .put(format!("{}/{}", self.collection_url(collection), document_id))
            .json(&DataEnvelope { data });

        let response = self.authorize(request).send().await?;

        check_status(response).await?;

        Ok(())
    }
}

impl ContentSource for StoreClient {
    async fn find_many<T>(&self, collection: Collection, query: &Query) -> Result<Page<T>, StoreError>
    where
        T: DeserializeOwned + Send,
    {
        StoreClient::find_many(self, collection, query).await
    }
}

// The store signals unique-constraint violations with a validation message
// rather than a dedicated status code.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<StoreErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .map(|error| error.message)
        .unwrap_or_default();

    if status == StatusCode::CONFLICT || message.to_lowercase().contains("unique") {
        return Err(StoreError::Conflict(message));
    }

    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}
