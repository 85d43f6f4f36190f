use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::content::query::{FilterOperator, Query, QueryError, SortDirection};
use crate::content::source::{Collection, Page};
use crate::domain::subscriber::Subscriber;
use crate::routes::{error_chain_fmt, ErrorBody};
use crate::startup::AdminToken;
use crate::store_client::{StoreClient, StoreError};

const EXPORT_PAGE_SIZE: u32 = 100;
const CSV_HEADER: &str = "email,name,segment,subscribed_at";

#[tracing::instrument(
    name = "Exporting confirmed subscribers",
    skip(request, store_client, admin_token)
)]
pub async fn handle_export_subscribers(
    request: HttpRequest,
    store_client: web::Data<StoreClient>,
    admin_token: web::Data<AdminToken>,
) -> Result<HttpResponse, ExportError> {
    authorize(&request, &admin_token)?;

    let subscribers = fetch_confirmed_subscribers(&store_client).await?;

    tracing::info!(subscribers = subscribers.len(), "Subscribers exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"subscribers.csv\"",
        ))
        .body(render_csv(&subscribers)))
}

fn authorize(request: &HttpRequest, admin_token: &AdminToken) -> Result<(), ExportError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ExportError::Unauthorized)?;

    if presented.is_empty() || !tokens_match(presented, admin_token.0.expose_secret()) {
        return Err(ExportError::Unauthorized);
    }

    Ok(())
}

// Only the length leaks, the content is compared in constant time.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

async fn fetch_confirmed_subscribers(
    store_client: &StoreClient,
) -> Result<Vec<Subscriber>, ExportError> {
    let mut subscribers = Vec::new();
    let mut page = 1;

    loop {
        let query = Query::new()
            .filter("confirmed", FilterOperator::Eq, true)
            .and_then(|query| query.sort("subscribed_at", SortDirection::Asc))
            .and_then(|query| query.paginate(page, EXPORT_PAGE_SIZE))?;

        let result: Page<Subscriber> = store_client
            .find_many(Collection::NewsletterSubscribers, &query)
            .await
            .map_err(ExportError::UpstreamUnavailable)?;
        let page_count = result.page_count();

        // The store filter is not trusted on its own
        subscribers.extend(result.data.into_iter().filter(|subscriber| subscriber.confirmed));

        if page >= page_count {
            break;
        }
        page += 1;
    }

    Ok(subscribers)
}

/// Renders subscribers as RFC 4180 CSV.
pub fn render_csv(subscribers: &[Subscriber]) -> String {
    let mut document = String::from(CSV_HEADER);
    document.push_str("\r\n");

    for subscriber in subscribers {
        let row = [
            csv_field(&subscriber.email),
            csv_field(subscriber.name.as_deref().unwrap_or_default()),
            csv_field(subscriber.segment.as_ref()),
            subscriber
                .subscribed_at
                .map(|subscribed_at| csv_field(&subscribed_at.to_rfc3339()))
                .unwrap_or_default(),
        ];
        document.push_str(&row.join(","));
        document.push_str("\r\n");
    }

    document
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(thiserror::Error)]
pub enum ExportError {
    #[error("Unauthorized.")]
    Unauthorized,
    #[error("Failed to export subscribers.")]
    UpstreamUnavailable(#[source] StoreError),
    #[error("Failed to export subscribers.")]
    InvalidQuery(#[from] QueryError),
}

impl std::fmt::Debug for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ExportError {
    fn status_code(&self) -> StatusCode {
        match self {
            ExportError::Unauthorized => StatusCode::UNAUTHORIZED,
            ExportError::UpstreamUnavailable(_) | ExportError::InvalidQuery(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());

        if let ExportError::Unauthorized = self {
            response.insert_header((header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer")));
        }

        response.json(ErrorBody {
            error: self.to_string(),
        })
    }
}
