use actix_web::{HttpResponse, Responder};

/// Liveness probe, answers without touching the content store.
#[tracing::instrument(name = "Health check handler")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}
