//! HTTP route modules

pub mod health;
pub mod metrics;

use crate::server::state::AppState;
use crate::transport::SIGNATURE_HEADER;
use crate::utils::error::{MetricsError, Result};
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, web};
use bytes::Bytes;
use serde::Serialize;

/// Register every route of the collector
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes)
        .configure(metrics::configure_routes);
}

/// Header value as a string, if present and valid
pub(crate) fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn content_encoding(req: &HttpRequest) -> Option<&str> {
    header_str(req, header::CONTENT_ENCODING.as_str())
}

pub(crate) fn signature(req: &HttpRequest) -> Option<&str> {
    header_str(req, SIGNATURE_HEADER)
}

/// Read the raw request body, still compressed, up to `limit` bytes
pub(crate) async fn read_body(payload: web::Payload, limit: usize) -> Result<Bytes> {
    match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => Err(MetricsError::validation(format!(
            "failed to read request body: {}",
            e
        ))),
        Err(_) => Err(MetricsError::validation(format!(
            "request body exceeds {} bytes",
            limit
        ))),
    }
}

/// JSON response carrying a `HashSHA256` header when a key is configured
pub(crate) fn signed_json<T: Serialize>(state: &AppState, value: &T) -> Result<HttpResponse> {
    let body = serde_json::to_vec(value)?;
    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::json());
    if let Some(signature) = state.envelope.sign_response(&body)? {
        response.insert_header((SIGNATURE_HEADER, signature));
    }
    Ok(response.body(body))
}
