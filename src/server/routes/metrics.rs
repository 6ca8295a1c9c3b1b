//! Metric ingestion and lookup endpoints

use super::{content_encoding, read_body, signature, signed_json};
use crate::core::{Metric, MetricKind, MetricUpdate, MetricValue};
use crate::server::state::AppState;
use crate::transport::compression;
use crate::utils::error::{MetricsError, Result};
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::{debug, info};

/// Configure metric routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/update/", web::post().to(update_json))
        .route(
            "/update/{kind}/{name}/{value}",
            web::post().to(update_from_path),
        )
        .route("/updates/", web::post().to(update_batch))
        .route("/value/", web::post().to(value_json))
        .route("/value/{kind}/{name}", web::get().to(value_from_path));
}

/// Body of `POST /value/`
#[derive(Debug, Clone, Deserialize)]
pub struct MetricQuery {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

fn require_name(name: &str) -> Result<&str> {
    if name.trim().is_empty() {
        return Err(MetricsError::not_found("metric name is empty"));
    }
    Ok(name)
}

fn text(value: impl ToString) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(value.to_string())
}

/// `POST /update/{kind}/{name}/{value}`
pub async fn update_from_path(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse> {
    let (kind, name, raw) = path.into_inner();
    let kind: MetricKind = kind.parse()?;
    let name = require_name(&name)?;
    let update = MetricUpdate::new(name, MetricValue::parse(kind, &raw)?)?;

    let stored = state.engine.apply(&update).await?;
    debug!("{} {} <- {} (now {})", kind, update.id, raw, stored);
    Ok(text(""))
}

/// `POST /update/` with a single JSON record
pub async fn update_json(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let body = read_body(payload, state.envelope.max_body()).await?;
    let metric: Metric =
        state
            .envelope
            .open_signed(&body, content_encoding(&req), signature(&req))?;
    let update = metric.validate()?;

    let stored = state.engine.apply(&update).await?;
    let reply = MetricUpdate {
        id: update.id,
        value: stored,
    };
    signed_json(&state, &reply.to_metric())
}

/// `POST /updates/` with a sealed batch
pub async fn update_batch(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let body = read_body(payload, state.envelope.max_body()).await?;
    let metrics: Vec<Metric> =
        state
            .envelope
            .open(&body, content_encoding(&req), signature(&req))?;

    state.engine.save_batch(&metrics).await?;
    info!("Accepted batch of {} metrics", metrics.len());
    signed_json(&state, &serde_json::json!({}))
}

/// `GET /value/{kind}/{name}`
pub async fn value_from_path(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (kind, name) = path.into_inner();
    let kind: MetricKind = kind.parse()?;
    let value = state.engine.get(kind, require_name(&name)?).await?;
    Ok(text(value))
}

/// `POST /value/` with `{"id", "type"}`
pub async fn value_json(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let limit = state.envelope.max_body();
    let body = read_body(payload, limit).await?;
    let body = if compression::is_gzip(content_encoding(&req)) {
        compression::gunzip(&body, limit)?
    } else {
        body.to_vec()
    };
    let query: MetricQuery = serde_json::from_slice(&body)?;

    let id = require_name(&query.id)?.to_string();
    let value = state.engine.get(query.kind, &id).await?;
    signed_json(&state, &MetricUpdate { id, value }.to_metric())
}
