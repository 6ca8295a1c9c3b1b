//! Liveness check and the metrics overview page

use crate::core::MetricsSnapshot;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use std::fmt::Write;
use tracing::{debug, error};

/// Configure health and overview routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping/", web::get().to(ping))
        .route("/", web::get().to(index));
}

/// `GET /ping/`: round trip to the storage backend
pub async fn ping(state: web::Data<AppState>) -> HttpResponse {
    match state.engine.ping().await {
        Ok(()) => {
            debug!("Ping ok");
            HttpResponse::Ok().finish()
        }
        Err(e) => {
            error!("Storage ping failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// `GET /`: every gauge and counter as an HTML table
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    let snapshot = state.engine.get_all().await?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_index(&snapshot)))
}

fn render_index(snapshot: &MetricsSnapshot) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Metrics</title></head>\n<body>\n<table>\n<tr><th>Type</th><th>Name</th><th>Value</th></tr>\n",
    );
    for (name, value) in &snapshot.gauge {
        let _ = writeln!(
            html,
            "<tr><td>gauge</td><td>{}</td><td>{}</td></tr>",
            escape(name),
            value
        );
    }
    for (name, total) in &snapshot.counter {
        let _ = writeln!(
            html,
            "<tr><td>counter</td><td>{}</td><td>{}</td></tr>",
            escape(name),
            total
        );
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
