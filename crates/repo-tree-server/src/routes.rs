use std::path::Path;

use actix_files::Files;
use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{Instrument, info_span, warn};

use crate::error::AppError;
use crate::pipeline::TreePipeline;

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(get_tree);
}

/// Serve the front-end for every other path. Registered last so it never
/// shadows the API routes.
pub fn register_static(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    if !static_dir.is_dir() {
        warn!(
            static_dir = %static_dir.display(),
            "static directory not found, front-end will not be served"
        );
        return;
    }
    cfg.service(Files::new("/", static_dir).index_file("index.html"));
}

#[get("/healthz")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "repo-tree",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Deserialize)]
struct TreeQuery {
    url: Option<String>,
}

#[get("/tree")]
async fn get_tree(
    query: web::Query<TreeQuery>,
    pipeline: web::Data<TreePipeline>,
) -> Result<HttpResponse, AppError> {
    let url = query.into_inner().url;
    let span = info_span!("tree", url = url.as_deref().unwrap_or_default());

    let root = pipeline
        .run(url.as_deref())
        .instrument(span.clone())
        .await
        .inspect_err(|e| span.in_scope(|| warn!(error = %e, "tree request failed")))?;

    Ok(HttpResponse::Ok().json(root))
}
