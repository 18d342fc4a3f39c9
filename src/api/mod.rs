use actix_multipart::Multipart;
use actix_web::{error::InternalError, web, HttpResponse, Responder};
use chrono::Utc;
use futures_util::StreamExt;
use std::sync::Arc;

use crate::blob::BlobStore;
use crate::config::DEFAULT_PAYLOAD_LIMIT;
use crate::metrics;
use crate::models::*;
use crate::store::{Store, StoreError};
use crate::web as page;

pub struct AppState {
    pub store: Arc<Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub passphrase: String,
}

// ==================== Health Check ====================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

// ==================== Thoughts Endpoints ====================

pub async fn list_thoughts(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_thoughts() {
        Ok(thoughts) => HttpResponse::Ok().json(thoughts),
        Err(e) => {
            log::error!("GET /api/thoughts error: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to fetch thoughts"))
        }
    }
}

pub async fn create_thought(
    state: web::Data<AppState>,
    body: web::Json<CreateThoughtRequest>,
) -> impl Responder {
    let content = match body.content.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return HttpResponse::BadRequest().json(ApiResponse::error("Content is required")),
    };
    let image_url = body.image_url.as_deref().filter(|url| !url.is_empty());

    match state.store.create_thought(content, image_url) {
        Ok(thought) => HttpResponse::Ok().json(thought),
        Err(e) => {
            log::error!("POST /api/thoughts error: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to create thought"))
        }
    }
}

pub async fn delete_thought(
    state: web::Data<AppState>,
    body: web::Json<DeleteThoughtRequest>,
) -> impl Responder {
    let Some(id) = body.id.parse() else {
        return HttpResponse::BadRequest().json(ApiResponse::error("Invalid thought id"));
    };

    match state.store.delete_thought(id) {
        Ok(_) => HttpResponse::Ok().json(ApiResponse::ok()),
        Err(StoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(ApiResponse::error("Thought not found"))
        }
        Err(e) => {
            log::error!("POST /api/delete-thought error: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Failed to delete thought"))
        }
    }
}

// ==================== Upload Endpoints ====================

struct UploadedFile {
    name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// Pull the `file` part out of a multipart body. `Ok(None)` when there is none.
async fn read_file_part(payload: &mut Multipart) -> Result<Option<UploadedFile>, actix_multipart::MultipartError> {
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map_or(false, |name| name == "file");

        if !is_file {
            while let Some(chunk) = field.next().await {
                chunk?;
            }
            continue;
        }

        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
        }

        return Ok(Some(UploadedFile { name, content_type, data }));
    }
    Ok(None)
}

pub async fn upload(state: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let file = match read_file_part(&mut payload).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return HttpResponse::BadRequest().json(ApiResponse::error("No file provided"));
        }
        Err(e) => {
            log::warn!("Malformed upload: {}", e);
            return HttpResponse::BadRequest().json(ApiResponse::error("No file provided"));
        }
    };

    match state
        .blobs
        .put(&file.name, file.content_type.as_deref(), file.data)
        .await
    {
        Ok(url) => HttpResponse::Ok().json(UploadResponse { url }),
        Err(e) => {
            log::error!("Error uploading file: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error("Error uploading file"))
        }
    }
}

pub async fn get_blob(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (id, _name) = path.into_inner();
    match state.store.get_blob(&id) {
        Ok(blob) => HttpResponse::Ok()
            .content_type(blob.content_type)
            .body(blob.data),
        Err(StoreError::NotFound(_)) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("GET /api/blobs/{} error: {}", id, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ==================== Route Configuration ====================

/// JSON bodies up to `limit` bytes; anything malformed or larger is a 400.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(limit).error_handler(|err, _req| {
        log::debug!("Rejected JSON body: {}", err);
        let response = HttpResponse::BadRequest().json(ApiResponse::error("Invalid request body"));
        InternalError::from_response(err, response).into()
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_routes_with_limit(cfg, DEFAULT_PAYLOAD_LIMIT);
}

pub fn configure_routes_with_limit(cfg: &mut web::ServiceConfig, payload_limit: usize) {
    cfg
        .app_data(json_config(payload_limit))

        // Health check
        .route("/health", web::get().to(health))

        // Journal page
        .route("/", web::get().to(page::index))

        // Thoughts
        .route("/api/thoughts", web::get().to(list_thoughts))
        .route("/api/thoughts", web::post().to(create_thought))
        .route("/api/delete-thought", web::post().to(delete_thought))

        // Uploads
        .route("/api/upload", web::post().to(upload))
        .route("/api/blobs/{id}/{name}", web::get().to(get_blob))

        // Metrics
        .route("/api/metrics", web::get().to(metrics::get_metrics_handler));
}
