//! Stored image proxy.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::Storage;

/// Serve an uploaded image from S3.
#[utoipa::path(
    get,
    path = "/api/v1/files/{key}",
    tag = "files",
    params(("key" = String, Path, description = "Storage key, e.g. courses/{id}/thumbnail.png")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Unknown or private key", body = crate::error::ErrorResponse)
    )
)]
pub async fn serve_file(
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let key = path.into_inner();
    if !Storage::is_public_key(&key) {
        return Err(AppError::NotFound("File".to_string()));
    }

    debug!("Serving file from S3: {}", key);
    let (data, content_type) = storage.get(&key).await?;
    let content_type = content_type.unwrap_or_else(|| {
        let ext = key.rsplit('.').next().unwrap_or("");
        Storage::content_type_for_extension(ext).to_string()
    });

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::CACHE_CONTROL, "public, max-age=3600"))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .body(data))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/files/{key:.*}").route(web::get().to(serve_file)));
}
