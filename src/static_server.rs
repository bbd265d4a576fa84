use actix_web::HttpResponse;
use mime_guess::from_path;
use rust_embed::RustEmbed;

use crate::core::errors::ApiError;

#[derive(RustEmbed)]
#[folder = "static"]
pub struct Assets;

/// Serve an embedded asset. HTML files are templates and never served raw.
pub fn serve_static(path: &str) -> Result<HttpResponse, ApiError> {
    let file_path = path.trim_start_matches('/');
    if file_path.is_empty() || file_path.ends_with(".html") {
        return Err(ApiError::NotFound(path.to_string()));
    }

    let file = Assets::get(file_path).ok_or_else(|| ApiError::NotFound(path.to_string()))?;

    let mime = from_path(file_path).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .body(file.data.into_owned()))
}
