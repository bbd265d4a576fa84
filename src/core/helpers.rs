use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;

pub fn html_response(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Minimal self-contained failure page, independent of the embedded templates
/// so it renders even when those fail to load.
pub fn error_page(status: StatusCode, message: &str) -> HttpResponse {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{status} {title}</title><link rel="stylesheet" href="/style.css"></head>
<body>
    <main class="error">
        <h1>{status} {title}</h1>
        <p>{message}</p>
        <a href="/">Back to search</a>
    </main>
</body>
</html>"#,
        status = status.as_u16(),
        title = html_escape::encode_text(title),
        message = html_escape::encode_text(message),
    );

    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}
