use actix_web::{web, HttpRequest, HttpResponse};

use crate::config::{ROUTE_PARAMS, SEARCH_TYPES};
use crate::core::db::Store;
use crate::core::errors::ApiError;
use crate::core::helpers::{html_response, redirect};
use crate::core::query_params::{encode_query, get_page, get_string, parse_query_params};
use crate::posts::search_posts;
use crate::static_server::serve_static;
use crate::templates::{render_index, render_posts, render_users};
use crate::users::search_users;

/// Register every route against a shared store of type `S`.
pub fn configure<S: Store + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/posts", web::get().to(posts::<S>))
        .route("/posts/", web::get().to(posts::<S>))
        .route("/users", web::get().to(users::<S>))
        .route("/users/", web::get().to(users::<S>))
        .default_service(web::route().to(assets));
}

/// The home form submits `search_type` alongside the search fields; route
/// it to the matching search page.
pub async fn home(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let params = parse_query_params(req.query_string());
    let search_type = get_string(&params, "search_type");

    if SEARCH_TYPES.contains(&search_type.as_str()) {
        let forwarded: Vec<(&str, &str)> = params
            .iter()
            .filter(|(key, _)| !ROUTE_PARAMS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let location = format!("/{}?{}", search_type, encode_query(&forwarded));
        tracing::debug!(%location, "rerouting home search");
        return Ok(redirect(&location));
    }

    Ok(html_response(render_index()?))
}

pub async fn posts<S: Store + 'static>(
    store: web::Data<S>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let params = parse_query_params(req.query_string());
    let search_term = get_string(&params, "search_term");
    let search_content = get_string(&params, "search_content");
    let page = get_page(&params);

    if search_term.is_empty() && search_content.is_empty() {
        return Ok(html_response(render_posts("", "", 0, None)?));
    }

    let results = search_posts(store.get_ref(), &search_term, &search_content, page).await?;
    tracing::info!(
        search_term = %search_term,
        search_content = %search_content,
        page,
        page_count = results.page_count,
        "post search"
    );

    Ok(html_response(render_posts(&search_term, &search_content, page, Some(&results))?))
}

pub async fn users<S: Store + 'static>(
    store: web::Data<S>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let params = parse_query_params(req.query_string());
    let search_term = get_string(&params, "search_term");
    let page = get_page(&params);

    if search_term.is_empty() {
        return Ok(html_response(render_users("", 0, None)?));
    }

    let results = search_users(store.get_ref(), &search_term, page).await?;
    tracing::info!(
        search_term = %search_term,
        page,
        page_count = results.page_count,
        "user search"
    );

    Ok(html_response(render_users(&search_term, page, Some(&results))?))
}

pub async fn assets(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    serve_static(req.path())
}
