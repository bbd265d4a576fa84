use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::core::query_params::encode_query;
use crate::models::models::{Post, User};
use crate::search::SearchPage;
use crate::static_server::Assets;

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\b(PAGE_TITLE|PAGE_CONTENT|SEARCH_TERM|SEARCH_CONTENT|SEARCH_RESULTS)\b")
            .expect("Regex should compile")
    })
}

fn load(name: &str) -> anyhow::Result<String> {
    let template = Assets::get(name)
        .ok_or_else(|| anyhow::anyhow!("Template {} not found", name))?
        .data
        .to_vec();
    Ok(String::from_utf8(template)?)
}

/// Substitute placeholders in a single pass, so inserted values are never
/// themselves scanned for placeholders.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).to_string()
}

fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).to_string()
}

fn layout(title: &str, content: &str) -> anyhow::Result<String> {
    let layout = load("layout.html")?;
    Ok(fill(&layout, &[("PAGE_TITLE", &escape(title)), ("PAGE_CONTENT", content)]))
}

pub fn render_index() -> anyhow::Result<String> {
    layout("Archive Search", &load("index.html")?)
}

/// Posts search page. `results` is `None` for the bare search form.
pub fn render_posts(
    search_term: &str,
    search_content: &str,
    page: i64,
    results: Option<&SearchPage<Post>>,
) -> anyhow::Result<String> {
    let results_html = match results {
        Some(results) => {
            let items: Vec<String> = results.records.iter().map(render_post).collect();
            let links = pagination(
                "/posts",
                &[("search_term", search_term), ("search_content", search_content)],
                page,
                results.page_count,
            );
            results_section(&items, &links)
        }
        None => String::new(),
    };

    let body = fill(
        &load("posts.html")?,
        &[
            ("SEARCH_TERM", &escape_attr(search_term)),
            ("SEARCH_CONTENT", &escape_attr(search_content)),
            ("SEARCH_RESULTS", &results_html),
        ],
    );
    layout("Search posts", &body)
}

/// Users search page. `results` is `None` for the bare search form.
pub fn render_users(
    search_term: &str,
    page: i64,
    results: Option<&SearchPage<User>>,
) -> anyhow::Result<String> {
    let results_html = match results {
        Some(results) => {
            let items: Vec<String> = results.records.iter().map(render_user).collect();
            let links = pagination("/users", &[("search_term", search_term)], page, results.page_count);
            results_section(&items, &links)
        }
        None => String::new(),
    };

    let body = fill(
        &load("users.html")?,
        &[
            ("SEARCH_TERM", &escape_attr(search_term)),
            ("SEARCH_RESULTS", &results_html),
        ],
    );
    layout("Search users", &body)
}

fn results_section(items: &[String], links: &str) -> String {
    if items.is_empty() {
        return format!(r#"<p class="empty">No results found.</p>{}"#, links);
    }
    format!(r#"<section class="results">{}</section>{}"#, items.concat(), links)
}

fn render_user(user: &User) -> String {
    let bio = user
        .bio
        .as_ref()
        .map(|bio| format!(r#"<p class="bio">{}</p>"#, escape(bio)))
        .unwrap_or_default();

    format!(
        r#"<article class="result"><span class="name">{}</span> <span class="handle">{}</span>{}</article>"#,
        escape(&user.name),
        escape(&user.username),
        bio,
    )
}

fn render_post(post: &Post) -> String {
    let mut html = format!(
        r#"<article class="result"><span class="handle">{}</span><p>{}</p>"#,
        escape(&post.username),
        escape(&post.text),
    );

    let titles: Vec<String> = post
        .media
        .iter()
        .filter(|m| !m.title.is_empty())
        .map(|m| format!("<li>{}</li>", escape(&m.title)))
        .collect();
    if !titles.is_empty() {
        html.push_str(&format!(r#"<ul class="media">{}</ul>"#, titles.concat()));
    }

    if let Some(echo) = &post.echo {
        html.push_str(&format!(
            r#"<blockquote class="echo"><span class="handle">{}</span> {}</blockquote>"#,
            escape(&echo.username),
            escape(&echo.text),
        ));
    }

    if !post.comments.is_empty() {
        let comments: Vec<String> = post
            .comments
            .iter()
            .map(|c| format!(r#"<li><span class="handle">{}</span> {}</li>"#, escape(&c.username), escape(&c.text)))
            .collect();
        html.push_str(&format!(r#"<ul class="comments">{}</ul>"#, comments.concat()));
    }

    html.push_str("</article>");
    html
}

/// Previous/next links around a "page X of Y" label. Pages are zero-based
/// internally and shown one-based.
fn pagination(path: &str, params: &[(&str, &str)], page: i64, page_count: u64) -> String {
    let page = page.max(0);
    let link = |target: i64, label: &str| {
        let target = target.to_string();
        let mut query: Vec<(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).copied().collect();
        query.push(("page", &target));
        format!(r#"<a href="{}?{}">{}</a>"#, path, escape_attr(&encode_query(&query)), label)
    };

    let prev = if page > 0 { link(page - 1, "&laquo; Previous") } else { String::new() };
    let shown = page.saturating_add(1);
    let next = if u64::try_from(shown).unwrap_or(u64::MAX) < page_count {
        link(shown, "Next &raquo;")
    } else {
        String::new()
    };

    format!(
        r#"<nav class="pagination">{}<span>Page {} of {}</span>{}</nav>"#,
        prev,
        shown,
        page_count,
        next
    )
}
