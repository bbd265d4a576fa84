use mongodb::bson::Document;

use crate::config::POSTS_COLLECTION;
use crate::core::db::Store;
use crate::core::errors::StoreError;
use crate::models::models::Post;
use crate::search::{get_entities, Pattern, SearchPage, SearchQuery};

// Handles are matched on the author, every commenter and the echoed author
const IDENTITY_FIELDS: &[&str] = &["username", "comments.username", "echo.username"];

// `comment.text` is singular as stored in the archive
const CONTENT_FIELDS: &[&str] = &["text", "media.title", "comment.text", "echo.text"];

/// Prefix `@` unless the handle already carries it.
pub fn normalize_handle(username: &str) -> String {
    if username.starts_with('@') {
        username.to_string()
    } else {
        format!("@{}", username)
    }
}

pub fn identity_query(username: &str) -> SearchQuery {
    if username.is_empty() {
        return SearchQuery::Empty;
    }

    let handle = normalize_handle(username);
    let clauses: Vec<Document> = IDENTITY_FIELDS
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(*field, handle.as_str());
            clause
        })
        .collect();
    SearchQuery::any_of(clauses)
}

pub fn content_query(content: &str) -> SearchQuery {
    if content.is_empty() {
        return SearchQuery::Empty;
    }

    SearchQuery::any_of(Pattern::new(content, true).on_fields(CONTENT_FIELDS))
}

/// Posts by or mentioning `username` whose text matches `content`. Either
/// input may be empty; both empty gives [`SearchQuery::Empty`].
pub fn search_posts_query(username: &str, content: &str) -> SearchQuery {
    identity_query(username).and(content_query(content))
}

pub async fn search_posts<S: Store>(
    store: &S,
    username: &str,
    content: &str,
    page: i64,
) -> Result<SearchPage<Post>, StoreError> {
    get_entities(store, POSTS_COLLECTION, search_posts_query(username, content), page).await
}
