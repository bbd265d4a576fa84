use mongodb::bson::Document;

use crate::config::USERS_COLLECTION;
use crate::core::db::Store;
use crate::core::errors::StoreError;
use crate::models::models::User;
use crate::search::{get_entities, Pattern, SearchPage, SearchQuery};

const USER_SEARCH_FIELDS: &[&str] = &["name", "username"];

/// Case-insensitive substring match on display name or username.
pub fn search_users_query(username: &str) -> SearchQuery {
    if username.is_empty() {
        return SearchQuery::Empty;
    }

    let clauses: Vec<Document> = Pattern::new(username, true).on_fields(USER_SEARCH_FIELDS);
    SearchQuery::any_of(clauses)
}

pub async fn search_users<S: Store>(
    store: &S,
    username: &str,
    page: i64,
) -> Result<SearchPage<User>, StoreError> {
    get_entities(store, USERS_COLLECTION, search_users_query(username), page).await
}
