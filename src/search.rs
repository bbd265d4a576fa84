use mongodb::bson::{doc, Bson, Document};
use serde::de::DeserializeOwned;

use crate::config::PAGE_LIMIT;
use crate::core::db::Store;
use crate::core::errors::StoreError;

/// A filter ready to send to the store, or `Empty` when there is nothing to
/// search for and the round trip should be skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Empty,
    Filter(Document),
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        matches!(self, SearchQuery::Empty)
    }

    /// Disjunction of `clauses`, `Empty` when there are none.
    pub fn any_of(clauses: Vec<Document>) -> Self {
        if clauses.is_empty() {
            return SearchQuery::Empty;
        }
        let clauses: Vec<Bson> = clauses.into_iter().map(Bson::Document).collect();
        SearchQuery::Filter(doc! { "$or": clauses })
    }

    /// Conjunction of two queries. An `Empty` side is dropped rather than
    /// producing an empty clause list, which the store rejects.
    pub fn and(self, other: SearchQuery) -> Self {
        match (self, other) {
            (SearchQuery::Empty, SearchQuery::Empty) => SearchQuery::Empty,
            (query, SearchQuery::Empty) | (SearchQuery::Empty, query) => query,
            (SearchQuery::Filter(left), SearchQuery::Filter(right)) => {
                SearchQuery::Filter(doc! { "$and": [left, right] })
            }
        }
    }
}

/// Substring match on user supplied text.
///
/// The text is escaped so every character matches literally.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    escaped: String,
    case_insensitive: bool,
}

impl Pattern {
    pub fn new(text: &str, case_insensitive: bool) -> Self {
        Self {
            escaped: regex::escape(text),
            case_insensitive,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.escaped
    }

    pub fn to_bson(&self) -> Bson {
        let mut condition = doc! { "$regex": self.escaped.as_str() };
        if self.case_insensitive {
            condition.insert("$options", "i");
        }
        Bson::Document(condition)
    }

    /// The same pattern applied to each of `fields`.
    pub fn on_fields(&self, fields: &[&str]) -> Vec<Document> {
        fields
            .iter()
            .map(|field| {
                let mut clause = Document::new();
                clause.insert(*field, self.to_bson());
                clause
            })
            .collect()
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage<T> {
    /// 0 when no search ran, otherwise at least 1.
    pub page_count: u64,
    pub records: Vec<T>,
}

impl<T> SearchPage<T> {
    pub fn empty() -> Self {
        Self {
            page_count: 0,
            records: Vec::new(),
        }
    }
}

pub fn page_count(total: u64) -> u64 {
    total / PAGE_LIMIT + 1
}

/// Records to skip for a zero-based page, capped at what the server accepts
/// as a signed 64-bit skip.
pub fn page_skip(page: i64) -> u64 {
    u64::try_from(page.max(0))
        .unwrap_or(0)
        .saturating_mul(PAGE_LIMIT)
        .min(i64::MAX as u64)
}

/// Fetch one page of `collection` matching `query` together with the page
/// count.
///
/// Count and find run concurrently and both are always awaited. A query
/// execution failure from either one yields an empty first page; any other
/// store error is returned.
pub async fn get_entities<S, T>(
    store: &S,
    collection: &str,
    query: SearchQuery,
    page: i64,
) -> Result<SearchPage<T>, StoreError>
where
    S: Store,
    T: DeserializeOwned + Send + Sync + Unpin,
{
    let filter = match query {
        SearchQuery::Empty => return Ok(SearchPage::empty()),
        SearchQuery::Filter(filter) => filter,
    };

    let skip = page_skip(page);
    let (total, records) = tokio::join!(
        store.count(collection, filter.clone()),
        store.find::<T>(collection, filter, skip, PAGE_LIMIT),
    );

    let (total, records) = match (total, records) {
        (Ok(total), Ok(records)) => (total, records),
        (Err(err), _) | (_, Err(err)) => {
            if !err.is_query_failure() {
                return Err(err);
            }
            tracing::error!("Failure retrieving {}: {}", collection, err);
            (0, Vec::new())
        }
    };

    let page_count = page_count(total);
    tracing::debug!(
        collection,
        page,
        total,
        page_count,
        returned = records.len(),
        "search page fetched"
    );

    Ok(SearchPage { page_count, records })
}
