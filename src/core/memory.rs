use mongodb::bson::{self, Bson, Document};
use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::core::db::Store;
use crate::core::errors::StoreError;

/// In-process [`Store`] over BSON documents kept in insertion order.
///
/// Evaluates the subset of the MongoDB filter language the search queries
/// produce: `$or`, `$and`, equality and `$regex`/`$options` on dotted paths
/// that descend through arrays. Failures can be injected per operation.
#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
    fail_count: Mutex<Option<StoreError>>,
    fail_find: Mutex<Option<StoreError>>,
    accesses: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: &str, doc: Document) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn insert_many<I>(&mut self, collection: &str, docs: I)
    where
        I: IntoIterator<Item = Document>,
    {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    /// Make every following `count` call fail with `err`.
    pub fn fail_count(&self, err: StoreError) {
        *lock(&self.fail_count) = Some(err);
    }

    /// Make every following `find` call fail with `err`.
    pub fn fail_find(&self, err: StoreError) {
        *lock(&self.fail_find) = Some(err);
    }

    /// Number of `count` and `find` calls served so far.
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    fn matching(&self, collection: &str, filter: &Document) -> Result<Vec<&Document>, StoreError> {
        let docs = match self.collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        let mut matched = Vec::new();
        for doc in docs {
            if matches_filter(doc, filter)? {
                matched.push(doc);
            }
        }
        Ok(matched)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Store for MemoryStore {
    async fn count(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.fail_count).clone() {
            return Err(err);
        }

        Ok(self.matching(collection, &filter)?.len() as u64)
    }

    async fn find<T>(
        &self,
        collection: &str,
        filter: Document,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send + Sync + Unpin,
    {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.fail_find).clone() {
            return Err(err);
        }

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        self.matching(collection, &filter)?
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| bson::from_document(doc.clone()).map_err(|e| StoreError::Decode(e.to_string())))
            .collect()
    }
}

/// Evaluate a filter document against a stored document.
pub fn matches_filter(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches_filter(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches_filter(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            op if op.starts_with('$') => {
                return Err(StoreError::Query(format!("unknown top level operator: {}", op)));
            }
            path => matches_field(&resolve(doc, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, condition: &'a Bson) -> Result<Vec<&'a Document>, StoreError> {
    let items = match condition {
        Bson::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(StoreError::Query(format!(
                "{} must be a nonempty array",
                op
            )))
        }
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(StoreError::Query(format!("{} argument's entries must be objects", op))),
        })
        .collect()
}

/// Collect every value reachable at a dotted path, flattening arrays.
fn resolve<'a>(doc: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut current: Vec<&Bson> = Vec::new();
    let mut segments = path.split('.');

    if let Some(first) = segments.next() {
        if let Some(value) = doc.get(first) {
            current.push(value);
        }
    }

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(sub) => next.extend(sub.get(segment)),
                Bson::Array(items) => {
                    for item in items {
                        if let Bson::Document(sub) = item {
                            next.extend(sub.get(segment));
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }

    current
}

fn matches_field(values: &[&Bson], condition: &Bson) -> Result<bool, StoreError> {
    match condition {
        Bson::Document(ops) if ops.keys().any(|k| k.starts_with('$')) => {
            let regex = operator_regex(ops)?;
            Ok(values.iter().any(|value| match value {
                Bson::String(s) => regex.is_match(s),
                Bson::Array(items) => items.iter().any(|item| matches!(item, Bson::String(s) if regex.is_match(s))),
                _ => false,
            }))
        }
        expected => Ok(values.iter().any(|value| match value {
            Bson::Array(items) => *value == expected || items.iter().any(|item| item == expected),
            _ => *value == expected,
        })),
    }
}

fn operator_regex(ops: &Document) -> Result<Regex, StoreError> {
    let mut pattern = None;
    let mut case_insensitive = false;

    for (op, value) in ops {
        match (op.as_str(), value) {
            ("$regex", Bson::String(p)) => pattern = Some(p.as_str()),
            ("$options", Bson::String(opts)) => case_insensitive = opts.contains('i'),
            (op, _) => return Err(StoreError::Query(format!("unsupported operator: {}", op))),
        }
    }

    let pattern = pattern.ok_or_else(|| StoreError::Query("$options needs a $regex".to_string()))?;
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| StoreError::Query(format!("Regular expression is invalid: {}", e)))
}
