pub mod config;
pub mod core;
pub mod handlers;
pub mod models;
pub mod posts;
pub mod search;
pub mod static_server;
pub mod templates;
pub mod users;

pub use crate::core::db::{MongoStore, Store};
pub use crate::core::errors::{ApiError, StoreError};
pub use crate::core::memory::MemoryStore;
pub use crate::posts::search_posts;
pub use crate::search::{get_entities, Pattern, SearchPage, SearchQuery};
pub use crate::users::search_users;
