use std::env;

// === Search ===
pub const PAGE_LIMIT: u64 = 20;

pub const USERS_COLLECTION: &str = "users";
pub const POSTS_COLLECTION: &str = "posts";

// Query params consumed by the home page reroute and never forwarded
pub const ROUTE_PARAMS: &[&str] = &["search_type"];
pub const SEARCH_TYPES: &[&str] = &[POSTS_COLLECTION, USERS_COLLECTION];

// === Environment ===
pub const DEFAULT_DATABASE: &str = "parler";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:80";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo_user: String,
    pub mongo_pass: String,
    pub mongo_endpoint: String,
    pub mongo_port: u16,
    pub mongo_database: String,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load configuration from the process environment, after applying any
    /// `.env` file found in the working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("Missing environment variable {}", key))
        };

        let port = required("MONGO_PORT")?;
        let mongo_port = port
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("Invalid MONGO_PORT '{}': {}", port, e))?;

        Ok(Self {
            mongo_user: required("MONGO_USER")?,
            mongo_pass: required("MONGO_PASS")?,
            mongo_endpoint: required("MONGO_ENDPOINT")?,
            mongo_port,
            mongo_database: lookup("MONGO_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            bind_addr: lookup("SEARCH_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }

    pub fn mongo_uri(&self) -> String {
        format!(
            "mongodb://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.mongo_user),
            urlencoding::encode(&self.mongo_pass),
            self.mongo_endpoint,
            self.mongo_port,
            self.mongo_database,
        )
    }
}
