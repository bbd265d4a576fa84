pub mod db;
pub mod errors;
pub mod helpers;
pub mod memory;
pub mod query_params;
