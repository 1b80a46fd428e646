pub mod db;
pub mod in_memory;
pub mod models;
pub mod schema;
pub mod store;
pub mod vector;

mod error;

pub use error::Error;
pub use store::{BoxFuture, MemoryStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
