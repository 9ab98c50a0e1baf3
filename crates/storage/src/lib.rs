pub mod db;
pub mod retry;
pub mod store;

pub use db::{create_db, DbPool};
pub use retry::{message_is_transient, with_retry, with_retry_if, RetryPolicy, Transient};
pub use store::{StorageError, Store};
