pub mod retry;

pub use retry::{retry_with_backoff, retryable_status, RetryPolicy};
