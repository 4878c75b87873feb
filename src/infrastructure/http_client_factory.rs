//! Shared HTTP client construction for the exchange, universe, and
//! notification collaborators — exponential backoff with bounded retries
//! on transient failures. Mirrors `infrastructure::core::http_client_factory`.

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

/// Builds an HTTP client with exponential-backoff retry middleware, honoring
/// `Retry-After` on 429/5xx via `reqwest-retry`'s default transient policy.
pub fn build_client(max_retries: u32) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    let client = Client::builder()
        .pool_max_idle_per_host(5)
        .timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new());

    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}
