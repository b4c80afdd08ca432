//! Blocking HTTP GET over a shared tokio runtime.
//!
//! Uses async reqwest internally but presents a sync interface, since the
//! pipeline runs on a single thread and fetches one entity at a time.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::FetchError;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Build a client with a whole-request timeout and default headers.
///
/// `timeout` is the only timeout in the system; a request that exceeds it
/// surfaces as [`FetchError::Timeout`] and is retried by the runner.
pub fn build_client(timeout: Duration, headers: HeaderMap) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| FetchError::from_reqwest(&e))
}

/// GET `url` with query parameters, returning the body of a 2xx response.
pub fn get_text(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = client
            .get(url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))
    })
}
