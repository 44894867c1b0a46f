//! Shared request plumbing for the live API clients

use crate::error::{CollectorError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest slice of an error body kept in error messages
const MAX_ERROR_BODY: usize = 200;

/// Build an HTTP client with a bounded request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CollectorError::Transport(format!("failed to create HTTP client: {}", e)))
}

/// Send a GET and decode its JSON body
///
/// Send and body-read failures map to `Transport`, any status other than
/// 200 or an undecodable body to `Upstream`.
pub(crate) async fn get_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if status != StatusCode::OK {
        let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
        return Err(CollectorError::Upstream(format!(
            "{} API returned status {}: {}",
            provider, status, snippet
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        CollectorError::Upstream(format!("{} returned malformed payload: {}", provider, e))
    })
}

/// Reject prices that cannot be a USD quote
pub(crate) fn validate_price(provider: &str, price: f64) -> Result<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(CollectorError::Upstream(format!(
            "{} returned invalid price: {}",
            provider, price
        )))
    }
}
