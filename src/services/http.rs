//! Shared HTTP plumbing for the remote gateways: one client builder, one
//! retry policy, one transient-error classification.

use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct GatewayHttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
}

impl Default for GatewayHttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(2),
        }
    }
}

impl GatewayHttpConfig {
    pub fn build_client(&self, gateway: &'static str) -> Result<Client, AppError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::gateway(gateway, format!("failed to create HTTP client: {e}")))
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: Some(self.timeout * self.max_retries),
            ..Default::default()
        }
    }
}

/// Send a request with retry on transient failures, returning the first
/// settled response. Status handling beyond retry classification is the
/// caller's: a 404 means different things to different gateways.
pub async fn send_with_retry<F>(
    config: &GatewayHttpConfig,
    gateway: &'static str,
    build_request: F,
) -> Result<Response, AppError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let backoff = config.build_backoff();

    retry_notify(
        backoff,
        || {
            let request = build_request();
            async move { send_once(request, gateway).await }
        },
        |err: AppError, duration: Duration| {
            warn!(gateway, error = %err, retry_after_ms = duration.as_millis() as u64, "Retry scheduled");
        },
    )
    .await
}

async fn send_once(
    request: reqwest::RequestBuilder,
    gateway: &'static str,
) -> Result<Response, backoff::Error<AppError>> {
    let start = Instant::now();

    let response = request.send().await.map_err(|e| {
        let latency_ms = start.elapsed().as_millis() as u64;
        let err = AppError::gateway(gateway, format!("request failed: {e}"));
        if is_transient_error(&e) {
            warn!(gateway, error = %e, latency_ms, "Transient error, will retry");
            backoff::Error::transient(err)
        } else {
            warn!(gateway, error = %e, latency_ms, "Permanent error, aborting");
            backoff::Error::permanent(err)
        }
    })?;

    let status = response.status();
    debug!(gateway, status = %status, latency_ms = start.elapsed().as_millis() as u64, "Received HTTP response");

    if is_transient_status(status) {
        warn!(gateway, status = %status, "Transient HTTP status, will retry");
        return Err(backoff::Error::transient(AppError::gateway(
            gateway,
            format!("status {status}"),
        )));
    }

    Ok(response)
}

pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
