//! Farm API client implementation

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::{CropRecord, CropRecordDraft, CropStageApi, ListFlags, Scope};
use crate::error::{ApiError, Result};

/// Default API base URL for a locally running farm backend
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Default rate limit: 6 requests per second
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 6;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the farm API
pub struct FarmClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FarmClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `http://127.0.0.1:8000/api`
    /// * `token` - Bearer token sent with every request, if any
    /// * `timeout` - Per-request timeout
    /// * `requests_per_second` - Client-side rate limit
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
        requests_per_second: u32,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated request for a path relative to the base URL
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        // Apply rate limiting
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let builder = self.http.request(method, &url);
        match self.token {
            Some(ref token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = check_status(builder.send().await.map_err(ApiError::from)?).await?;
        // The request already took effect; a bad body must not lead to a replay
        let data = response
            .json::<T>()
            .await
            .map_err(|e| ApiError::UnreadableBody(e.to_string()))?;
        Ok(data)
    }
}

/// Map non-success statuses to API errors
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized.into()),
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden.into()),
        StatusCode::NOT_FOUND => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Resource not found".to_string());
            Err(ApiError::NotFound(error_msg).into())
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            Err(ApiError::RateLimit(Duration::from_secs(retry_after)).into())
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Bad request".to_string());
            Err(ApiError::BadRequest(error_msg).into())
        }
        status if status.is_client_error() => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message: error_msg,
            }
            .into())
        }
        status if status.is_server_error() => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("Server error: {}", status));
            Err(ApiError::ServerError(error_msg).into())
        }
        _ => {
            let error_msg = format!("Unexpected status code: {}", status);
            Err(ApiError::InvalidResponse(error_msg).into())
        }
    }
}

#[async_trait]
impl CropStageApi for FarmClient {
    async fn list_records(&self, scope: Scope, flags: ListFlags) -> Result<Vec<CropRecord>> {
        let builder = self
            .request(Method::GET, &scope.collection_path())
            .await
            .query(&flags.query_params());
        self.send_json(builder).await
    }

    async fn create_record(&self, scope: Scope, draft: &CropRecordDraft) -> Result<CropRecord> {
        let builder = self
            .request(Method::POST, &scope.collection_path())
            .await
            .json(draft);
        self.send_json(builder).await
    }

    async fn update_record(
        &self,
        scope: Scope,
        record_id: u64,
        draft: &CropRecordDraft,
    ) -> Result<CropRecord> {
        let builder = self
            .request(Method::PUT, &scope.record_path(record_id))
            .await
            .json(draft);
        self.send_json(builder).await
    }

    async fn delete_record(&self, scope: Scope, record_id: u64) -> Result<()> {
        let response = self
            .request(Method::DELETE, &scope.record_path(record_id))
            .await
            .send()
            .await
            .map_err(ApiError::from)?;
        check_status(response).await?;
        Ok(())
    }
}
