//! reqwest-backed history service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{HistoryService, MutationResponse};
use crate::error::ServiceError;
use crate::models::{NewRecord, Record, RecordUpdate};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct TotalBody {
    total: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Talks to the history backend rooted at `endpoint`.
/// Clone is cheap - reqwest::Client shares its connection pool.
#[derive(Debug, Clone)]
pub struct HttpHistoryService {
    client: Client,
    endpoint: String,
}

impl HttpHistoryService {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self::with_client(client, endpoint))
    }

    /// Builds the service around an existing client, sharing its pool.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn authorize(builder: RequestBuilder, credential: Option<&str>) -> RequestBuilder {
        match credential {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turns a non-success status into [`ServiceError::Status`], preferring
    /// the backend's `{ "error": ... }` text over the raw body.
    async fn check_response(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error: Some(error) }) => error,
            _ => truncate_body(&body),
        };
        warn!(status = status.as_u16(), %message, "History backend returned an error");

        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_mutation(&self, builder: RequestBuilder) -> Result<Record, ServiceError> {
        let response = Self::check_response(builder.send().await?).await?;
        response
            .json::<Record>()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
}

#[async_trait]
impl HistoryService for HttpHistoryService {
    async fn list(
        &self,
        user_id: &str,
        credential: Option<&str>,
    ) -> Result<Vec<Record>, ServiceError> {
        debug!(user_id, "Fetching history records");
        let builder = self
            .client
            .get(self.url("histories"))
            .query(&[("userId", user_id)]);
        let response = Self::authorize(builder, credential).send().await?;
        let response = Self::check_response(response).await?;

        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }

    async fn total(&self) -> Result<f64, ServiceError> {
        let response = self.client.get(self.url("histories/total")).send().await?;
        let response = Self::check_response(response).await?;

        let body: TotalBody = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        Ok(body.total)
    }

    async fn create(
        &self,
        credential: Option<&str>,
        payload: NewRecord,
    ) -> MutationResponse<Record> {
        let builder = self.client.post(self.url("histories")).json(&payload);
        match self.send_mutation(Self::authorize(builder, credential)).await {
            Ok(record) => MutationResponse::ok(record),
            Err(err) => err.into(),
        }
    }

    async fn update(
        &self,
        credential: Option<&str>,
        id: &str,
        payload: RecordUpdate,
    ) -> MutationResponse<Record> {
        let builder = self
            .client
            .put(self.url(&format!("histories/{}", id)))
            .json(&payload);
        match self.send_mutation(Self::authorize(builder, credential)).await {
            Ok(record) => MutationResponse::ok(record),
            Err(err) => err.into(),
        }
    }

    async fn delete(&self, credential: Option<&str>, id: &str) -> MutationResponse<()> {
        let builder = self.client.delete(self.url(&format!("histories/{}", id)));
        let sent = match Self::authorize(builder, credential).send().await {
            Ok(response) => Self::check_response(response).await,
            Err(err) => Err(err.into()),
        };
        match sent {
            Ok(_) => MutationResponse::ok(()),
            Err(err) => err.into(),
        }
    }
}
