//! REST client for the console backend.
//!
//! Every endpoint wraps its payload in a `{ "data": ... }` envelope.
//! Collection endpoints return a [`PageData`] and accept `page`, `per_page`
//! and the resource's filter parameters as query string. Validation
//! failures come back as `422` with a `{ message, errors }` body and are
//! surfaced as [`ApiError::Validation`].

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use console_core::listing::{ManagedResource, PageData};
use console_core::types::{DbId, FieldErrors};

use crate::backend::ListRequest;
use crate::config::ClientConfig;

/// HTTP client for the console REST API.
#[derive(Clone)]
pub struct ConsoleApi {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: FieldErrors,
}

/// Errors from the console REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status other than `422`.
    #[error("Console API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The backend rejected the payload with per-field messages.
    #[error("Validation failed: {message}")]
    Validation { message: String, errors: FieldErrors },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request(err) => err.status().map(|s| s.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Validation { .. } => Some(StatusCode::UNPROCESSABLE_ENTITY.as_u16()),
        }
    }
}

impl ConsoleApi {
    /// Build a client from configuration, applying the request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(
            client,
            config.api_url.clone(),
            config.api_token.clone(),
        ))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `GET {path}` with pagination and filter query parameters.
    pub async fn list<R: ManagedResource>(
        &self,
        request: &ListRequest<R::Filters>,
    ) -> Result<PageData<R::Item>, ApiError> {
        tracing::debug!(
            resource = R::NAME,
            page = request.page,
            per_page = request.per_page,
            "Fetching page",
        );

        let response = self
            .request(Method::GET, R::PATH)
            .query(&request.query_pairs())
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `GET {path}/statistics`.
    pub async fn stats<R: ManagedResource>(&self) -> Result<R::Stats, ApiError> {
        let response = self
            .request(Method::GET, &format!("{}/statistics", R::PATH))
            .send()
            .await?;

        Self::parse_data(response).await
    }

    /// `POST {path}`.
    pub async fn create<R: ManagedResource, B: Serialize + ?Sized>(
        &self,
        payload: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .request(Method::POST, R::PATH)
            .json(payload)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `PUT {path}/{id}`.
    pub async fn update<R: ManagedResource, B: Serialize + ?Sized>(
        &self,
        id: DbId,
        payload: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .request(Method::PUT, &format!("{}/{id}", R::PATH))
            .json(payload)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// `DELETE {path}/{id}`.
    pub async fn delete<R: ManagedResource>(&self, id: DbId) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, &format!("{}/{id}", R::PATH))
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.api_url, path))
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map non-2xx responses to [`ApiError`]. A `422` body is decoded into
    /// per-field messages when it has the expected shape.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Ok(parsed) = serde_json::from_str::<ValidationBody>(&body) {
                return Err(ApiError::Validation {
                    message: parsed.message,
                    errors: parsed.errors,
                });
            }
        }

        tracing::warn!(status = status.as_u16(), "Console API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn parse_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<DataResponse<T>>().await?;
        Ok(envelope.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
