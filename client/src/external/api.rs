//! Certificate service client
//!
//! The service owns login, the make/model reference table, PDF field
//! extraction and certificate rendering. This module only shapes requests
//! and classifies responses; a 401 from any authenticated endpoint is
//! reported as [`ApiError::SessionExpired`].

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shared::{CertificateRecord, ExtractedFields, ReferenceTable};

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Remote capabilities the pipelines depend on
#[async_trait]
pub trait CertificateApi: Send + Sync {
    /// Exchange the operator password for a session token
    async fn login(&self, password: &str) -> Result<String, ApiError>;

    /// Fetch the make/model reference table
    async fn fetch_reference_table(&self, token: &str) -> Result<ReferenceTable, ApiError>;

    /// Extract certificate fields from one PDF
    async fn extract(
        &self,
        token: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ExtractedFields, ApiError>;

    /// Render one certificate to PDF bytes
    async fn render(&self, token: &str, record: &CertificateRecord) -> Result<Vec<u8>, ApiError>;
}

/// HTTP client for the certificate service
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarDataResponse {
    data: ReferenceTable,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    success: bool,
    data: Option<ExtractedFields>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into an error, reading the body's `error` field
    async fn failure(response: Response, default_message: &str) -> ApiError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::SessionExpired;
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        ApiError::Rejected {
            status,
            message: body.error.unwrap_or_else(|| default_message.to_string()),
        }
    }
}

#[async_trait]
impl CertificateApi for ApiClient {
    async fn login(&self, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&LoginRequest { password })
            .send()
            .await?;

        let status = response.status();
        let body: Option<LoginResponse> = response.json().await.ok();

        if !status.is_success() {
            return Err(ApiError::LoginFailed(
                body.and_then(|b| b.error)
                    .unwrap_or_else(|| "Login failed".to_string()),
            ));
        }

        match body {
            Some(LoginResponse {
                success: true,
                token: Some(token),
                ..
            }) => Ok(token),
            _ => Err(ApiError::LoginFailed(
                "Invalid response from server".to_string(),
            )),
        }
    }

    async fn fetch_reference_table(&self, token: &str) -> Result<ReferenceTable, ApiError> {
        let response = self
            .client
            .get(self.url("/api/car-data"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to load car data").await);
        }

        let body: CarDataResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        tracing::debug!(makes = body.data.len(), "Loaded reference table");
        Ok(body.data)
    }

    async fn extract(
        &self,
        token: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ExtractedFields, ApiError> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/extract-pdf"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Upload failed").await);
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        match body.data {
            Some(fields) if body.success => Ok(fields),
            _ => Err(ApiError::NoData),
        }
    }

    async fn render(&self, token: &str, record: &CertificateRecord) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .post(self.url("/api/generate-certificate"))
            .bearer_auth(token)
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to generate certificate").await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}
