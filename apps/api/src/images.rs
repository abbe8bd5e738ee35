//! Product image upload.
//!
//! Images are pushed to a Cloudinary-compatible host with a signed
//! multipart request; the returned `secure_url` is what gets stored on the
//! product.
//!
//! # API Reference
//!
//! - Endpoint: `https://api.cloudinary.com/v1_1/<cloud>/image/upload`
//! - Signature: `sha256("timestamp=<ts>" + api_secret)`, hex encoded
//!
//! Handlers depend on the [`ImageStore`] trait so tests can run without
//! network access.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ApiConfig, CloudinaryConfig};

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Errors that can occur while uploading an image.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No image host credentials were configured.
    #[error("image host is not configured")]
    NotConfigured,

    /// The request did not complete within the upload timeout.
    #[error("upload timed out")]
    Timeout,

    /// HTTP request failed.
    #[error("{0}")]
    Http(reqwest::Error),

    /// Image host answered with an error.
    #[error("{status} - {message}")]
    Api { status: u16, message: String },

    /// The upload request carried no file bytes.
    #[error("empty file")]
    EmptyFile,
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::Http(err)
        }
    }
}

/// Destination for uploaded product images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image and return its public URL.
    async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError>;
}

/// Build the image store described by the configuration.
pub fn image_store(config: &ApiConfig) -> Result<Arc<dyn ImageStore>, UploadError> {
    match &config.cloudinary {
        Some(cloudinary) => Ok(Arc::new(CloudinaryUploader::new(
            cloudinary.clone(),
            config.upload_timeout,
        )?)),
        None => Ok(Arc::new(Unconfigured)),
    }
}

// =============================================================================
// Cloudinary
// =============================================================================

/// Signed uploads to Cloudinary.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryUploader {
    /// Create an uploader whose requests give up after `timeout`.
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{BASE_URL}/{}/image/upload", self.config.cloud_name)
    }
}

/// Request signature over the signed parameters.
pub fn sign(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("timestamp={timestamp}{api_secret}").as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageStore for CloudinaryUploader {
    async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let timestamp = Utc::now().timestamp();
        let size = bytes.len();

        let mut file = Part::bytes(bytes).file_name(filename.to_string());
        if let Some(mime) = content_type {
            file = file.mime_str(mime)?;
        }

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", sign(timestamp, &self.config.api_secret))
            .text("signature_algorithm", "sha256")
            .part("file", file);

        debug!(filename, size, "Uploading image");

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("upload rejected").to_string(),
            };
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        info!(url = %body.secure_url, "Image uploaded");
        Ok(body.secure_url)
    }
}

/// Store used when no image host is configured; every upload fails.
struct Unconfigured;

#[async_trait]
impl ImageStore for Unconfigured {
    async fn upload(
        &self,
        _filename: &str,
        _content_type: Option<&str>,
        _bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        Err(UploadError::NotConfigured)
    }
}
