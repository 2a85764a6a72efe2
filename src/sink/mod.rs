//! Report upload to S3-compatible object storage
//!
//! The report is already written locally before any upload is attempted, so
//! nothing here can lose or alter it. Failures carry the bucket and key; there
//! is no retry.

mod sigv4;

pub use sigv4::Credentials;

use crate::drift::Report;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use sigv4::{SigningRequest, sign, uri_encode};
use url::Url;

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Object key used when none is configured
pub const DEFAULT_KEY: &str = "report.json";

/// Where and how to upload a report
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub key: String,
    /// Custom endpoint (LocalStack, MinIO, ...). Defaults to AWS for the region.
    pub endpoint: Option<String>,
    pub region: String,
    pub credentials: Credentials,
}

impl S3Config {
    /// `s3://bucket/key` location of the uploaded report
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Endpoint the request is sent to
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            bail!("S3 bucket name cannot be empty");
        }
        if self.key.trim().is_empty() {
            bail!("S3 key cannot be empty");
        }
        if self.credentials.access_key_id.is_empty() || self.credentials.secret_access_key.is_empty()
        {
            bail!(
                "AWS credentials are required to upload to {} (set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY)",
                self.location()
            );
        }
        Ok(())
    }
}

/// Response returned by an [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client trait for testing
pub trait HttpClient: Send + Sync {
    fn put(&self, url: &str, headers: &[(String, String)], body: Vec<u8>) -> Result<HttpResponse>;
}

/// Real HTTP client using reqwest
pub struct ReqwestClient;

impl HttpClient for ReqwestClient {
    fn put(&self, url: &str, headers: &[(String, String)], body: Vec<u8>) -> Result<HttpResponse> {
        let client = reqwest::blocking::Client::new();
        let mut request = client.put(url).body(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .with_context(|| format!("Failed to send request to: {}", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from: {}", url))?;

        Ok(HttpResponse { status, body })
    }
}

/// Destination for a finished report
pub trait ReportSink: Send + Sync {
    /// Upload the report, returning its location
    fn upload(&self, report: &Report, config: &S3Config) -> Result<String>;
}

/// Uploads reports with a signed S3 `PutObject` using path-style addressing
pub struct S3ReportSink<H: HttpClient> {
    http_client: H,
}

impl S3ReportSink<ReqwestClient> {
    /// Create a sink with the default HTTP client
    pub fn new() -> Self {
        Self {
            http_client: ReqwestClient,
        }
    }
}

impl Default for S3ReportSink<ReqwestClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HttpClient> S3ReportSink<H> {
    /// Create a sink with a custom HTTP client (for testing)
    #[cfg(test)]
    pub fn with_client(http_client: H) -> Self {
        Self { http_client }
    }

    fn put_object(&self, config: &S3Config, body: Vec<u8>) -> Result<()> {
        let endpoint = config.endpoint_url();
        let base = Url::parse(&endpoint)
            .with_context(|| format!("Invalid S3 endpoint URL: {}", endpoint))?;

        if !matches!(base.scheme(), "http" | "https") {
            bail!("Unsupported S3 endpoint scheme '{}': {}", base.scheme(), endpoint);
        }
        let host = base
            .host_str()
            .with_context(|| format!("S3 endpoint has no host: {}", endpoint))?;
        let host = match base.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let canonical_uri = format!(
            "{}/{}/{}",
            base.path().trim_end_matches('/'),
            uri_encode(&config.bucket, false),
            uri_encode(&config.key, true)
        );
        let url = format!("{}://{}{}", base.scheme(), host, canonical_uri);

        let mut headers = sign(
            &SigningRequest {
                method: "PUT",
                host: &host,
                canonical_uri: &canonical_uri,
                payload: &body,
                region: &config.region,
                timestamp: Utc::now(),
            },
            &config.credentials,
        )?;
        headers.push(("content-type".to_string(), "application/json".to_string()));

        let response = self
            .http_client
            .put(&url, &headers, body)
            .with_context(|| format!("Failed to upload report to {}", config.location()))?;

        if !response.is_success() {
            bail!(
                "Upload to {} failed with status {}: {}",
                config.location(),
                response.status,
                response.body.trim()
            );
        }

        Ok(())
    }
}

impl<H: HttpClient> ReportSink for S3ReportSink<H> {
    fn upload(&self, report: &Report, config: &S3Config) -> Result<String> {
        config.validate()?;

        let body = report.to_json_pretty()?.into_bytes();
        self.put_object(config, body)?;

        Ok(config.location())
    }
}

/// Mock sink recording uploads (for command tests)
#[cfg(test)]
pub struct MockReportSink {
    uploads: std::sync::Mutex<Vec<(Report, String)>>,
    failure: Option<String>,
}

#[cfg(test)]
impl MockReportSink {
    pub fn new() -> Self {
        Self {
            uploads: std::sync::Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A sink whose every upload fails with the given message
    pub fn failing(message: &str) -> Self {
        Self {
            uploads: std::sync::Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    /// Reports uploaded so far, with their locations
    pub fn uploads(&self) -> Vec<(Report, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ReportSink for MockReportSink {
    fn upload(&self, report: &Report, config: &S3Config) -> Result<String> {
        if let Some(message) = &self.failure {
            bail!("{}", message);
        }
        let location = config.location();
        self.uploads
            .lock()
            .unwrap()
            .push((report.clone(), location.clone()));
        Ok(location)
    }
}
