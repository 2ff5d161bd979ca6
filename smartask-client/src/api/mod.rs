//! SmartTask backend REST client
//!
//! One `BackendClient` wraps a shared `reqwest::Client`; each endpoint family
//! lives in its own submodule as an `impl BackendClient` block.
//!
//! No retries are attempted. Without a configured timeout a request waits
//! for the backend indefinitely.

mod roster;
mod rulesets;
mod schedules;
mod tasks;
mod templates;

use crate::error::{ClientError, Result};
use reqwest::multipart::Part;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use smartask_common::config::ClientConfig;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("smartask-client/", env!("CARGO_PKG_VERSION"));

/// Backend API client
#[derive(Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidState(format!("invalid base url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidState(format!(
                "base url '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Build an endpoint URL from path segments (each segment is escaped)
    ///
    /// A trailing `""` segment yields a trailing slash.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = send_checked(request, what).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(format!("{}: {}", what, e)))
    }

    /// Send a request whose body is plain text (or ignored)
    pub(crate) async fn send_text(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = send_checked(request, what).await?;
        response
            .text()
            .await
            .map_err(|e| ClientError::Parse(format!("{}: {}", what, e)))
    }
}

/// Multipart file part carrying CSV text
pub(crate) fn csv_part(csv: String, file_name: String) -> Result<Part> {
    file_part(csv, file_name, "text/csv")
}

fn file_part(text: String, file_name: String, mime: &str) -> Result<Part> {
    Part::text(text)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| ClientError::InvalidState(format!("content type {}: {}", mime, e)))
}

/// Send a request and map transport failures and non-2xx statuses
pub(crate) async fn send_checked(request: RequestBuilder, what: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ClientError::Network(format!("{}: {}", what, e)))?;

    let status = response.status();
    tracing::debug!(status = %status, "{}", what);

    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(what.to_string()));
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ClientError::Api(status.as_u16(), error_text));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BackendClient::new("http://localhost:8081", None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(BackendClient::new("not a url", None).is_err());
        assert!(BackendClient::new("mailto:ops@example.com", None).is_err());
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = BackendClient::new("http://localhost:8081/", None).unwrap();
        assert_eq!(
            client.endpoint(&["schedules", "March plan"]).as_str(),
            "http://localhost:8081/schedules/March%20plan"
        );
        assert_eq!(
            client.endpoint(&["vacation", ""]).as_str(),
            "http://localhost:8081/vacation/"
        );
    }

    #[test]
    fn test_bad_content_type_is_invalid_state() {
        assert!(csv_part("a,b".to_string(), "x.csv".to_string()).is_ok());

        let err = file_part("a,b".to_string(), "x.csv".to_string(), "csv").unwrap_err();
        assert!(matches!(err, ClientError::InvalidState(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BackendClient::new("http://gateway/api", None).unwrap();
        assert_eq!(
            client.endpoint(&["tasks"]).as_str(),
            "http://gateway/api/tasks"
        );
    }
}
