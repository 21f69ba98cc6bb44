//! HTTP transport and request descriptors
//!
//! All requests in the crate are expressed as immutable
//! [`RequestDescriptor`] values so the pipeline can replay one verbatim
//! after a token refresh. The transport is a thin wrapper over reqwest
//! whose single job beyond sending is classification: every response is
//! turned into either an [`ApiResponse`] or one variant of the closed
//! error taxonomy, at this boundary and nowhere else.

pub use reqwest::Method;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Immutable description of one API request
///
/// Built once, possibly sent twice (initial attempt and post-refresh
/// retry); never mutated after creation.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Path relative to the configured base URL, e.g. `/datasets/`
    pub path: String,
    /// Query pairs, rendered in order
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
}

impl RequestDescriptor {
    /// Describe a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Describe a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Describe a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Attach query pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A successful (2xx) API response
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// The HTTP status code
    pub status: u16,
    /// The decoded JSON body; `Null` for empty bodies
    pub body: Value,
}

impl ApiResponse {
    /// Deserialize the body into a typed wire structure.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Error body shape shared by the server's form-level rejections
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Thin HTTP transport over reqwest
///
/// Holds the shared connection pool and the base URL. Stateless with
/// respect to credentials: the bearer token, if any, is passed per call
/// by the pipeline or the auth operations.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: url::Url,
}

impl Transport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Send a descriptor, attaching `Authorization: Bearer <token>` when
    /// `bearer` is present, and classify the outcome.
    ///
    /// Classification rules, applied in order:
    /// - transport failure (no response) → [`Error::Network`]
    /// - 2xx → `Ok(ApiResponse)`
    /// - 401/422 → [`Error::Auth`]
    /// - other 4xx whose body carries a `message` field → [`Error::Validation`]
    /// - anything else → [`Error::Server`]
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = self
            .base_url
            .join(&descriptor.path)
            .map_err(|e| Error::Config {
                message: format!("invalid request path '{}': {e}", descriptor.path),
            })?;

        let mut request = self.http.request(descriptor.method.clone(), url);
        if !descriptor.query.is_empty() {
            request = request.query(&descriptor.query);
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    method = %descriptor.method,
                    path = %descriptor.path,
                    error = %e,
                    "request failed without a response"
                );
                return Err(Error::Network(e));
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            let raw = response.bytes().await?;
            let body = if raw.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&raw)?
            };
            return Ok(ApiResponse { status, body });
        }

        if status == 401 || status == 422 {
            tracing::debug!(
                method = %descriptor.method,
                path = %descriptor.path,
                status,
                "authentication failure"
            );
            return Err(Error::Auth { status });
        }

        let text = response.text().await.unwrap_or_default();
        if (400..500).contains(&status)
            && let Ok(parsed) = serde_json::from_str::<ErrorBody>(&text)
        {
            return Err(Error::Validation {
                status,
                message: parsed.message,
            });
        }

        tracing::warn!(
            method = %descriptor.method,
            path = %descriptor.path,
            status,
            "server error"
        );
        Err(Error::Server { status, body: text })
    }
}
