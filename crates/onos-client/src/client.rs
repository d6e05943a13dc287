//! ONOS REST client
//!
//! [`HttpOnosApiClient`] talks to a running controller, [`MockOnosApiClient`]
//! records requests and replays canned answers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::{OnosApiError, Result};

/// HTTP basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A single REST call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query_params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// `METHOD path`, used for logging and mock lookups
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Upstream answer; the body is kept exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success answer into an error
    fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(OnosApiError::RemoteOperationFailed {
                status: self.status,
                body: self.body,
            })
        }
    }
}

#[async_trait]
pub trait OnosApiClient: Send + Sync {
    /// Send one request. Exactly one attempt is made.
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse>;

    async fn health_check(&self) -> Result<bool>;
}

pub struct HttpOnosApiClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl HttpOnosApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(OnosApiError::InvalidUrl(base_url));
        }

        Ok(Self {
            client,
            base_url,
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str, query_params: &[(String, String)]) -> Result<String> {
        if !path.starts_with('/') {
            return Err(OnosApiError::InvalidUrl(path.to_string()));
        }

        let mut url = format!("{}{}", self.base_url, path);
        if !query_params.is_empty() {
            let query: Vec<String> = query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }

        Ok(url)
    }
}

#[async_trait]
impl OnosApiClient for HttpOnosApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.build_url(&request.path, &request.query_params)?;
        log::debug!("Calling ONOS API: {} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(ref credentials) = self.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        log::debug!(
            "ONOS API response: status={}, body_size={}",
            status,
            body.len()
        );

        ApiResponse { status, body }.into_result()
    }

    async fn health_check(&self) -> Result<bool> {
        match self.call(&ApiRequest::get("/onos/v1/cluster")).await {
            Ok(_) => Ok(true),
            Err(OnosApiError::RemoteOperationFailed { .. }) | Err(OnosApiError::Http(_)) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Recording client for tests and dry runs
#[derive(Default)]
pub struct MockOnosApiClient {
    responses: HashMap<String, ApiResponse>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockOnosApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the answer for `METHOD path`
    pub fn add_response(&mut self, method: Method, path: &str, response: ApiResponse) {
        self.responses
            .insert(format!("{} {}", method, path), response);
    }

    /// Requests received so far, in order
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OnosApiClient for MockOnosApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        let key = request.key();
        match self.responses.get(&key) {
            Some(response) => response.clone().into_result(),
            None => Err(OnosApiError::RemoteOperationFailed {
                status: 404,
                body: format!("no mock response for {}", key),
            }),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
