//! Request/response pipeline shared by every remote call.
//!
//! The gateway reads the credential from the token store on each request and
//! attaches it as a bearer header. A `401` on any call clears the store and
//! notifies every registered [`UnauthorizedHandler`] before the error is
//! returned to the caller; all other failures pass through untouched.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{Credential, TokenStore};

use super::ApiError;

/// Path segment every API route lives under
pub const API_PREFIX: &str = "/api";

/// HTTP request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response interceptor invoked when the server rejects the credential.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self()
    }
}

pub struct Gateway {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    handlers: RwLock<Vec<Arc<dyn UnauthorizedHandler>>>,
}

impl Gateway {
    /// Create a gateway for the API hosted at `base_url` (scheme and host,
    /// the `/api` prefix is appended).
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS), store)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        let base_url = if trimmed.ends_with(API_PREFIX) {
            trimmed.to_string()
        } else {
            format!("{}{}", trimmed, API_PREFIX)
        };

        Ok(Self {
            client,
            base_url,
            store,
            handlers: RwLock::new(Vec::new()),
        })
    }

    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Full URL prefix requests are sent to, including `/api`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Register a handler to run whenever any call comes back `401`
    pub fn on_unauthorized(&self, handler: Arc<dyn UnauthorizedHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn credential(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read token store, sending request without credential");
                None
            }
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credential() {
            Some(credential) => builder.bearer_auth(credential.as_str()),
            None => builder,
        }
    }

    /// Clear the credential and run every registered handler
    fn reject_credential(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear token store after 401");
        }
        let handlers: Vec<_> = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for handler in handlers {
            handler.on_unauthorized();
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status, &body);
        if error.is_unauthorized() {
            warn!(path = path, "Credential rejected by server");
            self.reject_credential();
        } else {
            debug!(path = path, status = %status, "Request failed");
        }
        Err(error)
    }

    /// Send a request under the API prefix and decode the JSON response.
    /// `configure` adds the query, form or JSON body.
    pub async fn request<T, F>(&self, method: Method, path: &str, configure: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        debug!(method = %method, url = %url, "API request");

        let builder = self.authorize(self.client.request(method, &url));
        let response = configure(builder).send().await?;
        let response = self.check_response(path, response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, |rb| rb).await
    }
}
