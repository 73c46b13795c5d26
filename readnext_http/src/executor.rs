use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::error::ApiError;
use crate::events::AuthEventBus;
use crate::storage::TokenStorage;
use crate::token::TokenStore;

pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Executes authenticated, cached API calls against the backend.
///
/// Per call: bearer header from the [`TokenStore`] when present, cache
/// short-circuit for GETs, one refresh-and-retry cycle on a 401, and every
/// failure normalized into an [`ApiError`] before it leaves this type.
/// Cheap to clone; clones share tokens, cache and the refresh guard.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    refresh_path: String,
    tokens: TokenStore,
    cache: ResponseCache,
    auth_events: AuthEventBus,
    // Serializes refresh attempts so concurrent 401s cause one network
    // refresh instead of a refresh per caller.
    refresh_guard: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache: None,
            tokens: None,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Drops every cached read result.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    /// Registers a callback fired when a refresh-and-retry cycle is
    /// exhausted and the session is gone for good.
    pub fn on_auth_failure(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.auth_events.subscribe(listener);
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Single entry point for all exchanges. GETs consult and populate the
    /// response cache; every other verb always goes to the network.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.base_url.join(path)?;
        let cache_key = url.to_string();
        let cacheable = method == Method::GET;

        if cacheable {
            if let Some(hit) = self.cache.get(&cache_key) {
                debug!("cache hit for {cache_key}");
                return Ok(hit);
            }
        }

        let request_id = Uuid::new_v4();
        let access = self.tokens.access_token();
        let mut response = self
            .dispatch(method.clone(), url.clone(), body.as_ref(), access.as_deref(), request_id)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && self.tokens.refresh_token().is_some()
            && !self.is_refresh_path(path)
        {
            debug!("401 for {url}, attempting token refresh (request {request_id})");
            if let Err(err) = self.refresh_access_token(access.as_deref()).await {
                warn!("token refresh failed: {err}");
                self.tokens.clear();
                self.auth_events.emit();
                return Err(ApiError::http(
                    401,
                    "authentication failed: session could not be renewed",
                    err.body,
                ));
            }
            let access = self.tokens.access_token();
            response = self
                .dispatch(method, url, body.as_ref(), access.as_deref(), request_id)
                .await?;
        }

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = extract_error_message(&raw)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            debug!("request {request_id} failed with status {status}: {message}");
            return Err(ApiError::http(status.as_u16(), message, Some(raw)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| ApiError::transport(format!("failed to decode response body: {err}")))?;

        if cacheable {
            self.cache.set(cache_key, payload.clone());
        }

        Ok(payload)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        access: Option<&str>,
        request_id: Uuid,
    ) -> Result<reqwest::Response, ApiError> {
        let headers = self.build_headers(access, request_id)?;
        debug!("{method} {url} (request {request_id})");

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    fn build_headers(&self, access: Option<&str>, request_id: Uuid) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(id) = HeaderValue::from_str(&request_id.to_string()) {
            headers.insert("x-request-id", id);
        }
        if let Some(token) = access {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
                ApiError::transport(format!("access token is not a valid header value: {err}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn is_refresh_path(&self, path: &str) -> bool {
        path.trim_start_matches('/') == self.refresh_path.trim_start_matches('/')
    }

    /// One-shot token refresh. `stale_access` is the access token the caller
    /// saw rejected; a caller that reaches the guard after another caller
    /// already rotated the token skips the network call entirely.
    async fn refresh_access_token(&self, stale_access: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_guard.lock().await;

        let current = self.tokens.access_token();
        if current.is_some() && current.as_deref() != stale_access {
            debug!("access token already rotated by a concurrent caller");
            return Ok(());
        }

        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| ApiError::http(401, "no refresh token available", None))?;

        match self.dispatch_refresh(&refresh_token).await {
            Ok(new_access) => {
                // The existing refresh token stays in place.
                self.tokens.store(&new_access, None);
                debug!("access token refreshed");
                Ok(())
            }
            Err(err) => {
                self.tokens.clear();
                Err(err)
            }
        }
    }

    // Talks to the refresh endpoint directly, never through `request()`: a
    // 401 from the refresh endpoint itself must not start a nested refresh.
    async fn dispatch_refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct RefreshResponse {
            access_token: String,
        }

        let url = self.base_url.join(&self.refresh_path)?;
        let response = self
            .http
            .post(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = extract_error_message(&raw)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::http(status.as_u16(), message, Some(raw)));
        }

        let payload: RefreshResponse = response.json().await.map_err(|err| {
            ApiError::transport(format!("refresh response malformed: {err}"))
        })?;
        Ok(payload.access_token)
    }
}

/// Pulls a human-readable message out of a structured error body.
fn extract_error_message(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    for field in ["detail", "message", "error"] {
        if let Some(message) = value.get(field).and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }
    None
}

pub struct ApiClientBuilder {
    base_url: String,
    refresh_path: String,
    timeout: Duration,
    cache: Option<ResponseCache>,
    tokens: Option<TokenStore>,
}

impl ApiClientBuilder {
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn token_storage(mut self, storage: Box<dyn TokenStorage>) -> Self {
        self.tokens = Some(TokenStore::new(storage));
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = Url::parse(&self.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("readnext/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;

        Ok(ApiClient {
            http,
            base_url,
            refresh_path: self.refresh_path,
            tokens: self.tokens.unwrap_or_else(TokenStore::in_memory),
            cache: self.cache.unwrap_or_default(),
            auth_events: AuthEventBus::new(),
            refresh_guard: Arc::new(Mutex::new(())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_extraction_prefers_structured_fields() {
        assert_eq!(
            extract_error_message(r#"{"detail": "user not found"}"#).as_deref(),
            Some("user not found")
        );
        assert_eq!(
            extract_error_message(r#"{"message": "bad input"}"#).as_deref(),
            Some("bad input")
        );
        assert_eq!(
            extract_error_message(r#"{"error": "nope"}"#).as_deref(),
            Some("nope")
        );
        assert!(extract_error_message("plain text").is_none());
        assert!(extract_error_message(r#"{"unrelated": 1}"#).is_none());
    }

    #[test]
    fn refresh_path_comparison_ignores_leading_slash() {
        let client = ApiClient::builder("http://localhost:8000")
            .build()
            .expect("client should build");
        assert!(client.is_refresh_path("/api/auth/refresh"));
        assert!(client.is_refresh_path("api/auth/refresh"));
        assert!(!client.is_refresh_path("/api/auth/login"));
    }
}
