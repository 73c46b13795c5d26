//! Typed endpoint client for the readnext recommendation service, built on
//! the generic communication layer in `readnext_http`. Wrappers here are
//! deliberately thin: they pick the path and verb, serialize the body and
//! hand the exchange to [`ApiClient`].

use log::{debug, info, warn};
use serde_json::Value;

pub use readnext_http::{
    ApiClient, ApiError, AuthEventBus, ErrorKind, FileStorage, Method, RequestQueue,
    ResponseCache, TokenStore,
};

pub mod structs {
    pub mod config;

    pub mod endpoints;
}

pub mod types;

pub use structs::config::ClientConfig;

use structs::endpoints;
use types::{
    BatchRecommendationsRequest, LoginRequest, RegisterRequest, SessionCreate, SessionUpdate,
};

/// High-level client for the readnext backend.
#[derive(Clone)]
pub struct ReadNext {
    api: ApiClient,
}

impl ReadNext {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        info!("initializing readnext client for {}", config.base_url);

        let mut builder = ApiClient::builder(&config.base_url)
            .refresh_path(endpoints::REFRESH)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .cache(ResponseCache::new(chrono::Duration::seconds(
                config.cache_ttl_secs,
            )));
        if let Some(path) = &config.token_file {
            builder = builder.token_storage(Box::new(FileStorage::new(path)));
        }

        Ok(Self {
            api: builder.build()?,
        })
    }

    /// The underlying executor, for callers that need an endpoint not
    /// wrapped here.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn on_auth_failure(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.api.on_auth_failure(listener);
    }

    // auth

    /// Logs in and stores the returned token pair for subsequent calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        debug!("start login for {username}");
        let body = to_body(&LoginRequest { username, password })?;
        let response = self.api.post(endpoints::LOGIN, Some(body)).await?;
        self.store_token_pair(&response);
        Ok(response)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Value, ApiError> {
        debug!("start register for {username}");
        let body = to_body(&RegisterRequest {
            username,
            email,
            password,
        })?;
        let response = self.api.post(endpoints::REGISTER, Some(body)).await?;
        self.store_token_pair(&response);
        Ok(response)
    }

    /// Best-effort server-side logout; local tokens and cached reads are
    /// cleared regardless of what the backend answers.
    pub async fn logout(&self) {
        if let Err(err) = self.api.post(endpoints::LOGOUT, None).await {
            warn!("logout request failed: {err}");
        }
        self.api.tokens().clear();
        self.api.invalidate_cache();
    }

    fn store_token_pair(&self, response: &Value) {
        if let Some(access) = response.get("access_token").and_then(Value::as_str) {
            let refresh = response.get("refresh_token").and_then(Value::as_str);
            self.api.tokens().store(access, refresh);
        }
    }

    // service

    pub async fn health(&self) -> Result<Value, ApiError> {
        self.api.get(endpoints::HEALTH).await
    }

    pub async fn metrics(&self) -> Result<Value, ApiError> {
        self.api.get(endpoints::METRICS).await
    }

    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.api.get(endpoints::STATS).await
    }

    // recommendations

    pub async fn recommendations(
        &self,
        user_id: &str,
        count: Option<u32>,
    ) -> Result<Value, ApiError> {
        debug!("start recommendations for {user_id}");
        self.api
            .get(&endpoints::recommendations(user_id, count))
            .await
    }

    pub async fn recommendations_batch(
        &self,
        user_ids: &[String],
        count: Option<u32>,
    ) -> Result<Value, ApiError> {
        debug!("start batch recommendations for {} users", user_ids.len());
        let body = to_body(&BatchRecommendationsRequest { user_ids, count })?;
        self.api
            .post(endpoints::RECOMMENDATIONS_BATCH, Some(body))
            .await
    }

    /// Per-user recommendation fetches admitted through `queue`, so a large
    /// user list cannot stampede the backend. Results come back in input
    /// order; each user fails or succeeds on its own.
    pub async fn recommendations_bulk(
        &self,
        user_ids: &[String],
        count: Option<u32>,
        queue: &RequestQueue,
    ) -> Vec<Result<Value, ApiError>> {
        let mut handles = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let api = self.api.clone();
            let path = endpoints::recommendations(user_id, count);
            handles.push(queue.submit(async move { api.get(&path).await }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap_or_else(|_| {
                Err(ApiError::transport(
                    "queued operation was dropped before running",
                ))
            }));
        }
        results
    }

    pub async fn explanation(&self, user_id: &str, book_id: &str) -> Result<Value, ApiError> {
        self.api
            .get(&endpoints::explanation(user_id, book_id))
            .await
    }

    // search

    pub async fn search_books(&self, query: &str, limit: Option<u32>) -> Result<Value, ApiError> {
        debug!("start book search: {query}");
        self.api.get(&endpoints::books_search(query, limit)).await
    }

    pub async fn semantic_search(&self, query: &str) -> Result<Value, ApiError> {
        debug!("start semantic search: {query}");
        self.api.get(&endpoints::semantic_search(query)).await
    }

    // sessions

    pub async fn create_session(&self, session: &SessionCreate) -> Result<Value, ApiError> {
        let body = to_body(session)?;
        self.api.post(endpoints::SESSIONS, Some(body)).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Value, ApiError> {
        self.api.get(&endpoints::session(session_id)).await
    }

    /// Mutating session calls invalidate locally cached reads, which may be
    /// stale afterwards.
    pub async fn update_session(
        &self,
        session_id: &str,
        update: &SessionUpdate,
    ) -> Result<Value, ApiError> {
        let body = to_body(update)?;
        let response = self
            .api
            .put(&endpoints::session(session_id), Some(body))
            .await?;
        self.api.invalidate_cache();
        Ok(response)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<Value, ApiError> {
        let response = self.api.delete(&endpoints::session(session_id)).await?;
        self.api.invalidate_cache();
        Ok(response)
    }

    // development helpers

    pub async fn reset_server_cache(&self) -> Result<Value, ApiError> {
        let response = self.api.post(endpoints::DEV_CACHE_RESET, None).await?;
        self.api.invalidate_cache();
        Ok(response)
    }

    pub async fn warm_server_cache(&self) -> Result<Value, ApiError> {
        self.api.post(endpoints::DEV_CACHE_WARM, None).await
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|err| ApiError::transport(format!("failed to serialize request body: {err}")))
}

pub fn init_logger(level: &str) {
    std::env::set_var("RUST_LOG", level);
    env_logger::init();
}
