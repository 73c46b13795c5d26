//! Core communication layer for the readnext recommendation backend.
//!
//! Turns logical operations into authenticated, cached, concurrency-bounded
//! network exchanges: token lifecycle ([`TokenStore`]), response caching
//! ([`ResponseCache`]), a refresh-and-retry request executor ([`ApiClient`])
//! and a bounded FIFO scheduler ([`RequestQueue`]). Every failure leaves this
//! crate as a single [`ApiError`] shape.

pub mod cache;
pub mod error;
pub mod events;
pub mod executor;
pub mod queue;
pub mod storage;
pub mod token;

pub use cache::ResponseCache;
pub use error::{ApiError, ErrorKind};
pub use events::AuthEventBus;
pub use executor::{ApiClient, ApiClientBuilder};
pub use queue::RequestQueue;
pub use storage::{FileStorage, MemoryStorage, StorageError, TokenStorage};
pub use token::TokenStore;

pub use reqwest::Method;
