#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Authenticated HTTP client for the Expensync personal-finance backend.
//!
//! Layout:
//! - `config.rs`: base URL resolution and tuning knobs
//! - `session.rs`: persisted tokens and cached user
//! - `loader.rs`: reference-counted loading indicator
//! - `notice.rs`: user notices and the login redirect
//! - `transport.rs`: raw HTTP seam and the `reqwest` implementation
//! - `request.rs`: request descriptors and decoded responses
//! - `client.rs`: the authenticated pipeline with refresh-once recovery
//! - `endpoints/`: per-resource helpers built on the pipeline

pub mod client;
pub mod config;
mod endpoints;
pub mod error;
pub mod loader;
pub mod notice;
pub mod request;
pub mod session;
pub mod transport;

pub use client::{ApiClient, ClientContext};
pub use config::ClientConfig;
pub use endpoints::{CHAT_HISTORY_LIMIT, DEFAULT_HEALTH_HISTORY_MONTHS, ExportedFile};
pub use error::{ApiError, ApiResult};
pub use loader::{LoadingGuard, LoadingSignal};
pub use notice::{Navigator, Notice, NoticeLevel, Notifier};
pub use request::{ApiRequest, ApiResponse};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionStore};
pub use transport::{RawRequest, RawResponse, ReqwestTransport, Transport, TransportError};
