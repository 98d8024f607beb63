//! Client harness and JSON bodies shared by integration suites.

use std::sync::Arc;

use expensync_client::config::LOCAL_BASE_URL;
use expensync_client::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use expensync_client::{ApiClient, ClientConfig, ClientContext, MemoryStore, SessionStore};
use serde_json::{Value, json};
use url::Url;

use crate::mocks::{RecordingNavigator, RecordingNotifier, ScriptedTransport};

/// Access token seeded into harness sessions.
pub const STALE_TOKEN: &str = "stale-access";
/// Access token handed out by scripted refresh endpoints.
pub const FRESH_TOKEN: &str = "fresh-access";
/// Refresh token seeded into harness sessions.
pub const REFRESH_TOKEN: &str = "refresh-1";

/// Client wired to fakes, with handles for assertions.
pub struct Harness {
    /// Client under test.
    pub client: ApiClient,
    /// Scripted transport answering every request.
    pub transport: Arc<ScriptedTransport>,
    /// Captured notices.
    pub notifier: Arc<RecordingNotifier>,
    /// Captured redirects.
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Harness over `transport` with an empty session.
    #[must_use]
    pub fn new(transport: ScriptedTransport) -> Self {
        Self::build(transport, SessionStore::in_memory(), local_config())
    }

    /// Harness whose session holds [`STALE_TOKEN`] and [`REFRESH_TOKEN`].
    #[must_use]
    pub fn signed_in(transport: ScriptedTransport) -> Self {
        Self::build(
            transport,
            seeded_session(Some(STALE_TOKEN), Some(REFRESH_TOKEN)),
            local_config(),
        )
    }

    /// Harness with explicit session and configuration.
    #[must_use]
    pub fn build(transport: ScriptedTransport, session: SessionStore, config: ClientConfig) -> Self {
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let context = ClientContext::new(session)
            .with_notifier(notifier.clone())
            .with_navigator(navigator.clone());
        let client = ApiClient::with_transport(config, context, transport.clone());
        Self {
            client,
            transport,
            notifier,
            navigator,
        }
    }
}

/// Configuration pointing at the local development backend.
///
/// # Panics
///
/// Never in practice; the local URL is a constant.
#[must_use]
pub fn local_config() -> ClientConfig {
    let base = Url::parse(LOCAL_BASE_URL).unwrap_or_else(|err| panic!("local base URL: {err}"));
    ClientConfig::new(base)
}

/// In-memory session pre-populated with the given tokens.
#[must_use]
pub fn seeded_session(access: Option<&str>, refresh: Option<&str>) -> SessionStore {
    let pairs = [(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)];
    let store = MemoryStore::with_values(
        pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value))),
    );
    SessionStore::new(Arc::new(store))
}

/// Refresh endpoint body issuing [`FRESH_TOKEN`].
#[must_use]
pub fn refresh_body() -> Value {
    json!({"accessToken": FRESH_TOKEN})
}

/// Login body issuing a token pair and user.
#[must_use]
pub fn login_body() -> Value {
    json!({
        "accessToken": "login-access",
        "refreshToken": "login-refresh",
        "user": {"_id": "u1", "name": "Ada", "email": "ada@example.com"}
    })
}

/// One page holding a single transaction.
#[must_use]
pub fn transaction_page() -> Value {
    json!({
        "transactions": [{
            "_id": "t1",
            "title": "Groceries",
            "amount": -42.5,
            "category": "Food",
            "tags": ["weekly"],
            "date": "2025-03-01"
        }],
        "hasMore": false,
        "total": 1
    })
}
