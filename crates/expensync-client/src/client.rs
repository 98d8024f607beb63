//! Authenticated request pipeline.
//!
//! # Design
//! - Every call runs the same fixed chain: loader start, bearer header,
//!   transport send, loader stop, 401 recovery.
//! - Recovery is a two-phase state machine. A 401 in the `Initial` phase
//!   refreshes the access token and re-enters the chain once in the `Retried`
//!   phase; a 401 there ends the session instead of refreshing again.
//! - Concurrent 401s share one refresh when coalescing is enabled: waiters
//!   queue on a gate and reuse the token minted by whoever went first.

use std::fmt;
use std::sync::Arc;

use expensync_api_models::{RefreshRequest, RefreshResponse, ServerMessage};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, GENERIC_FAILURE_MESSAGE};
use crate::loader::LoadingSignal;
use crate::notice::{Navigator, NoopNavigator, Notice, NoticeLevel, Notifier, TracingNotifier};
use crate::request::{ApiRequest, ApiResponse, ResponseKind};
use crate::session::SessionStore;
use crate::transport::{RawRequest, RawResponse, ReqwestTransport, Transport, TransportError};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "auth/refresh-token";
/// Notice shown when the session cannot be recovered.
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please login again.";
/// Notice shown after an explicit logout.
pub const LOGGED_OUT_NOTICE: &str = "Logged out successfully.";
/// Network message for requests that hit the configured timeout.
const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// Collaborators injected into the client at construction.
#[derive(Clone)]
pub struct ClientContext {
    session: SessionStore,
    loader: LoadingSignal,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ClientContext {
    /// Context around `session` with an idle loader, tracing notices, and no navigation.
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            loader: LoadingSignal::new(),
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(NoopNavigator),
        }
    }

    /// Share an existing loading signal.
    #[must_use]
    pub fn with_loader(mut self, loader: LoadingSignal) -> Self {
        self.loader = loader;
        self
    }

    /// Route notices to `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Route login redirects to `navigator`.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Persisted session.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Loading indicator.
    #[must_use]
    pub const fn loader(&self) -> &LoadingSignal {
        &self.loader
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new(SessionStore::in_memory())
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientContext")
            .field("session", &self.session)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Retried,
}

/// Authenticated client for the Expensync backend.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    context: ClientContext,
    transport: Arc<dyn Transport>,
    refresh_gate: Arc<Mutex<()>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.config.base_url().as_str())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client using the `reqwest` transport with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, context: ClientContext) -> ApiResult<Self> {
        let transport = ReqwestTransport::new(config.timeout()).map_err(|err| ApiError::Network {
            message: err.message,
        })?;
        Ok(Self::with_transport(config, context, Arc::new(transport)))
    }

    /// Client resolved from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when configuration is malformed or the HTTP client cannot be built.
    pub fn from_env(context: ClientContext) -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?, context)
    }

    /// Client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        context: ClientContext,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            context,
            transport,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Persisted session.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        self.context.session()
    }

    /// Loading indicator shared by every request this client sends.
    #[must_use]
    pub const fn loader(&self) -> &LoadingSignal {
        self.context.loader()
    }

    /// Send `request` through the authenticated pipeline.
    ///
    /// Failures are surfaced as an error notice unless the request is silent or
    /// the session ended (which produces its own notice).
    ///
    /// # Errors
    ///
    /// Returns the classified failure after any refresh recovery.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let result = self.dispatch(&request).await;
        if let Err(err) = &result {
            debug!(
                method = %request.method,
                path = %request.path(),
                error = %err,
                "request failed"
            );
            if !request.silent && !err.ends_session() {
                self.notify(NoticeLevel::Error, err.message());
            }
        }
        result
    }

    /// Send `request` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure or [`ApiError::Decode`].
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        self.send(request).await?.json()
    }

    /// Clear the session, confirm, and send the user to login.
    ///
    /// Safe to call when no session exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Store`] when the session cannot be cleared.
    pub async fn logout(&self) -> ApiResult<()> {
        // Let an in-flight refresh land first so it cannot resurrect the session.
        let _gate = self.refresh_gate.lock().await;
        self.context.session.clear()?;
        info!("session cleared by logout");
        self.notify(NoticeLevel::Info, LOGGED_OUT_NOTICE);
        self.context.navigator.redirect_to_login();
        Ok(())
    }

    /// Send `request`, replacing the generic failure notice with the server's
    /// message or `failure` when it has none.
    pub(crate) async fn perform(
        &self,
        request: ApiRequest,
        failure: &str,
    ) -> ApiResult<ApiResponse> {
        let announce = !request.silent;
        let result = self.send(request.silent()).await;
        if let Err(err) = &result
            && announce
            && !err.ends_session()
        {
            let message = err
                .server_body()
                .and_then(ServerMessage::best_message)
                .unwrap_or(failure);
            self.notify(NoticeLevel::Error, message);
        }
        result
    }

    /// [`Self::perform`] followed by JSON decoding.
    pub(crate) async fn perform_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        failure: &str,
    ) -> ApiResult<T> {
        self.perform(request, failure).await?.json()
    }

    pub(crate) fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.context.notifier.notify(Notice::new(level, message));
    }

    /// Success notice using the server's message when it sent one.
    pub(crate) fn notify_success(&self, body: &ServerMessage, fallback: &str) {
        let message = body.best_message().unwrap_or(fallback);
        self.notify(NoticeLevel::Success, message);
    }

    async fn dispatch(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let token = self.bearer_for(request);
        match self.attempt(request, token.as_deref(), Phase::Initial).await {
            Err(err) if err.is_recoverable_unauthorized() && !request.omits_token() => {
                debug!(path = %request.path(), "access token rejected; refreshing");
                self.recover(token.as_deref()).await?;
                let token = self.bearer_for(request);
                match self.attempt(request, token.as_deref(), Phase::Retried).await {
                    Err(err @ ApiError::Unauthorized { .. }) => {
                        Err(self.expire_session(err, token.as_deref()).await)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    fn bearer_for(&self, request: &ApiRequest) -> Option<String> {
        if request.omits_token() {
            None
        } else {
            self.context.session.access_token()
        }
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        phase: Phase,
    ) -> ApiResult<ApiResponse> {
        let url = request.resolve_url(&self.config)?;
        let result = {
            let _loading = (!request.skip_loader).then(|| self.context.loader.begin());
            let headers = request_headers(request.response, token)?;
            debug!(
                method = %request.method,
                url = %url,
                skip_loader = request.skip_loader,
                ?phase,
                "sending request"
            );
            self.transport
                .send(RawRequest {
                    method: request.method.clone(),
                    url: url.clone(),
                    headers,
                    body: request.body.clone(),
                })
                .await
        };
        let outcome = classify(&url, result, phase);
        match &outcome {
            Ok(response) => debug!(url = %url, status = response.status.as_u16(), "request succeeded"),
            Err(err) => debug!(url = %url, status = ?err.status(), error = %err, "error response"),
        }
        outcome
    }

    /// Obtains a usable access token after `stale` was rejected. A failed
    /// refresh ends the session before the gate is released.
    async fn recover(&self, stale: Option<&str>) -> ApiResult<String> {
        if !self.config.coalesce_refresh() {
            let refreshed = self.refresh().await;
            let _gate = self.refresh_gate.lock().await;
            return refreshed.map_err(|err| self.end_session(err, stale));
        }
        let _gate = self.refresh_gate.lock().await;
        if let Some(current) = self.context.session.access_token()
            && Some(current.as_str()) != stale
        {
            debug!("reusing access token refreshed by a concurrent request");
            return Ok(current);
        }
        self.refresh()
            .await
            .map_err(|err| self.end_session(err, stale))
    }

    async fn refresh(&self) -> ApiResult<String> {
        let Some(refresh_token) = self.context.session.refresh_token() else {
            return Err(ApiError::SessionExpired {
                reason: "no refresh token stored".to_string(),
            });
        };
        let request = ApiRequest::post(REFRESH_PATH)
            .anonymous()
            .skip_loader()
            .silent()
            .json(&RefreshRequest { refresh_token })?;
        let response = self
            .attempt(&request, None, Phase::Initial)
            .await
            .map_err(|err| ApiError::SessionExpired {
                reason: format!("refresh failed: {}", err.message()),
            })?;
        let issued: RefreshResponse =
            response
                .json()
                .map_err(|err| ApiError::SessionExpired {
                    reason: format!("refresh returned an unreadable body: {err}"),
                })?;
        if issued.access_token.trim().is_empty() {
            return Err(ApiError::SessionExpired {
                reason: "refresh returned an empty access token".to_string(),
            });
        }
        let rotated = issued
            .refresh_token
            .as_deref()
            .filter(|value| !value.trim().is_empty());
        self.context
            .session
            .store_refreshed(&issued.access_token, rotated)?;
        info!(rotated = rotated.is_some(), "access token refreshed");
        Ok(issued.access_token)
    }

    async fn expire_session(&self, err: ApiError, sent: Option<&str>) -> ApiError {
        let _gate = self.refresh_gate.lock().await;
        self.end_session(err, sent)
    }

    /// Ends the session once per rejected token. Callers whose token was
    /// already cleared by a concurrent failure stay quiet. Runs under the
    /// refresh gate.
    fn end_session(&self, err: ApiError, sent: Option<&str>) -> ApiError {
        if self.context.session.access_token().as_deref() == sent {
            warn!(error = %err, "session could not be recovered; logging out");
            if let Err(store_err) = self.context.session.clear() {
                warn!(error = %store_err, "failed to clear session");
            }
            self.notify(NoticeLevel::Info, SESSION_EXPIRED_NOTICE);
            self.context.navigator.redirect_to_login();
        } else {
            debug!(error = %err, "session already ended by a concurrent request");
        }
        match err {
            ApiError::Unauthorized { message, body, .. } => ApiError::Unauthorized {
                retry_exhausted: true,
                message,
                body,
            },
            err @ ApiError::SessionExpired { .. } => err,
            other => ApiError::SessionExpired {
                reason: other.to_string(),
            },
        }
    }
}

fn request_headers(kind: ResponseKind, token: Option<&str>) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let accept = match kind {
        ResponseKind::Json => "application/json",
        ResponseKind::Binary => "*/*",
    };
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ApiError::invalid_input("stored access token is not a valid header value")
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn classify(
    url: &Url,
    result: Result<RawResponse, TransportError>,
    phase: Phase,
) -> ApiResult<ApiResponse> {
    let response = result.map_err(|err| {
        let message = if err.timed_out {
            TIMEOUT_MESSAGE.to_string()
        } else if err.message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            err.message
        };
        ApiError::Network { message }
    })?;

    let status = response.status;
    if status.is_success() {
        return Ok(ApiResponse {
            status,
            headers: response.headers,
            body: response.body,
            url: url.to_string(),
        });
    }

    let body = serde_json::from_slice::<ServerMessage>(&response.body).ok();
    let message = body
        .as_ref()
        .and_then(ServerMessage::best_message)
        .map_or_else(
            || format!("Request failed with status code {}", status.as_u16()),
            str::to_string,
        );

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized {
            retry_exhausted: phase == Phase::Retried,
            message,
            body,
        },
        status if status.is_client_error() => ApiError::Validation {
            status: status.as_u16(),
            message,
            body,
        },
        status => ApiError::Server {
            status: status.as_u16(),
            message,
            body,
        },
    })
}
