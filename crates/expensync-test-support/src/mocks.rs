//! In-process fakes for the client's collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use expensync_client::{Navigator, Notice, NoticeLevel, Notifier, RawRequest, RawResponse, Transport, TransportError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

/// Canned outcome for a scripted request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// JSON body with the given status.
    Json(u16, Value),
    /// Raw bytes with a content type.
    Bytes {
        /// HTTP status.
        status: u16,
        /// `Content-Type` header value.
        content_type: &'static str,
        /// Body bytes.
        body: Vec<u8>,
    },
    /// No response at all.
    Fail(String),
}

impl Reply {
    /// `200` with a JSON body.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::Json(200, body)
    }

    /// `401` with a server message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Json(401, json!({"msg": "Token expired"}))
    }

    fn into_result(self) -> Result<RawResponse, TransportError> {
        let (status, content_type, body) = match self {
            Self::Json(status, body) => (
                status,
                "application/json",
                serde_json::to_vec(&body).map_err(|err| TransportError::new(err.to_string()))?,
            ),
            Self::Bytes {
                status,
                content_type,
                body,
            } => (status, content_type, body),
            Self::Fail(message) => return Err(TransportError::new(message)),
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Ok(RawResponse {
            status: StatusCode::from_u16(status)
                .map_err(|err| TransportError::new(err.to_string()))?,
            headers,
            body,
        })
    }
}

type Handler = Arc<dyn Fn(&RawRequest) -> Reply + Send + Sync>;

struct Route {
    method: Method,
    path: String,
    queued: VecDeque<Reply>,
    handler: Option<Handler>,
}

impl Route {
    fn matches(&self, request: &RawRequest) -> bool {
        self.method == request.method && request.url.path().ends_with(&self.path)
    }
}

/// Transport that answers from scripted routes and records every request.
///
/// Routes match on method and path suffix. Queued replies are consumed first;
/// once a route's queue is empty its handler (if any) answers. Unmatched
/// requests get a `404`.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<RawRequest>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep `latency` before answering, so concurrent callers overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a one-shot reply for `method path`.
    #[must_use]
    pub fn reply(self, method: Method, path: &str, reply: Reply) -> Self {
        {
            let mut routes = lock(&self.routes);
            let route = route_entry(&mut routes, &method, path);
            route.queued.push_back(reply);
        }
        self
    }

    /// Answer every request to `method path` with `handler` once queued replies run out.
    #[must_use]
    pub fn route(
        self,
        method: Method,
        path: &str,
        handler: impl Fn(&RawRequest) -> Reply + Send + Sync + 'static,
    ) -> Self {
        {
            let mut routes = lock(&self.routes);
            let route = route_entry(&mut routes, &method, path);
            route.handler = Some(Arc::new(handler));
        }
        self
    }

    /// Every request sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RawRequest> {
        lock(&self.log).clone()
    }

    /// Requests sent to `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RawRequest> {
        lock(&self.log)
            .iter()
            .filter(|request| &request.method == method && request.url.path().ends_with(path))
            .cloned()
            .collect()
    }

    /// Number of requests sent to `method path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }
}

fn route_entry<'a>(routes: &'a mut Vec<Route>, method: &Method, path: &str) -> &'a mut Route {
    let position = routes
        .iter()
        .position(|route| &route.method == method && route.path == path);
    let index = position.unwrap_or_else(|| {
        routes.push(Route {
            method: method.clone(),
            path: path.to_string(),
            queued: VecDeque::new(),
            handler: None,
        });
        routes.len() - 1
    });
    &mut routes[index]
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        lock(&self.log).push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let reply = {
            let mut routes = lock(&self.routes);
            routes
                .iter_mut()
                .find(|route| route.matches(&request))
                .and_then(|route| {
                    route
                        .queued
                        .pop_front()
                        .or_else(|| route.handler.as_ref().map(|handler| handler(&request)))
                })
        };
        reply
            .unwrap_or_else(|| Reply::Json(404, json!({"msg": "no scripted reply"})))
            .into_result()
    }
}

/// Bearer token attached to `request`, if any.
#[must_use]
pub fn bearer(request: &RawRequest) -> Option<&str> {
    request
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Notifier that keeps every notice for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Every notice received, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    /// Messages of notices at `level`.
    #[must_use]
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        lock(&self.notices)
            .iter()
            .filter(|notice| notice.level == level)
            .map(|notice| notice.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

/// Navigator that counts login redirects.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    /// Number of redirects requested.
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
