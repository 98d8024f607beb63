//! Request descriptors and decoded responses.

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use url::Url;

/// Endpoints that must never carry a bearer token.
const PUBLIC_AUTH_PATHS: [&str; 2] = ["/auth/login", "/auth/signup"];

/// URL family a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `{base}/...` under the versioned API.
    Versioned,
    /// `{root}/api/ai/...`, outside the versioned API.
    Ai,
    /// The bare versioned root used as a liveness check; the path is ignored.
    Liveness,
}

/// How the response body should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// JSON document.
    Json,
    /// Opaque bytes such as an exported file.
    Binary,
}

/// One logical API call, possibly sent twice by the refresh pipeline.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) scope: Scope,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) skip_loader: bool,
    pub(crate) silent: bool,
    pub(crate) anonymous: bool,
    pub(crate) response: ResponseKind,
}

impl ApiRequest {
    /// Request with `method` against a versioned `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            scope: Scope::Versioned,
            query: Vec::new(),
            body: None,
            skip_loader: false,
            silent: false,
            anonymous: false,
            response: ResponseKind::Json,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Anonymous, silent, loader-free `GET` of the versioned API root.
    pub(crate) fn liveness() -> Self {
        let mut request = Self::get("").anonymous().skip_loader().silent();
        request.scope = Scope::Liveness;
        request
    }

    /// Target the AI service instead of the versioned API.
    #[must_use]
    pub const fn ai(mut self) -> Self {
        self.scope = Scope::Ai;
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    #[must_use]
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Encode`] when `body` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        self.body = Some(serde_json::to_value(body).map_err(|source| ApiError::Encode { source })?);
        Ok(self)
    }

    /// Do not count this request on the loading indicator.
    #[must_use]
    pub const fn skip_loader(mut self) -> Self {
        self.skip_loader = true;
        self
    }

    /// Do not emit an error notice when this request fails.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Send without a bearer token and never attempt refresh recovery.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Expect a binary body.
    #[must_use]
    pub const fn binary(mut self) -> Self {
        self.response = ResponseKind::Binary;
        self
    }

    /// Relative path as supplied.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the bearer token must be omitted.
    #[must_use]
    pub fn omits_token(&self) -> bool {
        self.anonymous || is_public_auth_path(&self.path)
    }

    pub(crate) fn resolve_url(&self, config: &ClientConfig) -> ApiResult<Url> {
        let mut url = match self.scope {
            Scope::Versioned => config.api_url(&self.path)?,
            Scope::Ai => config.ai_url(&self.path)?,
            Scope::Liveness => config.liveness_url()?,
        };
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.query
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }
}

/// Whether `path` is a login or signup endpoint.
#[must_use]
pub fn is_public_auth_path(path: &str) -> bool {
    let normalized = format!("/{}", path.trim_start_matches('/'));
    PUBLIC_AUTH_PATHS
        .iter()
        .any(|public| normalized.contains(public))
}

/// Successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status (always 2xx).
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body bytes.
    pub body: Vec<u8>,
    pub(crate) url: String,
}

impl ApiResponse {
    /// Decode the body as JSON; an empty body decodes as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let bytes: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &self.body
        };
        serde_json::from_slice(bytes).map_err(|source| ApiError::Decode {
            url: self.url.clone(),
            source,
        })
    }

    /// `Content-Type` header, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// File name advertised by `Content-Disposition`, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        let disposition = self.headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
        disposition.split(';').map(str::trim).find_map(|part| {
            part.strip_prefix("filename=")
                .map(|name| name.trim_matches('"').to_string())
                .filter(|name| !name.is_empty())
        })
    }
}
