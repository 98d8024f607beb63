use expensync_api_models::{
    BackendStatus, LoginRequest, LoginResponse, ResendVerificationRequest, ServerMessage,
    SignupRequest,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

const LOGIN_SUCCESS: &str = "Login Successful!";
const LOGIN_FAILURE: &str = "Login Failed";
const LOGIN_UNVERIFIED: &str = "Please verify your email address before logging in.";
const SIGNUP_SUCCESS: &str = "Signup Successful! Please login.";
const SIGNUP_VERIFY: &str = "Please check your email to verify your account.";
const VERIFY_FAILURE: &str = "Verification failed";
const RESEND_SUCCESS: &str = "Verification email sent!";
const RESEND_FAILURE: &str = "Failed to resend verification email";

impl ApiClient {
    /// Liveness check against the versioned API root. Never fails; an
    /// unreachable backend yields [`BackendStatus::unreachable`].
    pub async fn check_backend(&self) -> BackendStatus {
        let request = ApiRequest::liveness();
        match self.send_json::<BackendStatus>(request).await {
            Ok(status) => {
                info!("backend API is reachable");
                status
            }
            Err(err) => {
                warn!(error = %err, "backend check failed");
                BackendStatus::unreachable()
            }
        }
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<LoginResponse> {
        let request = ApiRequest::post("auth/login")
            .anonymous()
            .silent()
            .json(credentials)?;
        let outcome = match self.send_json::<LoginResponse>(request).await {
            Ok(login) => self
                .session()
                .store_login(&login.access_token, &login.refresh_token, login.user.as_ref())
                .map(|()| login)
                .map_err(ApiError::from),
            Err(err) => Err(err),
        };
        match &outcome {
            Ok(_) => {
                info!("login succeeded");
                self.notify(NoticeLevel::Success, LOGIN_SUCCESS);
            }
            Err(err) => self.notify(NoticeLevel::Error, login_failure_message(err)),
        }
        outcome
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn signup(&self, details: &SignupRequest) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("auth/signup")
            .anonymous()
            .silent()
            .json(details)?;
        let body = match self.send_json::<ServerMessage>(request).await {
            Ok(body) => body,
            Err(err) => {
                self.notify(NoticeLevel::Error, err.message());
                return Err(err);
            }
        };
        if body.succeeded() && body.requires_verification {
            self.notify(
                NoticeLevel::Info,
                body.msg.as_deref().unwrap_or(SIGNUP_VERIFY),
            );
        } else if body.succeeded() {
            self.notify(
                NoticeLevel::Success,
                body.msg.as_deref().unwrap_or(SIGNUP_SUCCESS),
            );
        } else {
            self.notify(NoticeLevel::Success, SIGNUP_SUCCESS);
        }
        Ok(body)
    }

    /// Confirm an email address with the emailed `token`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn verify_email(&self, token: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::get("auth/verify-email")
            .query("token", token)
            .anonymous()
            .skip_loader();
        self.perform_json(request, VERIFY_FAILURE).await
    }

    /// Ask the backend to send another verification email.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn resend_verification(&self, email: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("auth/resend-verification")
            .anonymous()
            .json(&ResendVerificationRequest {
                email: email.to_string(),
            })?;
        let body: ServerMessage = self.perform_json(request, RESEND_FAILURE).await?;
        if body.succeeded() {
            self.notify_success(&body, RESEND_SUCCESS);
        } else {
            self.notify(NoticeLevel::Error, body.best_message().unwrap_or(RESEND_FAILURE));
        }
        Ok(body)
    }

    /// User profile cached by the last login.
    #[must_use]
    pub fn current_user(&self) -> Option<Value> {
        self.session().user()
    }
}

fn login_failure_message(err: &ApiError) -> &str {
    match err.server_body() {
        Some(body) if body.requires_verification => LOGIN_UNVERIFIED,
        Some(body) => body
            .msg
            .as_deref()
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .unwrap_or(LOGIN_FAILURE),
        None => LOGIN_FAILURE,
    }
}
