use expensync_api_models::{AiAnalysis, ChatReply, ChatRequest, ChatTurn, TrendInsights};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;

/// Prior turns forwarded with each chat message.
pub const CHAT_HISTORY_LIMIT: usize = 10;

// AI calls are rendered inline by their widgets, so they raise no notices.
impl ApiClient {
    /// Model-generated analysis of the user's spending.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a user id, otherwise the
    /// pipeline failure.
    pub async fn ai_insights(&self, user_id: &str) -> ApiResult<AiAnalysis> {
        let request = ApiRequest::get(user_scoped("analyze", user_id)?).ai().silent();
        self.send_json(request).await
    }

    /// Month-over-month spending trends.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a user id, otherwise the
    /// pipeline failure.
    pub async fn trend_insights(&self, user_id: &str) -> ApiResult<TrendInsights> {
        let request = ApiRequest::get(user_scoped("trend-insights", user_id)?)
            .ai()
            .silent();
        self.send_json(request).await
    }

    /// Ask the finance assistant a question, forwarding the most recent turns.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a user id or message,
    /// otherwise the pipeline failure.
    pub async fn chat(
        &self,
        user_id: &str,
        message: &str,
        history: &[ChatTurn],
    ) -> ApiResult<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::invalid_input("Message is required"));
        }
        let recent = &history[history.len().saturating_sub(CHAT_HISTORY_LIMIT)..];
        let request = ApiRequest::post(user_scoped("chat", user_id)?)
            .ai()
            .silent()
            .json(&ChatRequest {
                message: message.to_string(),
                chat_history: recent.to_vec(),
            })?;
        self.send_json(request).await
    }
}

fn user_scoped(action: &str, user_id: &str) -> ApiResult<String> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::invalid_input("User ID is required"));
    }
    if user_id.contains(['/', '?', '#']) {
        return Err(ApiError::invalid_input(format!(
            "user id '{user_id}' contains reserved characters"
        )));
    }
    Ok(format!("{action}/{user_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_scoped_paths_require_an_id() {
        assert_eq!(user_scoped("analyze", "u1").expect("path"), "analyze/u1");
        let err = user_scoped("chat", " ").expect_err("missing id");
        assert_eq!(err.message(), "User ID is required");
    }
}
