use expensync_api_models::{DataEnvelope, RecurringRule, RecurringRuleInput, ServerMessage};

use super::item_path;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

impl ApiClient {
    /// Recurring transaction rules, optionally filtered by activity.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn list_recurring_rules(&self, is_active: Option<bool>) -> ApiResult<Vec<RecurringRule>> {
        let request = ApiRequest::get("recurring").query_opt("isActive", is_active);
        let envelope: DataEnvelope<Vec<RecurringRule>> = self
            .perform_json(request, "Failed to fetch recurring transactions")
            .await?;
        Ok(envelope.data)
    }

    /// Create a recurring rule.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn create_recurring_rule(&self, rule: &RecurringRuleInput) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("recurring/create").json(rule)?;
        let body = self
            .perform_json(request, "Failed to create recurring transaction")
            .await?;
        self.notify(NoticeLevel::Success, "Recurring transaction created!");
        Ok(body)
    }

    /// Replace a recurring rule.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn update_recurring_rule(
        &self,
        id: &str,
        rule: &RecurringRuleInput,
    ) -> ApiResult<ServerMessage> {
        let request = ApiRequest::put(item_path("recurring", id)?).json(rule)?;
        let body = self
            .perform_json(request, "Failed to update recurring transaction")
            .await?;
        self.notify(NoticeLevel::Success, "Recurring transaction updated!");
        Ok(body)
    }

    /// Delete a recurring rule.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn delete_recurring_rule(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::delete(item_path("recurring", id)?);
        let body = self
            .perform_json(request, "Failed to delete recurring transaction")
            .await?;
        self.notify(NoticeLevel::Success, "Recurring transaction deleted!");
        Ok(body)
    }

    /// Flip a rule between active and paused.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn toggle_recurring_rule(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::patch(format!("{}/toggle", item_path("recurring", id)?));
        self.perform_json(request, "Failed to update status").await
    }
}
