use expensync_api_models::{BudgetAlerts, CategoryGoal, CategoryGoals};
use tracing::warn;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

impl ApiClient {
    /// Per-category spending goals.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn fetch_category_goals(&self) -> ApiResult<CategoryGoals> {
        let request = ApiRequest::get("category-goals").skip_loader();
        self.perform_json(request, "Failed to fetch category goals")
            .await
    }

    /// Replace the per-category spending goals.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn set_category_goals(&self, goals: &[CategoryGoal]) -> ApiResult<CategoryGoals> {
        let request = ApiRequest::post("category-goals/set")
            .json(&CategoryGoals {
                category_goals: goals.to_vec(),
            })?
            .skip_loader();
        let body = self
            .perform_json(request, "Failed to set category goals")
            .await?;
        self.notify(NoticeLevel::Success, "Category goals updated!");
        Ok(body)
    }

    /// Active budget alerts. Background poll: failures are logged and yield
    /// an empty alert set.
    pub async fn fetch_budget_alerts(&self) -> BudgetAlerts {
        let request = ApiRequest::get("category-goals/alerts")
            .skip_loader()
            .silent();
        match self.send_json(request).await {
            Ok(alerts) => alerts,
            Err(err) => {
                warn!(error = %err, "failed to fetch budget alerts");
                BudgetAlerts::default()
            }
        }
    }
}
