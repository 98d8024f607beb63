use expensync_api_models::{Budget, BudgetSummary, NewBudget, ServerMessage};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

impl ApiClient {
    /// Every budget owned by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn fetch_budgets(&self) -> ApiResult<Vec<Budget>> {
        self.perform_json(ApiRequest::get("budgets"), "Failed to fetch budgets")
            .await
    }

    /// Create a budget.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn add_budget(&self, budget: &NewBudget) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("budgets").json(budget)?;
        let body = self.perform_json(request, "Failed to add budget").await?;
        self.notify(NoticeLevel::Success, "Budget added successfully!");
        Ok(body)
    }

    /// Income and expense totals.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn fetch_budget_summary(&self) -> ApiResult<BudgetSummary> {
        self.perform_json(ApiRequest::get("summary"), "Failed to fetch budget summary")
            .await
    }
}
