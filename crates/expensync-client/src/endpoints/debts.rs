use expensync_api_models::{Debt, NewDebt, ServerMessage};

use super::item_path;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

impl ApiClient {
    /// Every tracked debt.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn fetch_debts(&self) -> ApiResult<Vec<Debt>> {
        self.perform_json(ApiRequest::get("debts"), "Failed to fetch debts")
            .await
    }

    /// Track a new debt.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn add_debt(&self, debt: &NewDebt) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("debts/create").json(debt)?;
        let body = self.perform_json(request, "Failed to add debt").await?;
        self.notify(NoticeLevel::Success, "Debt added successfully!");
        Ok(body)
    }

    /// Delete a debt by id.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn delete_debt(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::delete(item_path("debts", id)?);
        let body = self.perform_json(request, "Failed to delete debt").await?;
        self.notify(NoticeLevel::Success, "Debt deleted!");
        Ok(body)
    }
}
