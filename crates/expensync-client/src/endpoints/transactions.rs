use expensync_api_models::{ExportQuery, NewTransaction, ServerMessage, TransactionPage, TransactionQuery};

use super::item_path;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

/// File produced by a transaction export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the backend.
    pub content_type: Option<String>,
    /// File name suggested by `Content-Disposition`.
    pub file_name: Option<String>,
}

impl ApiClient {
    /// One page of transactions matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn list_transactions(&self, query: &TransactionQuery) -> ApiResult<TransactionPage> {
        let request = ApiRequest::get("transactions")
            .query("page", query.page)
            .query("limit", query.limit)
            .query("search", &query.search)
            .query("filter", &query.filter);
        self.perform_json(request, "Failed to fetch transactions")
            .await
    }

    /// Record a transaction.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("transactions/create").json(transaction)?;
        let body = self
            .perform_json(request, "Failed to add transaction")
            .await?;
        self.notify(NoticeLevel::Success, "Transaction added successfully!");
        Ok(body)
    }

    /// Delete a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn delete_transaction(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::delete(item_path("transactions", id)?);
        let body = self
            .perform_json(request, "Failed to delete transaction")
            .await?;
        self.notify(NoticeLevel::Success, "Transaction deleted!");
        Ok(body)
    }

    /// Download transactions as a PDF or CSV file.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn export_transactions(&self, query: &ExportQuery) -> ApiResult<ExportedFile> {
        let request = ApiRequest::get("transactions/export")
            .query("format", query.format.as_str())
            .query("search", &query.search)
            .query("filter", &query.filter)
            .query_opt("month", query.month)
            .query_opt("year", query.year)
            .binary()
            .skip_loader();
        let response = self.perform(request, "Failed to export data").await?;
        Ok(ExportedFile {
            content_type: response.content_type().map(str::to_string),
            file_name: response.file_name(),
            bytes: response.body,
        })
    }
}
