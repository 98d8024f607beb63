use expensync_api_models::{NewReminder, Reminder, ServerMessage};

use super::item_path;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

// Reminders are polled by the dashboard, so none of these drive the loader.
impl ApiClient {
    /// Upcoming payment reminders.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn fetch_reminders(&self) -> ApiResult<Vec<Reminder>> {
        let request = ApiRequest::get("reminders").skip_loader();
        self.perform_json(request, "Failed to fetch reminders").await
    }

    /// Schedule a reminder.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn add_reminder(&self, reminder: &NewReminder) -> ApiResult<ServerMessage> {
        let request = ApiRequest::post("reminders/create")
            .json(reminder)?
            .skip_loader();
        let body = self.perform_json(request, "Failed to add reminder").await?;
        self.notify(NoticeLevel::Success, "Reminder added successfully!");
        Ok(body)
    }

    /// Delete a reminder by id.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn delete_reminder(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::delete(item_path("reminders", id)?).skip_loader();
        let body = self
            .perform_json(request, "Failed to delete reminder")
            .await?;
        self.notify(NoticeLevel::Success, "Reminder deleted!");
        Ok(body)
    }
}
