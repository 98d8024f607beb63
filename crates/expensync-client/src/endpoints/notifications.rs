use expensync_api_models::{DataEnvelope, Notification, ServerMessage, UnreadCount};

use super::item_path;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::notice::NoticeLevel;
use crate::request::ApiRequest;

impl ApiClient {
    /// Notifications for the bell, newest first. Polled in the background,
    /// so failures raise no notice.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure.
    pub async fn list_notifications(
        &self,
        unread_only: bool,
        kind: Option<&str>,
    ) -> ApiResult<Vec<Notification>> {
        let request = ApiRequest::get("notifications")
            .query_opt("unreadOnly", unread_only.then_some(true))
            .query_opt("type", kind.filter(|kind| !kind.is_empty()))
            .skip_loader()
            .silent();
        let envelope: DataEnvelope<Vec<Notification>> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure.
    pub async fn unread_notification_count(&self) -> ApiResult<u64> {
        let request = ApiRequest::get("notifications/unread-count")
            .skip_loader()
            .silent();
        let envelope: DataEnvelope<UnreadCount> = self.send_json(request).await?;
        Ok(envelope.data.unread_count)
    }

    /// Mark one notification as read.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn mark_notification_read(&self, id: &str) -> ApiResult<ServerMessage> {
        let request =
            ApiRequest::patch(format!("{}/read", item_path("notifications", id)?)).skip_loader();
        self.perform_json(request, "Failed to mark notification as read")
            .await
    }

    /// Mark every notification as read.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn mark_all_notifications_read(&self) -> ApiResult<ServerMessage> {
        let request = ApiRequest::patch("notifications/read-all").skip_loader();
        let body = self
            .perform_json(request, "Failed to mark all as read")
            .await?;
        self.notify(NoticeLevel::Success, "All notifications marked as read");
        Ok(body)
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure; a notice explains it to the user.
    pub async fn delete_notification(&self, id: &str) -> ApiResult<ServerMessage> {
        let request = ApiRequest::delete(item_path("notifications", id)?).skip_loader();
        self.perform_json(request, "Failed to delete notification")
            .await
    }
}
