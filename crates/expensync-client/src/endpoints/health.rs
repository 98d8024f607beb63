use expensync_api_models::{DataEnvelope, HealthHistoryEntry, HealthScore};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::ApiRequest;

/// Months of history requested when the caller does not choose.
pub const DEFAULT_HEALTH_HISTORY_MONTHS: u32 = 6;

impl ApiClient {
    /// Current financial health score.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure.
    pub async fn health_score(&self) -> ApiResult<HealthScore> {
        let envelope: DataEnvelope<HealthScore> =
            self.send_json(ApiRequest::get("health/score")).await?;
        Ok(envelope.data)
    }

    /// Monthly scores for the last `months` months.
    ///
    /// # Errors
    ///
    /// Returns the pipeline failure.
    pub async fn health_history(&self, months: u32) -> ApiResult<Vec<HealthHistoryEntry>> {
        let request = ApiRequest::get("health/history").query("months", months);
        let envelope: DataEnvelope<Vec<HealthHistoryEntry>> = self.send_json(request).await?;
        Ok(envelope.data)
    }
}
