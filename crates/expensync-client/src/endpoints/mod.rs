//! Domain helpers layered on [`crate::ApiClient::send`].
//!
//! Each submodule adds an `impl ApiClient` block for one backend resource. The
//! helpers only choose path, method, and flags; auth, loader, and refresh
//! behaviour come from the shared pipeline.

mod auth;
mod budgets;
mod debts;
mod goals;
mod health;
mod insights;
mod notifications;
mod recurring;
mod reminders;
mod transactions;

pub use health::DEFAULT_HEALTH_HISTORY_MONTHS;
pub use insights::CHAT_HISTORY_LIMIT;
pub use transactions::ExportedFile;

use crate::error::{ApiError, ApiResult};

/// `{collection}/{id}` after rejecting ids that would escape the resource.
fn item_path(collection: &str, id: &str) -> ApiResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::invalid_input(format!(
            "{collection} id must not be empty"
        )));
    }
    if id.contains(['/', '?', '#']) {
        return Err(ApiError::invalid_input(format!(
            "{collection} id '{id}' contains reserved characters"
        )));
    }
    Ok(format!("{collection}/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_path_joins_trimmed_ids() {
        assert_eq!(item_path("debts", " d1 ").expect("path"), "debts/d1");
    }

    #[test]
    fn item_path_rejects_empty_or_reserved_ids() {
        assert!(matches!(
            item_path("debts", "  "),
            Err(ApiError::InvalidInput { .. })
        ));
        assert!(matches!(
            item_path("reminders", "a/../b"),
            Err(ApiError::InvalidInput { .. })
        ));
    }
}
