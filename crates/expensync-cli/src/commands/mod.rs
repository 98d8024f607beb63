//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod insights;
pub(crate) mod ledger;
pub(crate) mod planning;
