#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Expensync REST API.
//!
//! The backend speaks camelCase JSON and identifies documents by `_id`. These
//! types are lenient on input (optional fields default) so that older server
//! builds that omit a field still decode, and strict on output so requests stay
//! deterministic.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message envelope the backend attaches to most responses, success or failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Explicit success flag when the endpoint reports one.
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Primary human-readable message.
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Alternate message field used by some handlers.
    pub message: Option<String>,
    #[serde(default)]
    /// Set on login/signup responses when the account still needs email verification.
    pub requires_verification: bool,
}

impl ServerMessage {
    /// First non-empty message among `msg` and `message`.
    #[must_use]
    pub fn best_message(&self) -> Option<&str> {
        [self.msg.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Whether the backend explicitly reported success.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(false)
    }
}

/// Generic `{ "data": ... }` wrapper used by the recurring, health, and notification routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Explicit success flag when present.
    pub success: Option<bool>,
    /// Wrapped payload.
    pub data: T,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Credentials submitted to `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Token pair and optional profile returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Short-lived bearer credential.
    pub access_token: String,
    /// Long-lived credential used to mint new access tokens.
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Cached user profile, stored verbatim.
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional server message.
    pub msg: Option<String>,
}

/// Registration payload for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: String,
    /// Chosen password.
    pub password: String,
}

/// Body for `POST /auth/refresh-token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Persisted refresh token.
    pub refresh_token: String,
}

/// Response from `POST /auth/refresh-token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Newly issued access token.
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Rotated refresh token, when the backend issues one.
    pub refresh_token: Option<String>,
}

/// Body for `POST /auth/resend-verification`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResendVerificationRequest {
    /// Address that should receive a fresh verification link.
    pub email: String,
}

/// Liveness payload from the versioned API root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendStatus {
    #[serde(default)]
    /// Status message reported by the backend.
    pub message: String,
}

impl BackendStatus {
    /// Degraded result used when the liveness check fails.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            message: "Backend check failed".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Stored transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    /// Backend document identifier.
    pub id: String,
    #[serde(default)]
    /// Short description.
    pub title: String,
    /// Signed amount; negative values are expenses.
    pub amount: f64,
    #[serde(default)]
    /// Spending category.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
    #[serde(default)]
    /// User-selected tags.
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Booking date as reported by the backend.
    pub date: Option<String>,
}

/// Payload for `POST /transactions/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Short description.
    pub title: String,
    /// Signed amount.
    pub amount: f64,
    /// Spending category.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
    #[serde(default)]
    /// User-selected tags.
    pub tags: Vec<String>,
    /// Booking date.
    pub date: NaiveDate,
}

/// One page of `GET /transactions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    #[serde(default)]
    /// Transactions on this page.
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    /// Whether another page is available.
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Total matching transactions, when reported.
    pub total: Option<u64>,
}

/// Query parameters for `GET /transactions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Free-text search term.
    pub search: String,
    /// Category or type filter.
    pub filter: String,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: String::new(),
            filter: String::new(),
        }
    }
}

/// File formats accepted by `GET /transactions/export`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Portable document.
    #[default]
    Pdf,
    /// Comma-separated values.
    Csv,
}

impl ExportFormat {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
        }
    }
}

/// Query parameters for `GET /transactions/export`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportQuery {
    /// Output format.
    pub format: ExportFormat,
    /// Free-text search term.
    pub search: String,
    /// Category or type filter.
    pub filter: String,
    /// Calendar month (1-12) restriction.
    pub month: Option<u32>,
    /// Calendar year restriction.
    pub year: Option<i32>,
}

// ---------------------------------------------------------------------------
// Budgets, debts, summary
// ---------------------------------------------------------------------------

/// Stored budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    /// Backend document identifier.
    pub id: Option<String>,
    #[serde(default)]
    /// Budgeted category.
    pub category: String,
    #[serde(default)]
    /// Budgeted amount.
    pub amount: f64,
    #[serde(flatten)]
    /// Fields this client does not model.
    pub extra: Map<String, Value>,
}

/// Payload for `POST /budgets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBudget {
    /// Budgeted category.
    pub category: String,
    /// Budgeted amount.
    pub amount: f64,
}

/// Stored debt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    #[serde(rename = "_id")]
    /// Backend document identifier.
    pub id: String,
    #[serde(default)]
    /// Creditor or debt label.
    pub name: String,
    #[serde(default)]
    /// Outstanding amount.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Due date as reported by the backend.
    pub due_date: Option<String>,
    #[serde(flatten)]
    /// Fields this client does not model.
    pub extra: Map<String, Value>,
}

/// Payload for `POST /debts/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    /// Creditor or debt label.
    pub name: String,
    /// Outstanding amount.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
}

/// Aggregate figures from `GET /summary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    #[serde(default)]
    /// Income across the summary window.
    pub total_income: f64,
    #[serde(default)]
    /// Expenses across the summary window.
    pub total_expenses: f64,
    #[serde(flatten)]
    /// Fields this client does not model.
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Category goals and alerts
// ---------------------------------------------------------------------------

/// Spending goal for a single category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryGoal {
    /// Category name.
    pub category: String,
    /// Monthly spending goal.
    pub goal: f64,
}

/// Goals payload exchanged with `/category-goals` and `/category-goals/set`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGoals {
    #[serde(default)]
    /// Goals keyed by category.
    pub category_goals: Vec<CategoryGoal>,
}

/// Budget alert raised when spending approaches or exceeds a goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAlert {
    #[serde(default)]
    /// Category the alert concerns.
    pub category: String,
    #[serde(default)]
    /// Goal amount.
    pub goal: f64,
    #[serde(default)]
    /// Amount spent so far.
    pub spent: f64,
    #[serde(default)]
    /// Share of the goal consumed, in percent.
    pub percentage: f64,
    #[serde(default)]
    /// Human-readable alert text.
    pub message: String,
    #[serde(rename = "type", default)]
    /// Alert severity label (`warning`, `exceeded`, ...).
    pub kind: String,
}

/// Response from `GET /category-goals/alerts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlerts {
    #[serde(default)]
    /// Active alerts.
    pub alerts: Vec<BudgetAlert>,
    #[serde(default)]
    /// Whether any alert is active.
    pub has_alerts: bool,
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// Stored payment reminder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    #[serde(rename = "_id")]
    /// Backend document identifier.
    pub id: String,
    #[serde(default)]
    /// Reminder title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Amount due, when tracked.
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Due date as reported by the backend.
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
}

/// Payload for `POST /reminders/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReminder {
    /// Reminder title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Amount due.
    pub amount: Option<f64>,
    /// Due date.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Recurring rules
// ---------------------------------------------------------------------------

/// Recurrence cadence of a rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Once a week on `day_of_week`.
    Weekly,
    /// Once a month on `day_of_month`.
    Monthly,
    /// Once a year on the start date's anniversary.
    Yearly,
}

impl Frequency {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// Stored recurring transaction rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    #[serde(rename = "_id")]
    /// Backend document identifier.
    pub id: String,
    #[serde(default)]
    /// Rule title.
    pub title: String,
    #[serde(default)]
    /// Amount booked on each occurrence.
    pub amount: f64,
    #[serde(default)]
    /// Category for generated transactions.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
    /// Recurrence cadence.
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Weekday (0 = Sunday) for weekly rules.
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Day of month for monthly rules.
    pub day_of_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// First occurrence date.
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Last occurrence date, if bounded.
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Next date the backend will materialise the rule.
    pub next_process_date: Option<String>,
    #[serde(default)]
    /// Whether the rule is currently active.
    pub is_active: bool,
}

/// Payload for creating or updating a recurring rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRuleInput {
    /// Rule title.
    pub title: String,
    /// Amount booked on each occurrence.
    pub amount: f64,
    /// Category for generated transactions.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form note.
    pub note: Option<String>,
    /// Recurrence cadence.
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Weekday (0 = Sunday); required for weekly rules.
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Day of month; required for monthly rules.
    pub day_of_month: Option<u8>,
    /// First occurrence date.
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Last occurrence date.
    pub end_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Financial health
// ---------------------------------------------------------------------------

/// Current financial health score.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthScore {
    #[serde(default)]
    /// Composite score (0-100).
    pub score: f64,
    #[serde(default)]
    /// Per-factor contributions.
    pub breakdown: Map<String, Value>,
    #[serde(default)]
    /// Narrative insights attached to the score.
    pub insights: Vec<Value>,
}

/// Historical score for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthHistoryEntry {
    /// Month label as reported by the backend.
    pub month: String,
    /// Score recorded for the month.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// In-app notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    /// Backend document identifier.
    pub id: String,
    #[serde(default)]
    /// Notification title.
    pub title: String,
    #[serde(default)]
    /// Notification body.
    pub message: String,
    #[serde(rename = "type", default)]
    /// Notification type (`budget_alert`, `reminder`, ...).
    pub kind: String,
    #[serde(default)]
    /// Priority label (`low`, `normal`, `critical`).
    pub priority: String,
    #[serde(default)]
    /// Whether the user has read it.
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Deep link into the dashboard.
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Creation timestamp as reported by the backend.
    pub created_at: Option<String>,
}

/// Response from `GET /notifications/unread-count`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    #[serde(default)]
    /// Unread notifications.
    pub unread_count: u64,
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

/// Free-form analysis from `/api/ai/analyze/:userId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AiAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Explicit success flag.
    pub success: Option<bool>,
    #[serde(default)]
    /// Insight payload produced by the model.
    pub insights: Value,
}

/// Month-over-month insights from `/api/ai/trend-insights/:userId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendInsights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Explicit success flag.
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Narrative summary.
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Direction of the spending change (`increase`, `decrease`).
    pub spending_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Month-over-month change in percent.
    pub percentage_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Income for the current month.
    pub current_month_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Expenses for the current month.
    pub current_month_expense: Option<f64>,
    #[serde(default)]
    /// Top spending categories.
    pub top_categories: Vec<Value>,
}

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message typed by the user.
    User,
    /// Message produced by the assistant.
    Assistant,
}

/// Single turn of chat history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    /// Turn author.
    pub role: ChatRole,
    /// Turn text.
    pub content: String,
}

/// Body for `POST /api/ai/chat/:userId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// New user message.
    pub message: String,
    /// Prior turns, oldest first.
    pub chat_history: Vec<ChatTurn>,
}

/// Assistant reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Assistant text, absent when the model declined.
    pub response: Option<String>,
}
