//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use expensync_api_models::{
    AiAnalysis, BackendStatus, Budget, BudgetAlerts, BudgetSummary, CategoryGoal, Debt,
    HealthHistoryEntry, HealthScore, Notification, RecurringRule, Reminder, ServerMessage,
    TransactionPage, TrendInsights,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_status(status: &BackendStatus, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(status)?,
        OutputFormat::Table => println!("backend: {}", status.message),
    }
    Ok(())
}

pub(crate) fn render_message(message: &ServerMessage, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(message)?,
        OutputFormat::Table => {
            if let Some(text) = message.best_message() {
                println!("{text}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_user(user: &Value, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(user)?,
        OutputFormat::Table => {
            for key in ["_id", "name", "email"] {
                if let Some(value) = user.get(key).and_then(Value::as_str) {
                    println!("{}: {value}", key.trim_start_matches('_'));
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn render_transactions(page: &TransactionPage, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(page)?,
        OutputFormat::Table => {
            println!("{:<24} {:<10} {:>12} {:<16} TITLE", "ID", "DATE", "AMOUNT", "CATEGORY");
            for transaction in &page.transactions {
                println!(
                    "{:<24} {:<10} {:>12} {:<16} {}",
                    transaction.id,
                    short_date(transaction.date.as_deref()),
                    format_amount(transaction.amount),
                    transaction.category,
                    transaction.title
                );
            }
            if let Some(total) = page.total {
                println!("total: {total}");
            }
            if page.has_more {
                println!("more results available; pass --page to continue");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_budgets(budgets: &[Budget], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(budgets)?,
        OutputFormat::Table => {
            println!("{:<24} {:>12} CATEGORY", "ID", "AMOUNT");
            for budget in budgets {
                println!(
                    "{:<24} {:>12} {}",
                    budget.id.as_deref().unwrap_or("-"),
                    format_amount(budget.amount),
                    budget.category
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_summary(summary: &BudgetSummary, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(summary)?,
        OutputFormat::Table => {
            println!("income: {}", format_amount(summary.total_income));
            println!("expenses: {}", format_amount(summary.total_expenses));
            println!(
                "net: {}",
                format_amount(summary.total_income - summary.total_expenses)
            );
        }
    }
    Ok(())
}

pub(crate) fn render_debts(debts: &[Debt], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(debts)?,
        OutputFormat::Table => {
            println!("{:<24} {:>12} {:<10} NAME", "ID", "AMOUNT", "DUE");
            for debt in debts {
                println!(
                    "{:<24} {:>12} {:<10} {}",
                    debt.id,
                    format_amount(debt.amount),
                    short_date(debt.due_date.as_deref()),
                    debt.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_goals(goals: &[CategoryGoal], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(goals)?,
        OutputFormat::Table => {
            println!("{:<20} {:>12}", "CATEGORY", "GOAL");
            for goal in goals {
                println!("{:<20} {:>12}", goal.category, format_amount(goal.goal));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_alerts(alerts: &BudgetAlerts, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(alerts)?,
        OutputFormat::Table => {
            if alerts.alerts.is_empty() {
                println!("no budget alerts");
            }
            for alert in &alerts.alerts {
                println!(
                    "[{}] {} {:.0}% ({} of {}): {}",
                    alert.kind,
                    alert.category,
                    alert.percentage,
                    format_amount(alert.spent),
                    format_amount(alert.goal),
                    alert.message
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_reminders(reminders: &[Reminder], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(reminders)?,
        OutputFormat::Table => {
            println!("{:<24} {:<10} {:>12} TITLE", "ID", "DATE", "AMOUNT");
            for reminder in reminders {
                println!(
                    "{:<24} {:<10} {:>12} {}",
                    reminder.id,
                    short_date(reminder.date.as_deref()),
                    reminder.amount.map_or_else(|| "-".to_string(), format_amount),
                    reminder.title
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_rules(rules: &[RecurringRule], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(rules)?,
        OutputFormat::Table => {
            println!(
                "{:<24} {:<8} {:>12} {:<10} {:<6} TITLE",
                "ID", "FREQ", "AMOUNT", "NEXT", "ACTIVE"
            );
            for rule in rules {
                println!(
                    "{:<24} {:<8} {:>12} {:<10} {:<6} {}",
                    rule.id,
                    rule.frequency.as_str(),
                    format_amount(rule.amount),
                    short_date(rule.next_process_date.as_deref()),
                    if rule.is_active { "yes" } else { "no" },
                    rule.title
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_health(score: &HealthScore, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(score)?,
        OutputFormat::Table => {
            println!("score: {:.0}", score.score);
            for (factor, value) in &score.breakdown {
                println!("  {factor}: {}", compact(value));
            }
            for insight in &score.insights {
                println!("- {}", compact(insight));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_history(history: &[HealthHistoryEntry], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(history)?,
        OutputFormat::Table => {
            for entry in history {
                println!("{:<10} {:>5.0}", entry.month, entry.score);
            }
        }
    }
    Ok(())
}

pub(crate) fn render_notifications(
    notifications: &[Notification],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(notifications)?,
        OutputFormat::Table => {
            for notification in notifications {
                let marker = if notification.is_read { ' ' } else { '*' };
                println!(
                    "{marker} {:<24} [{}] {}: {}",
                    notification.id, notification.priority, notification.title, notification.message
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_analysis(analysis: &AiAnalysis, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(analysis)?,
        OutputFormat::Table => match &analysis.insights {
            Value::Array(items) => {
                for item in items {
                    println!("- {}", compact(item));
                }
            }
            other => println!("{}", compact(other)),
        },
    }
    Ok(())
}

pub(crate) fn render_trends(trends: &TrendInsights, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(trends)?,
        OutputFormat::Table => {
            if let Some(summary) = &trends.summary {
                println!("{summary}");
            }
            if let Some(change) = &trends.spending_change {
                let percent = trends
                    .percentage_change
                    .map(|value| format!(" ({value:+.1}%)"))
                    .unwrap_or_default();
                println!("spending {change}{percent}");
            }
            if let Some(income) = trends.current_month_income {
                println!("income this month: {}", format_amount(income));
            }
            if let Some(expense) = trends.current_month_expense {
                println!("expenses this month: {}", format_amount(expense));
            }
            for category in &trends.top_categories {
                println!("- {}", compact(category));
            }
        }
    }
    Ok(())
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

/// First ten characters of an ISO timestamp, or `-` when absent.
fn short_date(value: Option<&str>) -> &str {
    value.map_or("-", |date| date.get(..10).unwrap_or(date))
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_date_trims_timestamps() {
        assert_eq!(short_date(Some("2025-03-01T12:00:00.000Z")), "2025-03-01");
        assert_eq!(short_date(Some("2025")), "2025");
        assert_eq!(short_date(None), "-");
    }

    #[test]
    fn compact_unquotes_strings() {
        assert_eq!(compact(&json!("Save more")), "Save more");
        assert_eq!(compact(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn amounts_use_two_decimals() {
        assert_eq!(format_amount(-42.5), "-42.50");
        assert_eq!(format_amount(1200.0), "1200.00");
    }
}
