use chrono::Local;
use expensync_api_models::{Frequency, NewReminder, RecurringRuleInput};

use crate::cli::{
    GoalSetArgs, IdArgs, RecurringListArgs, RecurringRuleArgs, RecurringUpdateArgs,
    ReminderAddArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_alerts, render_goals, render_message, render_reminders, render_rules};

pub(crate) async fn handle_goal_list(ctx: &AppContext) -> CliResult<()> {
    let goals = ctx.client.fetch_category_goals().await?;
    render_goals(&goals.category_goals, ctx.output)
}

pub(crate) async fn handle_goal_set(ctx: &AppContext, args: GoalSetArgs) -> CliResult<()> {
    let saved = ctx.client.set_category_goals(&args.goals).await?;
    render_goals(&saved.category_goals, ctx.output)
}

/// Alerts degrade to an empty list when the backend cannot compute them.
pub(crate) async fn handle_goal_alerts(ctx: &AppContext) -> CliResult<()> {
    let alerts = ctx.client.fetch_budget_alerts().await;
    render_alerts(&alerts, ctx.output)
}

pub(crate) async fn handle_reminder_list(ctx: &AppContext) -> CliResult<()> {
    let reminders = ctx.client.fetch_reminders().await?;
    render_reminders(&reminders, ctx.output)
}

pub(crate) async fn handle_reminder_add(ctx: &AppContext, args: ReminderAddArgs) -> CliResult<()> {
    let reminder = NewReminder {
        title: args.title,
        amount: args.amount,
        date: args.date,
        note: args.note,
    };
    let message = ctx.client.add_reminder(&reminder).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_reminder_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.delete_reminder(&args.id).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_recurring_list(
    ctx: &AppContext,
    args: RecurringListArgs,
) -> CliResult<()> {
    let rules = ctx.client.list_recurring_rules(args.active).await?;
    render_rules(&rules, ctx.output)
}

pub(crate) async fn handle_recurring_add(
    ctx: &AppContext,
    args: RecurringRuleArgs,
) -> CliResult<()> {
    let rule = build_rule(args)?;
    let message = ctx.client.create_recurring_rule(&rule).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_recurring_update(
    ctx: &AppContext,
    args: RecurringUpdateArgs,
) -> CliResult<()> {
    let rule = build_rule(args.rule)?;
    let message = ctx.client.update_recurring_rule(&args.id, &rule).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_recurring_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.delete_recurring_rule(&args.id).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_recurring_toggle(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.toggle_recurring_rule(&args.id).await?;
    render_message(&message, ctx.output)
}

fn build_rule(args: RecurringRuleArgs) -> CliResult<RecurringRuleInput> {
    let frequency = Frequency::from(args.frequency);
    let start_date = args.start.unwrap_or_else(|| Local::now().date_naive());
    if frequency == Frequency::Weekly && args.day_of_week.is_none() {
        return Err(CliError::validation("weekly rules need --day-of-week (0-6)"));
    }
    if frequency == Frequency::Monthly && args.day_of_month.is_none() {
        return Err(CliError::validation("monthly rules need --day-of-month (1-31)"));
    }
    if let Some(end) = args.end
        && end < start_date
    {
        return Err(CliError::validation("end date must not precede the start date"));
    }
    Ok(RecurringRuleInput {
        title: args.title,
        amount: args.amount,
        category: args.category,
        note: args.note,
        frequency,
        day_of_week: args.day_of_week.filter(|_| frequency == Frequency::Weekly),
        day_of_month: args.day_of_month.filter(|_| frequency == Frequency::Monthly),
        start_date,
        end_date: args.end,
    })
}
