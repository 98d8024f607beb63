//! Argument parsing and command dispatch.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use expensync_api_models::{CategoryGoal, ExportFormat, Frequency};
use expensync_client::config::DEFAULT_TIMEOUT_SECS;
use expensync_telemetry::{LogFormat, LoggingConfig, client_version, init_logging};
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, build_client, parse_date, parse_goal};
use crate::commands::auth::{
    handle_login, handle_logout, handle_resend_verification, handle_signup, handle_status,
    handle_verify_email, handle_whoami,
};
use crate::commands::insights::{
    handle_ai_analyze, handle_ai_chat, handle_ai_trends, handle_health_history,
    handle_health_score, handle_notification_count, handle_notification_delete,
    handle_notification_list, handle_notification_read, handle_notification_read_all,
};
use crate::commands::ledger::{
    handle_budget_add, handle_budget_list, handle_budget_summary, handle_debt_add,
    handle_debt_delete, handle_debt_list, handle_transaction_add, handle_transaction_delete,
    handle_transaction_export, handle_transaction_list,
};
use crate::commands::planning::{
    handle_goal_alerts, handle_goal_list, handle_goal_set, handle_recurring_add,
    handle_recurring_delete, handle_recurring_list, handle_recurring_toggle,
    handle_recurring_update, handle_reminder_add, handle_reminder_delete, handle_reminder_list,
};

const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli
            .log_format
            .as_deref()
            .map_or_else(LogFormat::infer, LogFormat::parse),
        version: env!("CARGO_PKG_VERSION"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "command",
        command = command_name,
        trace_id = %trace_id,
        version = client_version()
    );

    let result = dispatch(cli).instrument(span).await;

    match result {
        Ok(()) => {
            tracing::debug!(command = command_name, "command succeeded");
            0
        }
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            tracing::debug!(command = command_name, exit_code, error = %message, "command failed");
            eprintln!("error: {message}");
            exit_code
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext {
        client: build_client(&cli.connection)?,
        output: cli.output,
    };

    match cli.command {
        Command::Status => handle_status(&ctx).await,
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Logout => handle_logout(&ctx).await,
        Command::Signup(args) => handle_signup(&ctx, args).await,
        Command::VerifyEmail(args) => handle_verify_email(&ctx, args).await,
        Command::ResendVerification(args) => handle_resend_verification(&ctx, args).await,
        Command::Whoami => handle_whoami(&ctx),
        Command::Transactions(command) => match command {
            TransactionCommand::List(args) => handle_transaction_list(&ctx, args).await,
            TransactionCommand::Add(args) => handle_transaction_add(&ctx, args).await,
            TransactionCommand::Delete(args) => handle_transaction_delete(&ctx, args).await,
            TransactionCommand::Export(args) => handle_transaction_export(&ctx, args).await,
        },
        Command::Budgets(command) => match command {
            BudgetCommand::List => handle_budget_list(&ctx).await,
            BudgetCommand::Add(args) => handle_budget_add(&ctx, args).await,
            BudgetCommand::Summary => handle_budget_summary(&ctx).await,
        },
        Command::Debts(command) => match command {
            DebtCommand::List => handle_debt_list(&ctx).await,
            DebtCommand::Add(args) => handle_debt_add(&ctx, args).await,
            DebtCommand::Delete(args) => handle_debt_delete(&ctx, args).await,
        },
        Command::Goals(command) => match command {
            GoalCommand::List => handle_goal_list(&ctx).await,
            GoalCommand::Set(args) => handle_goal_set(&ctx, args).await,
            GoalCommand::Alerts => handle_goal_alerts(&ctx).await,
        },
        Command::Reminders(command) => match command {
            ReminderCommand::List => handle_reminder_list(&ctx).await,
            ReminderCommand::Add(args) => handle_reminder_add(&ctx, args).await,
            ReminderCommand::Delete(args) => handle_reminder_delete(&ctx, args).await,
        },
        Command::Recurring(command) => match command {
            RecurringCommand::List(args) => handle_recurring_list(&ctx, args).await,
            RecurringCommand::Add(args) => handle_recurring_add(&ctx, args).await,
            RecurringCommand::Update(args) => handle_recurring_update(&ctx, args).await,
            RecurringCommand::Delete(args) => handle_recurring_delete(&ctx, args).await,
            RecurringCommand::Toggle(args) => handle_recurring_toggle(&ctx, args).await,
        },
        Command::Health(command) => match command {
            HealthCommand::Score => handle_health_score(&ctx).await,
            HealthCommand::History(args) => handle_health_history(&ctx, args).await,
        },
        Command::Notifications(command) => match command {
            NotificationCommand::List(args) => handle_notification_list(&ctx, args).await,
            NotificationCommand::Count => handle_notification_count(&ctx).await,
            NotificationCommand::Read(args) => handle_notification_read(&ctx, args).await,
            NotificationCommand::ReadAll => handle_notification_read_all(&ctx).await,
            NotificationCommand::Delete(args) => handle_notification_delete(&ctx, args).await,
        },
        Command::Ai(command) => match command {
            AiCommand::Analyze(args) => handle_ai_analyze(&ctx, args).await,
            AiCommand::Trends(args) => handle_ai_trends(&ctx, args).await,
            AiCommand::Chat(args) => handle_ai_chat(&ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "expensync", about = "Command-line client for the Expensync finance API")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    #[arg(
        long = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "EXPENSYNC_LOG_LEVEL",
        default_value = DEFAULT_CLI_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, env = "EXPENSYNC_LOG_FORMAT")]
    pub(crate) log_format: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Flags that decide where requests go and where the session lives.
#[derive(Args, Debug, Clone)]
pub(crate) struct ConnectionArgs {
    #[arg(long, global = true, env = "EXPENSYNC_API_URL")]
    pub(crate) api_url: Option<String>,
    #[arg(long, global = true, env = "EXPENSYNC_HOST")]
    pub(crate) host: Option<String>,
    #[arg(
        long,
        global = true,
        env = "EXPENSYNC_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "EXPENSYNC_COALESCE_REFRESH",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub(crate) coalesce_refresh: bool,
    #[arg(long, global = true, env = "EXPENSYNC_SESSION_FILE")]
    pub(crate) session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check the backend liveness endpoint.
    Status,
    /// Sign in and store the session.
    Login(LoginArgs),
    /// Clear the stored session.
    Logout,
    /// Create an account.
    Signup(SignupArgs),
    /// Confirm an email address with the emailed token.
    VerifyEmail(VerifyEmailArgs),
    /// Ask for a new verification email.
    ResendVerification(ResendVerificationArgs),
    /// Show the signed-in user.
    Whoami,
    #[command(subcommand)]
    Transactions(TransactionCommand),
    #[command(subcommand)]
    Budgets(BudgetCommand),
    #[command(subcommand)]
    Debts(DebtCommand),
    #[command(subcommand)]
    Goals(GoalCommand),
    #[command(subcommand)]
    Reminders(ReminderCommand),
    #[command(subcommand)]
    Recurring(RecurringCommand),
    #[command(subcommand)]
    Health(HealthCommand),
    #[command(subcommand)]
    Notifications(NotificationCommand),
    #[command(subcommand)]
    Ai(AiCommand),
}

#[derive(Subcommand)]
pub(crate) enum TransactionCommand {
    List(TransactionListArgs),
    Add(TransactionAddArgs),
    Delete(IdArgs),
    Export(TransactionExportArgs),
}

#[derive(Subcommand)]
pub(crate) enum BudgetCommand {
    List,
    Add(BudgetAddArgs),
    Summary,
}

#[derive(Subcommand)]
pub(crate) enum DebtCommand {
    List,
    Add(DebtAddArgs),
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum GoalCommand {
    List,
    Set(GoalSetArgs),
    Alerts,
}

#[derive(Subcommand)]
pub(crate) enum ReminderCommand {
    List,
    Add(ReminderAddArgs),
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum RecurringCommand {
    List(RecurringListArgs),
    Add(RecurringRuleArgs),
    Update(RecurringUpdateArgs),
    Delete(IdArgs),
    Toggle(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum HealthCommand {
    Score,
    History(HealthHistoryArgs),
}

#[derive(Subcommand)]
pub(crate) enum NotificationCommand {
    List(NotificationListArgs),
    Count,
    Read(IdArgs),
    ReadAll,
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum AiCommand {
    Analyze(UserArgs),
    Trends(UserArgs),
    Chat(ChatArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "EXPENSYNC_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct SignupArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "EXPENSYNC_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct VerifyEmailArgs {
    pub(crate) token: String,
}

#[derive(Args)]
pub(crate) struct ResendVerificationArgs {
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args)]
pub(crate) struct IdArgs {
    pub(crate) id: String,
}

#[derive(Args)]
pub(crate) struct TransactionListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long, default_value_t = 10)]
    pub(crate) limit: u32,
    #[arg(long, default_value = "")]
    pub(crate) search: String,
    #[arg(long, default_value = "")]
    pub(crate) filter: String,
}

#[derive(Args)]
pub(crate) struct TransactionAddArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) amount: f64,
    #[arg(long)]
    pub(crate) category: String,
    #[arg(long)]
    pub(crate) note: Option<String>,
    #[arg(long = "tag")]
    pub(crate) tags: Vec<String>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args)]
pub(crate) struct TransactionExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormatArg::Pdf)]
    pub(crate) format: ExportFormatArg,
    #[arg(long, default_value = "")]
    pub(crate) search: String,
    #[arg(long, default_value = "")]
    pub(crate) filter: String,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub(crate) month: Option<u32>,
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Destination path; defaults to the server-provided file name.
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct BudgetAddArgs {
    #[arg(long)]
    pub(crate) category: String,
    #[arg(long)]
    pub(crate) amount: f64,
}

#[derive(Args)]
pub(crate) struct DebtAddArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) amount: f64,
    #[arg(long, value_parser = parse_date)]
    pub(crate) due: Option<NaiveDate>,
    #[arg(long)]
    pub(crate) note: Option<String>,
}

#[derive(Args)]
pub(crate) struct GoalSetArgs {
    /// Goals written as `category=amount`.
    #[arg(required = true, value_parser = parse_goal)]
    pub(crate) goals: Vec<CategoryGoal>,
}

#[derive(Args)]
pub(crate) struct ReminderAddArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) amount: Option<f64>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: NaiveDate,
    #[arg(long)]
    pub(crate) note: Option<String>,
}

#[derive(Args)]
pub(crate) struct RecurringListArgs {
    /// Restrict to active (`true`) or paused (`false`) rules.
    #[arg(long)]
    pub(crate) active: Option<bool>,
}

#[derive(Args)]
pub(crate) struct RecurringRuleArgs {
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) amount: f64,
    #[arg(long)]
    pub(crate) category: String,
    #[arg(long)]
    pub(crate) note: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) frequency: FrequencyArg,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6))]
    pub(crate) day_of_week: Option<u8>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=31))]
    pub(crate) day_of_month: Option<u8>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
}

#[derive(Args)]
pub(crate) struct RecurringUpdateArgs {
    pub(crate) id: String,
    #[command(flatten)]
    pub(crate) rule: RecurringRuleArgs,
}

#[derive(Args)]
pub(crate) struct HealthHistoryArgs {
    #[arg(long, default_value_t = expensync_client::DEFAULT_HEALTH_HISTORY_MONTHS)]
    pub(crate) months: u32,
}

#[derive(Args)]
pub(crate) struct NotificationListArgs {
    #[arg(long)]
    pub(crate) unread: bool,
    #[arg(long = "type")]
    pub(crate) kind: Option<String>,
}

#[derive(Args)]
pub(crate) struct UserArgs {
    /// Defaults to the signed-in user.
    #[arg(long)]
    pub(crate) user_id: Option<String>,
}

#[derive(Args)]
pub(crate) struct ChatArgs {
    #[command(flatten)]
    pub(crate) user: UserArgs,
    pub(crate) message: String,
    /// JSON file holding prior turns as `[{"role": "user", "content": "..."}]`.
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum ExportFormatArg {
    Pdf,
    Csv,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Pdf => Self::Pdf,
            ExportFormatArg::Csv => Self::Csv,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<FrequencyArg> for Frequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::Daily => Self::Daily,
            FrequencyArg::Weekly => Self::Weekly,
            FrequencyArg::Monthly => Self::Monthly,
            FrequencyArg::Yearly => Self::Yearly,
        }
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Status => "status",
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Signup(_) => "signup",
        Command::VerifyEmail(_) => "verify_email",
        Command::ResendVerification(_) => "resend_verification",
        Command::Whoami => "whoami",
        Command::Transactions(command) => match command {
            TransactionCommand::List(_) => "transactions_list",
            TransactionCommand::Add(_) => "transactions_add",
            TransactionCommand::Delete(_) => "transactions_delete",
            TransactionCommand::Export(_) => "transactions_export",
        },
        Command::Budgets(command) => match command {
            BudgetCommand::List => "budgets_list",
            BudgetCommand::Add(_) => "budgets_add",
            BudgetCommand::Summary => "budgets_summary",
        },
        Command::Debts(command) => match command {
            DebtCommand::List => "debts_list",
            DebtCommand::Add(_) => "debts_add",
            DebtCommand::Delete(_) => "debts_delete",
        },
        Command::Goals(command) => match command {
            GoalCommand::List => "goals_list",
            GoalCommand::Set(_) => "goals_set",
            GoalCommand::Alerts => "goals_alerts",
        },
        Command::Reminders(command) => match command {
            ReminderCommand::List => "reminders_list",
            ReminderCommand::Add(_) => "reminders_add",
            ReminderCommand::Delete(_) => "reminders_delete",
        },
        Command::Recurring(command) => match command {
            RecurringCommand::List(_) => "recurring_list",
            RecurringCommand::Add(_) => "recurring_add",
            RecurringCommand::Update(_) => "recurring_update",
            RecurringCommand::Delete(_) => "recurring_delete",
            RecurringCommand::Toggle(_) => "recurring_toggle",
        },
        Command::Health(command) => match command {
            HealthCommand::Score => "health_score",
            HealthCommand::History(_) => "health_history",
        },
        Command::Notifications(command) => match command {
            NotificationCommand::List(_) => "notifications_list",
            NotificationCommand::Count => "notifications_count",
            NotificationCommand::Read(_) => "notifications_read",
            NotificationCommand::ReadAll => "notifications_read_all",
            NotificationCommand::Delete(_) => "notifications_delete",
        },
        Command::Ai(command) => match command {
            AiCommand::Analyze(_) => "ai_analyze",
            AiCommand::Trends(_) => "ai_trends",
            AiCommand::Chat(_) => "ai_chat",
        },
    }
}
