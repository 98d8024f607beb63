//! Client construction, error types, and console notices for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::NaiveDate;
use expensync_api_models::CategoryGoal;
use expensync_client::config::{ENV_API_URL, ENV_COALESCE_REFRESH, ENV_HOST, ENV_TIMEOUT_SECS};
use expensync_client::{
    ApiClient, ApiError, ClientConfig, ClientContext, FileStore, Navigator, Notice, Notifier,
    SessionStore,
};

use crate::cli::{ConnectionArgs, OutputFormat};

const SESSION_FILE_NAME: &str = "session.json";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::InvalidInput { message } | ApiError::Validation { message, .. } => {
                Self::Validation(message.clone())
            }
            _ => Self::Failure(anyhow!(err)),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) client: ApiClient,
    pub(crate) output: OutputFormat,
}

/// Prints notices to stderr so stdout stays machine-readable.
#[derive(Debug, Default)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}: {}", notice.level, notice.message);
    }
}

/// Tells the user how to sign in again once the session ends.
#[derive(Debug, Default)]
pub(crate) struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to_login(&self) {
        eprintln!("run `expensync login` to sign in again");
    }
}

/// Resolve configuration from connection flags.
pub(crate) fn client_config(args: &ConnectionArgs) -> CliResult<ClientConfig> {
    ClientConfig::from_lookup(|key| match key {
        ENV_API_URL => args.api_url.clone(),
        ENV_HOST => args.host.clone(),
        ENV_TIMEOUT_SECS => Some(args.timeout.to_string()),
        ENV_COALESCE_REFRESH => Some(args.coalesce_refresh.to_string()),
        _ => None,
    })
    .map_err(|err| CliError::validation(format!("{err:#}")))
}

/// Build the API client with a file-backed session and console side effects.
pub(crate) fn build_client(args: &ConnectionArgs) -> CliResult<ApiClient> {
    let config = client_config(args)?;
    let path = args
        .session_file
        .clone()
        .unwrap_or_else(|| default_session_path(|key| std::env::var(key).ok()));
    let store = FileStore::open(&path).map_err(CliError::failure)?;
    tracing::debug!(session_file = %path.display(), base_url = %config.base_url(), "client configured");

    let context = ClientContext::new(SessionStore::new(Arc::new(store)))
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_navigator(Arc::new(ConsoleNavigator));
    ApiClient::new(config, context).map_err(CliError::from)
}

/// Default session location under the user's configuration directory.
pub(crate) fn default_session_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(config_home) = non_empty("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home)
            .join("expensync")
            .join(SESSION_FILE_NAME);
    }
    if let Some(home) = non_empty("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("expensync")
            .join(SESSION_FILE_NAME);
    }
    PathBuf::from(".expensync-session.json")
}

/// Parse a `YYYY-MM-DD` date.
pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{input}' (expected YYYY-MM-DD): {err}"))
}

/// Parse a `category=amount` goal.
pub(crate) fn parse_goal(input: &str) -> Result<CategoryGoal, String> {
    let (category, amount) = input
        .split_once('=')
        .ok_or_else(|| format!("goal '{input}' must be written as category=amount"))?;
    let category = category.trim();
    if category.is_empty() {
        return Err(format!("goal '{input}' is missing a category"));
    }
    let goal = amount
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("goal '{input}' has a non-numeric amount"))?;
    if !goal.is_finite() || goal < 0.0 {
        return Err(format!("goal '{input}' must be a non-negative amount"));
    }
    Ok(CategoryGoal {
        category: category.to_string(),
        goal,
    })
}
