use std::io::{self, IsTerminal};

use anyhow::anyhow;
use expensync_api_models::{LoginRequest, SignupRequest};
use serde_json::Value;

use crate::cli::{LoginArgs, ResendVerificationArgs, SignupArgs, VerifyEmailArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_message, render_status, render_user};

pub(crate) async fn handle_status(ctx: &AppContext) -> CliResult<()> {
    let status = ctx.client.check_backend().await;
    render_status(&status, ctx.output)
}

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let email = required(&args.email, "email")?;
    let password = resolve_password(args.password.as_deref())?;
    let response = ctx
        .client
        .login(&LoginRequest { email, password })
        .await?;
    if let Some(user) = &response.user {
        render_user(user, ctx.output)?;
    }
    Ok(())
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.client.logout().await?;
    Ok(())
}

pub(crate) async fn handle_signup(ctx: &AppContext, args: SignupArgs) -> CliResult<()> {
    let details = SignupRequest {
        name: required(&args.name, "name")?,
        email: required(&args.email, "email")?,
        password: resolve_password(args.password.as_deref())?,
    };
    let message = ctx.client.signup(&details).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_verify_email(ctx: &AppContext, args: VerifyEmailArgs) -> CliResult<()> {
    let token = required(&args.token, "verification token")?;
    let message = ctx.client.verify_email(&token).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_resend_verification(
    ctx: &AppContext,
    args: ResendVerificationArgs,
) -> CliResult<()> {
    let email = required(&args.email, "email")?;
    let message = ctx.client.resend_verification(&email).await?;
    render_message(&message, ctx.output)
}

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let user = signed_in_user(ctx)?;
    render_user(&user, ctx.output)
}

/// Stored user record, or a validation error when nobody is signed in.
pub(crate) fn signed_in_user(ctx: &AppContext) -> CliResult<Value> {
    ctx.client
        .current_user()
        .ok_or_else(|| CliError::validation("not signed in; run `expensync login` first"))
}

fn required(value: &str, field: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn resolve_password(provided: Option<&str>) -> CliResult<String> {
    if let Some(value) = provided {
        if value.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        let password = rpassword::prompt_password("Password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        if password.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        Ok(password)
    } else {
        Err(CliError::validation(
            "password required; supply via --password or EXPENSYNC_PASSWORD when running non-interactively",
        ))
    }
}
