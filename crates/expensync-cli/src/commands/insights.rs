use anyhow::Context;
use expensync_api_models::ChatTurn;
use serde_json::{Value, json};

use crate::cli::{ChatArgs, HealthHistoryArgs, IdArgs, NotificationListArgs, OutputFormat, UserArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::auth::signed_in_user;
use crate::output::{
    print_json, render_analysis, render_health, render_history, render_message,
    render_notifications, render_trends,
};

pub(crate) async fn handle_health_score(ctx: &AppContext) -> CliResult<()> {
    let score = ctx.client.health_score().await?;
    render_health(&score, ctx.output)
}

pub(crate) async fn handle_health_history(
    ctx: &AppContext,
    args: HealthHistoryArgs,
) -> CliResult<()> {
    if args.months == 0 {
        return Err(CliError::validation("months must be at least 1"));
    }
    let history = ctx.client.health_history(args.months).await?;
    render_history(&history, ctx.output)
}

pub(crate) async fn handle_notification_list(
    ctx: &AppContext,
    args: NotificationListArgs,
) -> CliResult<()> {
    let notifications = ctx
        .client
        .list_notifications(args.unread, args.kind.as_deref())
        .await?;
    render_notifications(&notifications, ctx.output)
}

pub(crate) async fn handle_notification_count(ctx: &AppContext) -> CliResult<()> {
    let count = ctx.client.unread_notification_count().await?;
    match ctx.output {
        OutputFormat::Json => print_json(&json!({"unreadCount": count})),
        OutputFormat::Table => {
            println!("unread: {count}");
            Ok(())
        }
    }
}

pub(crate) async fn handle_notification_read(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.mark_notification_read(&args.id).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_notification_read_all(ctx: &AppContext) -> CliResult<()> {
    let message = ctx.client.mark_all_notifications_read().await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_notification_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.delete_notification(&args.id).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_ai_analyze(ctx: &AppContext, args: UserArgs) -> CliResult<()> {
    let user_id = resolve_user_id(ctx, &args)?;
    let analysis = ctx.client.ai_insights(&user_id).await?;
    render_analysis(&analysis, ctx.output)
}

pub(crate) async fn handle_ai_trends(ctx: &AppContext, args: UserArgs) -> CliResult<()> {
    let user_id = resolve_user_id(ctx, &args)?;
    let trends = ctx.client.trend_insights(&user_id).await?;
    render_trends(&trends, ctx.output)
}

pub(crate) async fn handle_ai_chat(ctx: &AppContext, args: ChatArgs) -> CliResult<()> {
    let user_id = resolve_user_id(ctx, &args.user)?;
    let history: Vec<ChatTurn> = match &args.history {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .map_err(CliError::failure)?;
            serde_json::from_str(&raw).map_err(|err| {
                CliError::validation(format!("chat history is not valid JSON: {err}"))
            })?
        }
        None => Vec::new(),
    };
    let reply = ctx.client.chat(&user_id, &args.message, &history).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&reply),
        OutputFormat::Table => {
            println!("{}", reply.response.as_deref().unwrap_or("(no response)"));
            Ok(())
        }
    }
}

/// Explicit `--user-id`, else the id stored with the session.
fn resolve_user_id(ctx: &AppContext, args: &UserArgs) -> CliResult<String> {
    if let Some(id) = args.user_id.as_deref().map(str::trim)
        && !id.is_empty()
    {
        return Ok(id.to_string());
    }
    let user = signed_in_user(ctx)?;
    ["_id", "id"]
        .iter()
        .find_map(|key| user.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| CliError::validation("stored user has no id; pass --user-id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{context, sign_in};
    use httpmock::prelude::*;

    #[tokio::test]
    async fn analyze_uses_stored_user_and_ai_root() {
        let server = MockServer::start_async().await;
        let analyze = server.mock(|when, then| {
            when.method(GET)
                .path("/api/ai/analyze/u1")
                .header("authorization", "Bearer access-1");
            then.status(200)
                .json_body(json!({"success": true, "insights": ["Spend less on coffee"]}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        sign_in(dir.path());
        let ctx = context(&server, dir.path());

        handle_ai_analyze(&ctx, UserArgs { user_id: None })
            .await
            .expect("analyze");
        analyze.assert();
    }

    #[tokio::test]
    async fn ai_requires_a_user() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let err = handle_ai_trends(&ctx, UserArgs { user_id: None })
            .await
            .expect_err("no user");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn chat_forwards_history_from_file() {
        let server = MockServer::start_async().await;
        let chat = server.mock(|when, then| {
            when.method(POST)
                .path("/api/ai/chat/u9")
                .json_body(json!({
                    "message": "And now?",
                    "chatHistory": [{"role": "user", "content": "Hi"}]
                }));
            then.status(200).json_body(json!({"response": "Looking good"}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let history = dir.path().join("history.json");
        std::fs::write(&history, r#"[{"role": "user", "content": "Hi"}]"#).expect("history");
        let ctx = context(&server, dir.path());

        handle_ai_chat(
            &ctx,
            ChatArgs {
                user: UserArgs {
                    user_id: Some("u9".into()),
                },
                message: "And now?".into(),
                history: Some(history),
            },
        )
        .await
        .expect("chat");
        chat.assert();
    }

    #[tokio::test]
    async fn notification_count_reads_envelope() {
        let server = MockServer::start_async().await;
        let count = server.mock(|when, then| {
            when.method(GET).path("/api/v1/notifications/unread-count");
            then.status(200)
                .json_body(json!({"success": true, "data": {"unreadCount": 4}}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        sign_in(dir.path());
        let ctx = context(&server, dir.path());

        handle_notification_count(&ctx).await.expect("count");
        count.assert();
    }
}
