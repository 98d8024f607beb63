use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use expensync_api_models::{
    ExportFormat, ExportQuery, NewBudget, NewDebt, NewTransaction, TransactionQuery,
};
use expensync_client::ExportedFile;
use serde_json::json;

use crate::cli::{
    BudgetAddArgs, DebtAddArgs, IdArgs, OutputFormat, TransactionAddArgs, TransactionExportArgs,
    TransactionListArgs,
};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    print_json, render_budgets, render_debts, render_message, render_summary,
    render_transactions,
};

pub(crate) async fn handle_transaction_list(
    ctx: &AppContext,
    args: TransactionListArgs,
) -> CliResult<()> {
    if args.page == 0 || args.limit == 0 {
        return Err(CliError::validation("page and limit must be at least 1"));
    }
    let query = TransactionQuery {
        page: args.page,
        limit: args.limit,
        search: args.search,
        filter: args.filter,
    };
    let page = ctx.client.list_transactions(&query).await?;
    render_transactions(&page, ctx.output)
}

pub(crate) async fn handle_transaction_add(
    ctx: &AppContext,
    args: TransactionAddArgs,
) -> CliResult<()> {
    let transaction = NewTransaction {
        title: args.title,
        amount: args.amount,
        category: args.category,
        note: args.note,
        tags: args.tags,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };
    let message = ctx.client.create_transaction(&transaction).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_transaction_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.delete_transaction(&args.id).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_transaction_export(
    ctx: &AppContext,
    args: TransactionExportArgs,
) -> CliResult<()> {
    let format = ExportFormat::from(args.format);
    let query = ExportQuery {
        format,
        search: args.search,
        filter: args.filter,
        month: args.month,
        year: args.year,
    };
    let file = ctx.client.export_transactions(&query).await?;
    let target = args
        .out
        .unwrap_or_else(|| default_export_path(&file, format));
    std::fs::write(&target, &file.bytes)
        .with_context(|| format!("failed to write {}", target.display()))
        .map_err(CliError::failure)?;

    match ctx.output {
        OutputFormat::Json => print_json(&json!({
            "path": target.display().to_string(),
            "bytes": file.bytes.len(),
            "contentType": file.content_type,
        })),
        OutputFormat::Table => {
            println!("wrote {} bytes to {}", file.bytes.len(), target.display());
            Ok(())
        }
    }
}

/// Server-suggested file name without any directory part, or a
/// format-derived default.
fn default_export_path(file: &ExportedFile, format: ExportFormat) -> PathBuf {
    file.file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .map_or_else(
            || PathBuf::from(format!("transactions.{}", format.as_str())),
            PathBuf::from,
        )
}

pub(crate) async fn handle_budget_list(ctx: &AppContext) -> CliResult<()> {
    let budgets = ctx.client.fetch_budgets().await?;
    render_budgets(&budgets, ctx.output)
}

pub(crate) async fn handle_budget_add(ctx: &AppContext, args: BudgetAddArgs) -> CliResult<()> {
    if args.amount < 0.0 {
        return Err(CliError::validation("budget amount cannot be negative"));
    }
    let budget = NewBudget {
        category: args.category,
        amount: args.amount,
    };
    let message = ctx.client.add_budget(&budget).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_budget_summary(ctx: &AppContext) -> CliResult<()> {
    let summary = ctx.client.fetch_budget_summary().await?;
    render_summary(&summary, ctx.output)
}

pub(crate) async fn handle_debt_list(ctx: &AppContext) -> CliResult<()> {
    let debts = ctx.client.fetch_debts().await?;
    render_debts(&debts, ctx.output)
}

pub(crate) async fn handle_debt_add(ctx: &AppContext, args: DebtAddArgs) -> CliResult<()> {
    let debt = NewDebt {
        name: args.name,
        amount: args.amount,
        due_date: args.due,
        note: args.note,
    };
    let message = ctx.client.add_debt(&debt).await?;
    render_message(&message, ctx.output)
}

pub(crate) async fn handle_debt_delete(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let message = ctx.client.delete_debt(&args.id).await?;
    render_message(&message, ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ExportFormatArg;
    use crate::commands::testing::{context, sign_in};
    use httpmock::prelude::*;

    #[tokio::test]
    async fn transaction_list_sends_paging_query() {
        let server = MockServer::start_async().await;
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/transactions")
                .query_param("page", "2")
                .query_param("limit", "25")
                .query_param("search", "coffee")
                .header("authorization", "Bearer access-1");
            then.status(200)
                .json_body(json!({"transactions": [], "hasMore": false, "total": 0}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        sign_in(dir.path());
        let ctx = context(&server, dir.path());

        handle_transaction_list(
            &ctx,
            TransactionListArgs {
                page: 2,
                limit: 25,
                search: "coffee".into(),
                filter: String::new(),
            },
        )
        .await
        .expect("list");
        list.assert();
    }

    #[tokio::test]
    async fn transaction_list_rejects_zero_page() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());
        let err = handle_transaction_list(
            &ctx,
            TransactionListArgs {
                page: 0,
                limit: 10,
                search: String::new(),
                filter: String::new(),
            },
        )
        .await
        .expect_err("invalid page");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn export_writes_bytes_to_requested_path() {
        let server = MockServer::start_async().await;
        let export = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/transactions/export")
                .query_param("format", "csv")
                .query_param("month", "3")
                .query_param("year", "2025");
            then.status(200)
                .header("content-type", "text/csv")
                .body("title,amount\nRent,-950\n");
        });
        let dir = tempfile::tempdir().expect("tempdir");
        sign_in(dir.path());
        let ctx = context(&server, dir.path());
        let out = dir.path().join("march.csv");

        handle_transaction_export(
            &ctx,
            TransactionExportArgs {
                format: ExportFormatArg::Csv,
                search: String::new(),
                filter: String::new(),
                month: Some(3),
                year: Some(2025),
                out: Some(out.clone()),
            },
        )
        .await
        .expect("export");

        export.assert();
        assert_eq!(
            std::fs::read_to_string(out).expect("exported"),
            "title,amount\nRent,-950\n"
        );
    }

    #[test]
    fn export_path_strips_directories_from_server_name() {
        let file = ExportedFile {
            bytes: Vec::new(),
            content_type: None,
            file_name: Some("../../etc/report.pdf".into()),
        };
        assert_eq!(
            default_export_path(&file, ExportFormat::Pdf),
            PathBuf::from("report.pdf")
        );

        let unnamed = ExportedFile {
            bytes: Vec::new(),
            content_type: None,
            file_name: None,
        };
        assert_eq!(
            default_export_path(&unnamed, ExportFormat::Csv),
            PathBuf::from("transactions.csv")
        );
    }

    #[tokio::test]
    async fn debt_delete_targets_item_path() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v1/debts/d1");
            then.status(200).json_body(json!({"msg": "Debt deleted"}));
        });
        let dir = tempfile::tempdir().expect("tempdir");
        sign_in(dir.path());
        let ctx = context(&server, dir.path());

        handle_debt_delete(&ctx, IdArgs { id: "d1".into() })
            .await
            .expect("delete");
        delete.assert();
    }

    #[tokio::test]
    async fn negative_budget_is_rejected_locally() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());
        let err = handle_budget_add(
            &ctx,
            BudgetAddArgs {
                category: "Food".into(),
                amount: -1.0,
            },
        )
        .await
        .expect_err("negative");
        assert_eq!(err.exit_code(), 2);
    }
}
