//! Behaviour of the authenticated pipeline: loader accounting, bearer
//! injection, refresh-once recovery, and forced logout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use expensync_api_models::{ExportFormat, ExportQuery, LoginRequest, SignupRequest, TransactionQuery};
use expensync_client::client::{LOGGED_OUT_NOTICE, REFRESH_PATH, SESSION_EXPIRED_NOTICE};
use expensync_client::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use expensync_client::{
    ApiClient, ApiError, ApiRequest, ClientContext, KeyValueStore, LoadingSignal, MemoryStore,
    NoticeLevel, SessionStore,
};
use expensync_test_support::fixtures::{
    FRESH_TOKEN, Harness, REFRESH_TOKEN, STALE_TOKEN, local_config, login_body, refresh_body,
    seeded_session, transaction_page,
};
use expensync_test_support::mocks::{Reply, ScriptedTransport, bearer};
use futures_util::future::join_all;
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde_json::json;

const REFRESH: &str = "/auth/refresh-token";

fn fresh_only(page: serde_json::Value) -> impl Fn(&expensync_client::RawRequest) -> Reply {
    move |request| {
        if bearer(request) == Some(FRESH_TOKEN) {
            Reply::ok(page.clone())
        } else {
            Reply::unauthorized()
        }
    }
}

#[tokio::test]
async fn loader_returns_to_baseline_after_concurrent_requests() {
    let loader = LoadingSignal::new();
    let observed = Arc::new(Mutex::new(Vec::new()));

    let observer = loader.clone();
    let seen = observed.clone();
    let failing_loader = loader.clone();
    let failing_seen = observed.clone();
    let transport = ScriptedTransport::new()
        .with_latency(Duration::from_millis(20))
        .route(Method::GET, "/budgets", move |_| {
            seen.lock().expect("lock").push(observer.in_flight());
            Reply::ok(json!([]))
        })
        .route(Method::GET, "/summary", move |_| {
            failing_seen.lock().expect("lock").push(failing_loader.in_flight());
            Reply::Json(500, json!({"msg": "boom"}))
        });

    let context = ClientContext::new(seeded_session(Some(STALE_TOKEN), None)).with_loader(loader.clone());
    let client = ApiClient::with_transport(local_config(), context, Arc::new(transport));

    let calls = (0..8).map(|index| {
        let client = client.clone();
        async move {
            let path = if index % 2 == 0 { "budgets" } else { "summary" };
            client.send(ApiRequest::get(path).silent()).await.is_ok()
        }
    });
    let outcomes = join_all(calls).await;

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 4);
    let observed = observed.lock().expect("lock").clone();
    assert_eq!(observed.len(), 8);
    assert!(observed.iter().all(|count| *count >= 1));
    assert!(observed.iter().any(|count| *count > 1));
    assert_eq!(loader.in_flight(), 0);
    assert!(!loader.is_active());
    assert!(!*loader.subscribe().borrow());
}

#[tokio::test]
async fn skip_loader_requests_never_touch_the_indicator() {
    let loader = LoadingSignal::new();
    let observer = loader.clone();
    let transport = ScriptedTransport::new().route(Method::GET, "/reminders", move |_| {
        Reply::ok(json!([{"_id": "r1", "title": "Rent", "inFlight": observer.in_flight()}]))
    });
    let context = ClientContext::default().with_loader(loader.clone());
    let client = ApiClient::with_transport(local_config(), context, Arc::new(transport));

    let response = client
        .send(ApiRequest::get("reminders").skip_loader())
        .await
        .expect("reminders");
    let body: serde_json::Value = response.json().expect("json");
    assert_eq!(body[0]["inFlight"], 0);
    assert_eq!(loader.in_flight(), 0);
}

#[tokio::test]
async fn login_and_signup_never_carry_a_token() {
    let transport = ScriptedTransport::new()
        .reply(Method::POST, "/auth/login", Reply::ok(login_body()))
        .reply(
            Method::POST,
            "/auth/signup",
            Reply::ok(json!({"success": true, "msg": "Welcome"})),
        )
        .reply(Method::GET, "/budgets", Reply::ok(json!([])));
    let harness = Harness::signed_in(transport);

    harness
        .client
        .signup(&SignupRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .expect("signup");
    harness
        .client
        .login(&LoginRequest {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .expect("login");
    harness.client.fetch_budgets().await.expect("budgets");

    let signup = harness.transport.requests_to(&Method::POST, "/auth/signup");
    let login = harness.transport.requests_to(&Method::POST, "/auth/login");
    assert!(bearer(&signup[0]).is_none());
    assert!(bearer(&login[0]).is_none());

    let budgets = harness.transport.requests_to(&Method::GET, "/budgets");
    assert_eq!(bearer(&budgets[0]), Some("login-access"));
}

#[tokio::test]
async fn public_auth_paths_skip_the_token_even_through_raw_send() {
    let transport = ScriptedTransport::new().reply(
        Method::POST,
        "/auth/login",
        Reply::Json(400, json!({"msg": "bad"})),
    );
    let harness = Harness::signed_in(transport);

    let err = harness
        .client
        .send(ApiRequest::post("auth/login").silent())
        .await
        .expect_err("rejected");
    assert!(matches!(err, ApiError::Validation { status: 400, .. }));
    let login = harness.transport.requests_to(&Method::POST, "/auth/login");
    assert!(bearer(&login[0]).is_none());
}

#[tokio::test]
async fn expired_token_refreshes_once_and_retries_with_the_new_token() {
    let transport = ScriptedTransport::new()
        .route(Method::GET, "/transactions", fresh_only(transaction_page()))
        .reply(Method::POST, REFRESH, Reply::ok(refresh_body()));
    let harness = Harness::signed_in(transport);

    let page = harness
        .client
        .list_transactions(&TransactionQuery::default())
        .await
        .expect("page after refresh");
    assert_eq!(page.transactions[0].id, "t1");

    let attempts = harness.transport.requests_to(&Method::GET, "/transactions");
    assert_eq!(attempts.len(), 2);
    assert_eq!(bearer(&attempts[0]), Some(STALE_TOKEN));
    assert_eq!(bearer(&attempts[1]), Some(FRESH_TOKEN));

    let refreshes = harness.transport.requests_to(&Method::POST, REFRESH);
    assert_eq!(refreshes.len(), 1);
    assert!(bearer(&refreshes[0]).is_none());
    assert_eq!(
        refreshes[0].body,
        Some(json!({"refreshToken": REFRESH_TOKEN}))
    );
    assert!(refreshes[0].url.path().ends_with(REFRESH_PATH));

    let session = harness.client.session();
    assert_eq!(session.access_token().as_deref(), Some(FRESH_TOKEN));
    assert_eq!(session.refresh_token().as_deref(), Some(REFRESH_TOKEN));
    assert!(harness.notifier.messages(NoticeLevel::Error).is_empty());
    assert_eq!(harness.navigator.redirects(), 0);
    assert_eq!(harness.client.loader().in_flight(), 0);
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_stored_one() {
    let transport = ScriptedTransport::new()
        .route(Method::GET, "/budgets", fresh_only(json!([])))
        .reply(
            Method::POST,
            REFRESH,
            Reply::ok(json!({"accessToken": FRESH_TOKEN, "refreshToken": "refresh-2"})),
        );
    let harness = Harness::signed_in(transport);

    harness.client.fetch_budgets().await.expect("budgets");
    assert_eq!(
        harness.client.session().refresh_token().as_deref(),
        Some("refresh-2")
    );
}

#[tokio::test]
async fn unauthorized_retry_does_not_refresh_twice() {
    let transport = ScriptedTransport::new()
        .route(Method::GET, "/debts", |_| Reply::unauthorized())
        .route(Method::POST, REFRESH, |_| Reply::ok(refresh_body()));
    let harness = Harness::signed_in(transport);

    let err = harness.client.fetch_debts().await.expect_err("still 401");
    assert!(matches!(
        err,
        ApiError::Unauthorized {
            retry_exhausted: true,
            ..
        }
    ));
    assert!(err.ends_session());
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 1);
    assert_eq!(harness.transport.count(&Method::GET, "/debts"), 2);

    assert!(!harness.client.session().is_authenticated());
    assert!(harness.client.session().refresh_token().is_none());
    assert_eq!(harness.navigator.redirects(), 1);
    assert_eq!(
        harness.notifier.messages(NoticeLevel::Info),
        vec![SESSION_EXPIRED_NOTICE.to_string()]
    );
    assert!(harness.notifier.messages(NoticeLevel::Error).is_empty());
}

#[tokio::test]
async fn missing_refresh_token_logs_out_without_calling_refresh() {
    let transport =
        ScriptedTransport::new().route(Method::GET, "/budgets", |_| Reply::unauthorized());
    let harness = Harness::build(
        transport,
        seeded_session(Some(STALE_TOKEN), None),
        local_config(),
    );

    let err = harness.client.fetch_budgets().await.expect_err("expired");
    assert!(matches!(err, ApiError::SessionExpired { .. }));
    assert_eq!(err.message(), SESSION_EXPIRED_NOTICE);
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 0);
    assert_eq!(harness.transport.count(&Method::GET, "/budgets"), 1);
    assert!(!harness.client.session().is_authenticated());
    assert_eq!(harness.navigator.redirects(), 1);
}

#[tokio::test]
async fn rejected_refresh_logs_out_and_propagates() {
    let transport = ScriptedTransport::new()
        .route(Method::GET, "/summary", |_| Reply::unauthorized())
        .reply(
            Method::POST,
            REFRESH,
            Reply::Json(403, json!({"msg": "Invalid refresh token"})),
        );
    let harness = Harness::signed_in(transport);

    let err = harness
        .client
        .fetch_budget_summary()
        .await
        .expect_err("expired");
    match &err {
        ApiError::SessionExpired { reason } => assert!(reason.contains("Invalid refresh token")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(harness.transport.count(&Method::GET, "/summary"), 1);
    assert!(harness.client.session().access_token().is_none());
    assert_eq!(harness.navigator.redirects(), 1);
}

#[tokio::test]
async fn concurrent_failures_end_the_session_once() {
    let transport = ScriptedTransport::new()
        .with_latency(Duration::from_millis(20))
        .route(Method::GET, "/summary", |_| Reply::unauthorized())
        .route(Method::POST, REFRESH, |_| {
            Reply::Json(403, json!({"msg": "Invalid refresh token"}))
        });
    let harness = Harness::signed_in(transport);

    let calls = (0..5).map(|_| {
        let client = harness.client.clone();
        async move { client.fetch_budget_summary().await }
    });
    let results = join_all(calls).await;

    assert!(
        results
            .iter()
            .all(|result| matches!(result, Err(ApiError::SessionExpired { .. })))
    );
    assert_eq!(harness.transport.count(&Method::GET, "/summary"), 5);
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 1);
    assert_eq!(
        harness.notifier.messages(NoticeLevel::Info),
        vec![SESSION_EXPIRED_NOTICE.to_string()]
    );
    assert_eq!(harness.navigator.redirects(), 1);
    assert!(!harness.client.session().is_authenticated());
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let transport = ScriptedTransport::new()
        .with_latency(Duration::from_millis(20))
        .route(Method::GET, "/transactions", fresh_only(transaction_page()))
        .route(Method::POST, REFRESH, |_| Reply::ok(refresh_body()));
    let harness = Harness::signed_in(transport);

    let calls = (0..5).map(|_| {
        let client = harness.client.clone();
        async move {
            client
                .list_transactions(&TransactionQuery::default())
                .await
        }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 1);
    assert_eq!(harness.transport.count(&Method::GET, "/transactions"), 10);
    assert_eq!(harness.client.loader().in_flight(), 0);
}

#[tokio::test]
async fn disabling_coalescing_refreshes_per_request() {
    let transport = ScriptedTransport::new()
        .with_latency(Duration::from_millis(20))
        .route(Method::GET, "/transactions", fresh_only(transaction_page()))
        .route(Method::POST, REFRESH, |_| Reply::ok(refresh_body()));
    let harness = Harness::build(
        transport,
        seeded_session(Some(STALE_TOKEN), Some(REFRESH_TOKEN)),
        local_config().with_coalesce_refresh(false),
    );

    let calls = (0..3).map(|_| {
        let client = harness.client.clone();
        async move {
            client
                .list_transactions(&TransactionQuery::default())
                .await
        }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 3);
}

#[tokio::test]
async fn logout_clears_every_key_with_or_without_a_session() {
    let backing = Arc::new(MemoryStore::with_values([
        (ACCESS_TOKEN_KEY, "a"),
        (REFRESH_TOKEN_KEY, "r"),
        (USER_KEY, "{\"name\":\"Ada\"}"),
    ]));
    let harness = Harness::build(
        ScriptedTransport::new(),
        SessionStore::new(backing.clone()),
        local_config(),
    );

    harness.client.logout().await.expect("logout");
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
        assert!(backing.get(key).is_none(), "{key} survived logout");
    }

    harness.client.logout().await.expect("second logout");
    assert_eq!(harness.navigator.redirects(), 2);
    assert_eq!(
        harness.notifier.messages(NoticeLevel::Info),
        vec![LOGGED_OUT_NOTICE.to_string(), LOGGED_OUT_NOTICE.to_string()]
    );
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn export_is_binary_and_bypasses_the_loader() {
    let loader = LoadingSignal::new();
    let observer = loader.clone();
    let in_flight = Arc::new(Mutex::new(None));
    let seen = in_flight.clone();
    let transport = ScriptedTransport::new().route(Method::GET, "/transactions/export", move |_| {
        *seen.lock().expect("lock") = Some(observer.in_flight());
        Reply::Bytes {
            status: 200,
            content_type: "text/csv",
            body: b"title,amount\nCoffee,-3.5\n".to_vec(),
        }
    });
    let context = ClientContext::new(seeded_session(Some(STALE_TOKEN), None)).with_loader(loader);
    let transport = Arc::new(transport);
    let client = ApiClient::with_transport(local_config(), context, transport.clone());

    let file = client
        .export_transactions(&ExportQuery {
            format: ExportFormat::Csv,
            month: Some(3),
            year: Some(2025),
            ..ExportQuery::default()
        })
        .await
        .expect("export");

    assert_eq!(file.bytes, b"title,amount\nCoffee,-3.5\n");
    assert_eq!(file.content_type.as_deref(), Some("text/csv"));
    assert_eq!(*in_flight.lock().expect("lock"), Some(0));

    let request = &transport.requests_to(&Method::GET, "/transactions/export")[0];
    assert_eq!(request.headers.get(ACCEPT).expect("accept"), "*/*");
    let query = request.url.query().expect("query");
    assert!(query.contains("format=csv"));
    assert!(query.contains("month=3"));
    assert!(query.contains("year=2025"));
}

#[tokio::test]
async fn failures_surface_best_message_unless_silent() {
    let transport = ScriptedTransport::new()
        .reply(
            Method::POST,
            "/budgets",
            Reply::Json(422, json!({"message": "amount is required"})),
        )
        .reply(Method::POST, "/budgets", Reply::Json(503, json!({})))
        .reply(
            Method::POST,
            "/budgets",
            Reply::Fail("connection reset".into()),
        );
    let harness = Harness::signed_in(transport);

    let validation = harness
        .client
        .send(ApiRequest::post("budgets"))
        .await
        .expect_err("422");
    assert!(matches!(validation, ApiError::Validation { status: 422, .. }));

    let server = harness
        .client
        .send(ApiRequest::post("budgets"))
        .await
        .expect_err("503");
    assert_eq!(server.message(), "Request failed with status code 503");

    let network = harness
        .client
        .send(ApiRequest::post("budgets").silent())
        .await
        .expect_err("network");
    assert!(matches!(network, ApiError::Network { .. }));
    assert_eq!(network.message(), "connection reset");

    assert_eq!(
        harness.notifier.messages(NoticeLevel::Error),
        vec![
            "amount is required".to_string(),
            "Request failed with status code 503".to_string()
        ]
    );
    assert_eq!(harness.navigator.redirects(), 0);
}

#[tokio::test]
async fn anonymous_requests_never_attempt_recovery() {
    let transport =
        ScriptedTransport::new().route(Method::GET, "/auth/verify-email", |_| Reply::unauthorized());
    let harness = Harness::signed_in(transport);

    let err = harness
        .client
        .verify_email("abc")
        .await
        .expect_err("401");
    assert!(err.is_recoverable_unauthorized());
    assert_eq!(harness.transport.count(&Method::POST, REFRESH), 0);
    assert!(harness.client.session().is_authenticated());
    assert_eq!(harness.navigator.redirects(), 0);
}
