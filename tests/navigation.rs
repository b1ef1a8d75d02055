mod common;

use std::time::Duration;

use chrono::Local;
use serde_json::json;
use tokio_test::assert_ok;
use studybuddy_client::config::ExpiryPolicy;
use studybuddy_client::shell::SESSION_ENDED;
use studybuddy_client::{Page, ShellCommand};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSIONS: &str = "/api/sessions";

async fn server_with_sessions() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([common::session("s1", "u2", &["u2"])])))
        .mount(&server)
        .await;
    server
}

#[test_log::test(tokio::test)]
async fn test_protected_page_redirects_to_login() {
    let server = MockServer::start().await;
    let (mut app, _commands) = common::app(&server, None);
    app.start().await;

    app.navigate(Page::Create).await;
    assert_eq!(app.current_page(), Page::Login);
    assert_eq!(
        app.toasts.last().await.map(|t| t.message),
        Some("Please login to access this page".to_string())
    );

    let doc = app.state.document.read().await;
    assert_eq!(doc.active_ids("Page"), vec!["loginPage"]);
    assert_eq!(doc.active_ids("Nav"), vec!["loginNav"]);
}

#[test_log::test(tokio::test)]
async fn test_browse_renders_grid() {
    let server = server_with_sessions().await;
    let (mut app, _commands) = common::app(&server, None);
    app.start().await;

    app.navigate(Page::Browse).await;
    let view = app.page_view().await;
    let grid = view
        .iter()
        .find(|(id, _)| id == "sessionsGrid")
        .map(|(_, html)| html.clone())
        .unwrap_or_default();
    assert!(grid.contains("Graph algorithms"));
    assert!(app.state.document.read().await.is_hidden("noSessions"));
}

#[test_log::test(tokio::test)]
async fn test_revisiting_browse_keeps_one_refresh_timer() {
    let server = server_with_sessions().await;
    let (mut app, _commands) = common::app(&server, None);
    app.start().await;

    app.navigate(Page::Browse).await;
    app.navigate(Page::Login).await;
    assert_eq!(app.active_timers().await, 0);

    app.navigate(Page::Browse).await;
    app.navigate(Page::Browse).await;
    assert_eq!(app.active_timers().await, 1);
    assert_eq!(common::hits(&server, SESSIONS).await, 3);

    // Test refresh interval is one second: exactly one more fetch.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(common::hits(&server, SESSIONS).await, 4);

    app.navigate(Page::Home).await;
    assert_eq!(app.active_timers().await, 0);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(common::hits(&server, SESSIONS).await, 4);
}

#[test_log::test(tokio::test)]
async fn test_filters_are_sent_as_query() {
    let server = MockServer::start().await;
    let (mut app, _commands) = common::app(&server, None);
    app.start().await;
    app.navigate(Page::Browse).await;

    assert_eq!(app.apply_filters("2", "").await, 0);
    let requests = server.received_requests().await.unwrap_or_default();
    let last = requests.last().map(|r| r.url.query().unwrap_or("").to_string());
    assert_eq!(last.as_deref(), Some("year=2"));

    let doc = app.state.document.read().await;
    assert!(!doc.is_hidden("noSessions"));
}

#[test_log::test(tokio::test)]
async fn test_ended_session_redirects_under_expire_policy() {
    let server = MockServer::start().await;
    let started = Local::now() - chrono::Duration::hours(2);
    let mut session = common::session("s9", "u2", &["u2"]);
    session["date"] = json!(started.format("%Y-%m-%d").to_string());
    session["time"] = json!(started.format("%H:%M:%S").to_string());
    session["duration"] = json!(30);
    session["isLive"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/api/sessions/s9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session))
        .mount(&server)
        .await;

    let mut settings = common::settings(&server);
    settings.session_view.expiry_policy = ExpiryPolicy::Expire;
    let (mut app, mut commands) = common::app_with(settings, None);
    app.start().await;

    assert_ok!(app.view_session("s9").await);
    assert_eq!(app.current_page(), Page::SessionView);

    let command = tokio::time::timeout(Duration::from_secs(2), commands.recv())
        .await
        .expect("no redirect issued");
    assert_eq!(command, Some(ShellCommand::Navigate(Page::Browse)));
    assert!(app.toasts.messages().await.iter().any(|m| m == "Session has ended"));
    assert_eq!(
        app.state.document.read().await.html("viewSessionDuration"),
        Some(SESSION_ENDED)
    );

    if let Some(command) = command {
        app.handle_command(command).await;
    }
    assert_eq!(app.current_page(), Page::Browse);
    assert_eq!(app.active_timers().await, 1);
}

#[test_log::test(tokio::test)]
async fn test_live_countdown_under_default_policy() {
    let server = MockServer::start().await;
    let started = Local::now() - chrono::Duration::minutes(10);
    let mut session = common::session("s8", "u2", &["u2"]);
    session["date"] = json!(started.format("%Y-%m-%d").to_string());
    session["time"] = json!(started.format("%H:%M:%S").to_string());
    session["duration"] = json!(120);
    session["isLive"] = json!(true);
    Mock::given(method("GET"))
        .and(path("/api/sessions/s8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session))
        .mount(&server)
        .await;

    let (mut app, _commands) = common::app(&server, None);
    app.start().await;
    assert_ok!(app.view_session("s8").await);

    let doc = &app.state.document;
    assert!(
        common::eventually(Duration::from_secs(1), || async move {
            doc.read()
                .await
                .html("viewSessionDuration")
                .is_some_and(|t| t.ends_with("m left"))
        })
        .await
    );
    assert_eq!(app.active_timers().await, 1);

    let doc = app.state.document.read().await;
    assert_eq!(doc.html("viewSessionLive"), Some("LIVE"));
    assert!(doc.html("chatLocked").unwrap_or_default().contains("Join this session"));
    drop(doc);

    app.navigate(Page::Home).await;
    assert_eq!(app.active_timers().await, 0);
}
