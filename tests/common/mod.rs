#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use studybuddy_client::{App, AppState, MemoryTokenStore, Settings, ShellCommand};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::MockServer;

pub fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::new_for_test().expect("Failed to load test config");
    settings.api.base_url = format!("{}/api", server.uri());
    settings
}

pub fn app_with(settings: Settings, token: Option<&str>) -> (App, UnboundedReceiver<ShellCommand>) {
    let store = match token {
        Some(t) => MemoryTokenStore::with_token(t),
        None => MemoryTokenStore::new(),
    };
    let state = AppState::new(settings, Arc::new(store)).expect("Failed to build state");
    App::new(state)
}

pub fn app(server: &MockServer, token: Option<&str>) -> (App, UnboundedReceiver<ShellCommand>) {
    app_with(settings(server), token)
}

pub fn user(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "email": format!("{}@uni.ac.uk", id), "year": "2", "modules": ["CS2010"] })
}

pub fn session(id: &str, creator: &str, participants: &[&str]) -> Value {
    json!({
        "id": id,
        "title": "Graph algorithms",
        "module": "CS2010",
        "year": "2",
        "date": "2030-01-10",
        "time": "14:00:00",
        "duration": 60,
        "maxParticipants": 4,
        "participants": participants,
        "joinRequests": [],
        "participantCount": participants.len(),
        "creatorId": creator,
        "creatorName": "Host",
        "preferences": ["Quiet"],
        "isLive": false,
        "isScheduled": false
    })
}

pub fn message(id: u32, sender: &str, content: &str, timestamp: i64) -> Value {
    json!({ "id": id, "sessionId": "s1", "senderId": sender, "senderName": "Someone", "content": content, "timestamp": timestamp })
}

/// Requests the mock server has seen for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}

/// Polls `check` until it holds or `limit` passes.
pub async fn eventually<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check().await
}
