use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::debug;

use super::document::SharedDocument;
use super::timers::TimerHandle;
use crate::auth::AuthService;
use crate::config::ExpiryPolicy;
use crate::sessions::render::render_grid;
use crate::sessions::{SessionDirectory, SessionFilters};

/// The browse grid, cheap to clone into the refresh timer.
#[derive(Clone)]
pub struct BrowseView {
    sessions: Arc<SessionDirectory>,
    auth: Arc<AuthService>,
    document: SharedDocument,
    policy: ExpiryPolicy,
}

impl BrowseView {
    pub fn new(
        sessions: Arc<SessionDirectory>,
        auth: Arc<AuthService>,
        document: SharedDocument,
        policy: ExpiryPolicy,
    ) -> Self {
        Self {
            sessions,
            auth,
            document,
            policy,
        }
    }

    pub async fn filters(&self) -> SessionFilters {
        let doc = self.document.read().await;
        SessionFilters {
            year: doc.value("filterYear").map(str::to_string),
            module: doc.value("filterModule").map(str::to_string),
        }
    }

    /// Fetches and renders the grid. Returns the number of cards shown.
    pub async fn load(&self) -> usize {
        let filters = self.filters().await;
        let sessions = self.sessions.list(&filters).await;
        let viewer = self.auth.current_user_id().await;

        let mut doc = self.document.write().await;
        if sessions.is_empty() {
            doc.set_html("sessionsGrid", "");
            doc.set_text("noSessions", "No sessions found. Try different filters or create one!");
            doc.show("noSessions");
        } else {
            doc.hide("noSessions");
            doc.set_html(
                "sessionsGrid",
                render_grid(&sessions, viewer.as_deref(), &Local::now(), self.policy),
            );
        }
        debug!("Browse grid shows {} session(s)", sessions.len());
        sessions.len()
    }

    pub fn start_refresh(&self, period: Duration) -> TimerHandle {
        let view = self.clone();
        TimerHandle::every("browse refresh", period, move || {
            let view = view.clone();
            async move {
                view.load().await;
                ControlFlow::Continue(())
            }
        })
    }
}
