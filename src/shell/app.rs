use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::browse::BrowseView;
use super::profile::{ProfileData, ProfileTab};
use super::router::Page;
use super::timers::TimerHandle;
use super::toast::Toasts;
use crate::chat::ChatPanel;
use crate::models::Session;
use crate::AppState;

/// Requests raised by background timers for the shell loop to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Navigate(Page),
}

#[derive(Default)]
pub(crate) struct PageTimers {
    pub browse_refresh: Option<TimerHandle>,
    pub countdown: Option<TimerHandle>,
}

/// Single-page shell: one active page, its timers, and the components the
/// pages render through.
pub struct App {
    pub state: AppState,
    pub chat: ChatPanel,
    pub toasts: Toasts,
    pub(crate) browse: BrowseView,
    pub(crate) current: Page,
    pub(crate) timers: PageTimers,
    pub(crate) commands: mpsc::UnboundedSender<ShellCommand>,
    pub(crate) profile: ProfileData,
    pub(crate) profile_tab: ProfileTab,
    pub(crate) viewing: Option<Session>,
    pub(crate) modal_user: Option<String>,
}

impl App {
    pub fn new(state: AppState) -> (Self, mpsc::UnboundedReceiver<ShellCommand>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let chat = ChatPanel::new(
            state.api.clone(),
            state.auth.clone(),
            state.document.clone(),
            state.config.chat.clone(),
        );
        let toasts = Toasts::new(state.document.clone(), &state.config.toast);
        let browse = BrowseView::new(
            state.sessions.clone(),
            state.auth.clone(),
            state.document.clone(),
            state.config.session_view.expiry_policy,
        );

        let app = Self {
            state,
            chat,
            toasts,
            browse,
            current: Page::Home,
            timers: PageTimers::default(),
            commands,
            profile: ProfileData::default(),
            profile_tab: ProfileTab::Created,
            viewing: None,
            modal_user: None,
        };
        (app, receiver)
    }

    /// Restores a stored login and shows the home page.
    pub async fn start(&mut self) {
        info!("Initializing Study Buddy client");
        self.state.auth.restore().await;
        self.navigate(Page::Home).await;
    }

    pub fn current_page(&self) -> Page {
        self.current
    }

    pub async fn handle_command(&mut self, command: ShellCommand) {
        debug!("Shell command: {:?}", command);
        match command {
            ShellCommand::Navigate(page) => self.navigate(page).await,
        }
    }

    /// Switches the visible page. Timers belonging to the old page are
    /// cancelled first and the chat is closed when leaving a session.
    pub async fn navigate(&mut self, page: Page) {
        if let Some(countdown) = self.timers.countdown.take() {
            countdown.cancel();
        }
        if self.current == Page::SessionView && page != Page::SessionView {
            self.chat.close().await;
            self.viewing = None;
        }

        let page = if page.requires_auth() && !self.state.auth.is_logged_in().await {
            self.toasts.error("Please login to access this page").await;
            Page::Login
        } else {
            page
        };

        {
            let mut doc = self.state.document.write().await;
            doc.deactivate_all("Page");
            doc.set_active(&page.element_id(), true);
            doc.deactivate_all("Nav");
            doc.set_active(&page.nav_id(), true);
        }
        self.current = page;
        info!("Navigated to {}", page);

        self.on_page_load(page).await;
    }

    async fn on_page_load(&mut self, page: Page) {
        if let Some(refresh) = self.timers.browse_refresh.take() {
            refresh.cancel();
        }

        match page {
            Page::Browse => {
                self.browse.load().await;
                let period = self.state.config.browse.refresh_interval();
                self.timers.browse_refresh = Some(self.browse.start_refresh(period));
            }
            Page::Profile => self.load_profile().await,
            Page::Create => {
                let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
                let mut doc = self.state.document.write().await;
                doc.set_value("sessionDate", today);
                doc.set_value("startNow", "false");
                doc.show("scheduleFields");
            }
            _ => {}
        }
    }

    /// Background timers currently running: browse refresh, session
    /// countdown and the chat poller.
    pub async fn active_timers(&self) -> usize {
        let page_timers = [&self.timers.browse_refresh, &self.timers.countdown]
            .iter()
            .filter(|t| matches!(t, Some(timer) if timer.is_active()))
            .count();
        page_timers + usize::from(self.chat.is_polling().await)
    }

    /// Reloads the browse grid with the current filters.
    pub async fn load_sessions(&self) -> usize {
        self.browse.load().await
    }

    pub async fn apply_filters(&self, year: &str, module: &str) -> usize {
        {
            let mut doc = self.state.document.write().await;
            doc.set_value("filterYear", year);
            doc.set_value("filterModule", module);
        }
        self.browse.load().await
    }

    /// Visible, non-empty elements of the current page as `(id, markup)`.
    pub async fn page_view(&self) -> Vec<(String, String)> {
        let doc = self.state.document.read().await;
        self.current
            .elements()
            .iter()
            .filter(|id| !doc.is_hidden(id))
            .filter_map(|id| {
                doc.html(id)
                    .filter(|html| !html.trim().is_empty())
                    .map(|html| (id.to_string(), html.to_string()))
            })
            .collect()
    }
}
