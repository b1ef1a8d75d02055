use std::fmt;
use std::str::FromStr;

use chrono::Local;
use tracing::{error, info};

use super::app::App;
use super::router::Page;
use crate::chat::format::escape_html;
use crate::error::AppError;
use crate::models::{Session, User, UserStats};
use crate::sessions::initials;
use crate::sessions::render::{render_grid, render_requests};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTab {
    Created,
    Joined,
    Pending,
    Blocked,
}

impl ProfileTab {
    pub const ALL: [ProfileTab; 4] = [
        ProfileTab::Created,
        ProfileTab::Joined,
        ProfileTab::Pending,
        ProfileTab::Blocked,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProfileTab::Created => "created",
            ProfileTab::Joined => "joined",
            ProfileTab::Pending => "pending",
            ProfileTab::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ProfileTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileTab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileTab::ALL
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| AppError::Internal(format!("unknown profile tab: {}", s)))
    }
}

/// Session lists behind the profile tabs.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileData {
    pub created: Vec<Session>,
    pub joined: Vec<Session>,
    pub blocked: Vec<User>,
}

fn stat_rating(stats: &UserStats) -> String {
    if stats.average_rating > 0.0 {
        format!("{:.1}", stats.average_rating)
    } else {
        "-".to_string()
    }
}

fn render_modules(modules: &[String]) -> String {
    let tags: String = modules
        .iter()
        .map(|m| format!("<span class=\"module-tag\">{}</span>", escape_html(m)))
        .collect();
    format!(
        "{}<button class=\"btn btn-sm btn-outline\" id=\"addModuleBtn\">+ Add Module</button>",
        tags
    )
}

fn render_blocked(users: &[User]) -> String {
    if users.is_empty() {
        return "<p class=\"empty-state\">You haven't blocked anyone</p>".to_string();
    }
    users
        .iter()
        .map(|u| {
            format!(
                "<div class=\"blocked-user\"><div class=\"creator-avatar\">{}</div><span>{}</span><button class=\"btn btn-secondary btn-sm unblock-btn\" data-user-id=\"{}\">Unblock</button></div>",
                escape_html(&initials(u.display_name(), 2)),
                escape_html(u.display_name()),
                escape_html(&u.id)
            )
        })
        .collect()
}

impl App {
    /// Loads profile header, stats and session tabs. A failed profile fetch
    /// falls back to the signed-in user already known to the client.
    pub async fn load_profile(&mut self) {
        let Some(cached) = self.state.auth.current_user().await else {
            return;
        };

        let (user, stats) = futures::join!(self.state.users.me(), self.state.users.my_stats());
        let user = match user {
            Ok(user) => {
                self.state.auth.cache_user(user.clone()).await;
                user
            }
            Err(e) => {
                error!("Error loading profile: {}", e);
                cached
            }
        };
        let stats = stats.unwrap_or_else(|e| {
            error!("Error loading profile stats: {}", e);
            UserStats::default()
        });

        {
            let mut doc = self.state.document.write().await;
            doc.set_text("profileName", user.display_name());
            match user.year.as_deref() {
                Some(year) => doc.set_text("profileYear", &format!("Year {}", year)),
                None => doc.set_text("profileYear", ""),
            }
            doc.set_html(
                "profileAvatar",
                format!("<span>{}</span>", escape_html(&initials(user.display_name(), usize::MAX))),
            );
            doc.set_text("statSessions", &stats.sessions_created.to_string());
            doc.set_text("statJoined", &stats.sessions_joined.to_string());
            doc.set_text("statRating", &stat_rating(&stats));
            doc.set_html("modulesList", render_modules(&user.modules));
        }

        self.load_profile_sessions().await;
        self.show_profile_tab(self.profile_tab).await;
    }

    pub async fn load_profile_sessions(&mut self) {
        let users = &self.state.users;
        let sessions = &self.state.sessions;
        let (created, joined, blocked) = futures::join!(sessions.my_sessions(), sessions.joined(), users.blocked());

        self.profile = ProfileData {
            created,
            joined,
            blocked: blocked.unwrap_or_else(|e| {
                error!("Error loading blocked users: {}", e);
                Vec::new()
            }),
        };
    }

    /// Renders one tab into `profileSessions` and marks it active.
    pub async fn show_profile_tab(&mut self, tab: ProfileTab) {
        self.profile_tab = tab;
        let viewer = self.state.auth.current_user_id().await;
        let policy = self.state.config.session_view.expiry_policy;
        let now = Local::now();

        let html = match tab {
            ProfileTab::Created if self.profile.created.is_empty() => {
                "<p class=\"empty-state\">You haven't created any sessions yet</p>".to_string()
            }
            ProfileTab::Created => render_grid(&self.profile.created, viewer.as_deref(), &now, policy),
            ProfileTab::Joined if self.profile.joined.is_empty() => {
                "<p class=\"empty-state\">You haven't joined any sessions yet</p>".to_string()
            }
            ProfileTab::Joined => render_grid(&self.profile.joined, viewer.as_deref(), &now, policy),
            ProfileTab::Pending => self.render_pending().await,
            ProfileTab::Blocked => render_blocked(&self.profile.blocked),
        };

        let mut doc = self.state.document.write().await;
        doc.deactivate_all("Tab");
        doc.set_active(&format!("{}Tab", tab.name()), true);
        doc.set_html("profileSessions", html);
    }

    async fn render_pending(&self) -> String {
        let with_requests: Vec<&Session> = self
            .profile
            .created
            .iter()
            .filter(|s| !s.join_requests.is_empty())
            .collect();
        if with_requests.is_empty() {
            return "<p class=\"empty-state\">No pending requests</p>".to_string();
        }

        let mut html = String::new();
        for session in with_requests {
            let requesters = self.state.users.requesters(&session.join_requests).await;
            html.push_str(&format!(
                "<div class=\"pending-session\"><h4>{}</h4>{}</div>",
                escape_html(&session.title),
                render_requests(&session.id, session.join_requests.len(), &requesters)
            ));
        }
        html
    }

    pub async fn update_modules(&mut self, modules: Vec<String>) -> bool {
        let modules: Vec<String> = modules
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        match self.state.users.update_modules(&modules).await {
            Ok(_) => {
                info!("Updated modules: {:?}", modules);
                self.toasts.success("Modules updated").await;
                if self.current == Page::Profile {
                    self.load_profile().await;
                }
                true
            }
            Err(e) => {
                error!("Failed to update modules: {}", e);
                self.toasts.error(&e.user_message()).await;
                false
            }
        }
    }
}
