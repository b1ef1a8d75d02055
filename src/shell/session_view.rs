use std::ops::ControlFlow;

use chrono::Local;
use tracing::{error, info, warn};

use super::app::{App, ShellCommand};
use super::profile::ProfileTab;
use super::router::Page;
use super::timers::TimerHandle;
use crate::chat::format::escape_html;
use crate::chat::SendOutcome;
use crate::config::ExpiryPolicy;
use crate::error::AppError;
use crate::models::Session;
use crate::sessions::render::{
    clock_time, duration_label, long_date, preference_tags, render_join_lock, render_participants, render_requests,
    render_scheduled_lock,
};
use crate::sessions::timing::{self, EXPIRED};
use crate::users::{render_user_modal, ModalContext};

pub const SESSION_ENDED: &str = "Session ended";

impl App {
    /// Loads a session into the detail view and wires its chat.
    pub async fn view_session(&mut self, session_id: &str) -> Result<Session, AppError> {
        let session = match self.state.sessions.get(session_id).await {
            Ok(session) => session,
            Err(e) => {
                error!("Error viewing session {}: {}", session_id, e);
                self.toasts.error("Failed to load session details").await;
                return Err(e);
            }
        };

        // Navigation cancels the previous countdown, so it goes first.
        if self.current != Page::SessionView {
            self.navigate(Page::SessionView).await;
        } else if let Some(countdown) = self.timers.countdown.take() {
            countdown.cancel();
        }

        let viewer = self.state.auth.current_user_id().await;
        let now = Local::now();
        {
            let mut doc = self.state.document.write().await;
            doc.set_text("viewSessionTitle", &session.title);
            doc.set_text("viewSessionModule", &session.module);
            doc.set_text(
                "viewSessionDateTime",
                &format!("{} at {}", long_date(&session, &now), clock_time(&session)),
            );
            if !session.is_live {
                doc.set_text("viewSessionDuration", &duration_label(&session));
            }
            doc.set_text(
                "viewSessionParticipants",
                &format!(
                    "{}/{}",
                    session.participant_total(),
                    session.max_participants.unwrap_or(0)
                ),
            );
            doc.set_text("viewSessionHost", session.creator_name.as_deref().unwrap_or(""));

            if session.is_live {
                doc.set_text("viewSessionLive", "LIVE");
                doc.set_class("viewSessionLive", "live-badge");
                doc.show("viewSessionLive");
            } else if session.is_scheduled {
                doc.set_text("viewSessionLive", "SCHEDULED");
                doc.set_class("viewSessionLive", "scheduled-badge");
                doc.show("viewSessionLive");
            } else {
                doc.hide("viewSessionLive");
            }

            match session.description.as_deref().filter(|d| !d.trim().is_empty()) {
                Some(description) => {
                    doc.set_html("viewSessionDescription", format!("<p>{}</p>", escape_html(description)))
                }
                None => doc.set_html("viewSessionDescription", ""),
            }
            doc.set_html("viewSessionPreferences", preference_tags(&session.preferences));
        }

        if session.is_live {
            self.start_countdown(&session);
        }

        let is_creator = viewer.as_deref().is_some_and(|id| session.is_creator(id));
        let is_participant = viewer.as_deref().is_some_and(|id| session.is_participant(id));

        if is_creator && !session.join_requests.is_empty() {
            let requesters = self.state.users.requesters(&session.join_requests).await;
            let mut doc = self.state.document.write().await;
            doc.set_html(
                "pendingRequestsList",
                render_requests(&session.id, session.join_requests.len(), &requesters),
            );
            doc.show("pendingRequestsSection");
        } else {
            let mut doc = self.state.document.write().await;
            doc.set_html("pendingRequestsList", "");
            doc.hide("pendingRequestsSection");
        }

        if session.is_scheduled && !session.is_live {
            self.chat.close().await;
            let mut doc = self.state.document.write().await;
            doc.set_html("chatLocked", render_scheduled_lock(session.scheduled_start_time));
            doc.show("chatLocked");
            doc.hide("chatRoom");
        } else if is_creator || is_participant {
            {
                let mut doc = self.state.document.write().await;
                doc.set_html("chatLocked", "");
                doc.hide("chatLocked");
                doc.show("chatRoom");
            }
            if self.chat.session_id().await.as_deref() != Some(session.id.as_str()) {
                self.chat.open(&session.id).await;
            }
            let participants = self.state.users.participants(&session.participants).await;
            let mut doc = self.state.document.write().await;
            doc.set_html("participantsList", render_participants(&participants, viewer.as_deref()));
            doc.set_text("participantCount", &participants.len().to_string());
        } else {
            self.chat.close().await;
            let mut doc = self.state.document.write().await;
            doc.set_html("chatLocked", render_join_lock());
            doc.show("chatLocked");
            doc.hide("chatRoom");
        }

        info!("Viewing session {}", session.id);
        self.viewing = Some(session.clone());
        Ok(session)
    }

    /// Ticks the live countdown in `viewSessionDuration`. Under the expire
    /// policy the view is left once the session is over.
    fn start_countdown(&mut self, session: &Session) {
        let session = session.clone();
        let document = self.state.document.clone();
        let toasts = self.toasts.clone();
        let commands = self.commands.clone();
        let policy = self.state.config.session_view.expiry_policy;
        let redirect_delay = self.state.config.session_view.expired_redirect_delay();

        let handle = TimerHandle::every_now(
            "session countdown",
            self.state.config.session_view.countdown_interval(),
            move || {
                let session = session.clone();
                let document = document.clone();
                let toasts = toasts.clone();
                let commands = commands.clone();
                async move {
                    let now = Local::now().naive_local();
                    let remaining = timing::time_remaining(&session, now, policy);

                    if policy == ExpiryPolicy::Expire && remaining.as_deref() == Some(EXPIRED) {
                        document.write().await.set_text("viewSessionDuration", SESSION_ENDED);
                        tokio::time::sleep(redirect_delay).await;
                        toasts.info("Session has ended").await;
                        if commands.send(ShellCommand::Navigate(Page::Browse)).is_err() {
                            warn!("Shell closed before session end redirect");
                        }
                        return ControlFlow::Break(());
                    }

                    let text = remaining.unwrap_or_else(|| duration_label(&session));
                    document.write().await.set_text("viewSessionDuration", &text);
                    ControlFlow::Continue(())
                }
            },
        );
        self.timers.countdown = Some(handle);
    }

    /// Re-fetches the session on screen, if any.
    async fn reload_viewing(&mut self) {
        let Some(id) = self.viewing.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        if let Err(e) = self.view_session(&id).await {
            error!("Failed to reload session {}: {}", id, e);
        }
    }

    pub async fn open_user_modal(&mut self, user_id: &str) -> bool {
        let profile = match self.state.users.profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                error!("Error loading user profile {}: {}", user_id, e);
                self.toasts.error("Failed to load user profile").await;
                return false;
            }
        };

        let viewer = self.state.auth.current_user_id().await;
        let ctx = match &self.viewing {
            Some(session) => ModalContext {
                session_id: Some(session.id.clone()),
                can_kick: viewer.as_deref().is_some_and(|id| session.is_creator(id))
                    && session.is_participant(user_id)
                    && viewer.as_deref() != Some(user_id),
            },
            None => ModalContext::default(),
        };

        let mut doc = self.state.document.write().await;
        doc.set_html("userModalContent", render_user_modal(&profile, &ctx));
        doc.show("userModal");
        self.modal_user = Some(user_id.to_string());
        true
    }

    pub async fn close_user_modal(&mut self) {
        self.modal_user = None;
        let mut doc = self.state.document.write().await;
        doc.hide("userModal");
        doc.set_html("userModalContent", "");
    }

    /// Refreshes whichever view shows `user_id`'s relationship to the viewer.
    async fn refresh_user(&mut self, user_id: &str) {
        if self.modal_user.as_deref() == Some(user_id) {
            self.open_user_modal(user_id).await;
        }
        if self.current == Page::Profile {
            self.load_profile_sessions().await;
            self.show_profile_tab(self.profile_tab).await;
        }
    }

    pub async fn rate_user(&mut self, user_id: &str, score: u8) -> bool {
        if !(1..=5).contains(&score) {
            self.toasts.error("Rating must be between 1 and 5").await;
            return false;
        }
        match self.state.users.rate(user_id, score).await {
            Ok(_) => {
                self.toasts.success("Rating submitted").await;
                self.refresh_user(user_id).await;
                true
            }
            Err(e) => {
                error!("Rating user {} failed: {}", user_id, e);
                self.toasts.error(&e.user_message()).await;
                false
            }
        }
    }

    pub async fn block_user(&mut self, user_id: &str) -> bool {
        match self.state.users.block(user_id).await {
            Ok(_) => {
                self.toasts.info("User blocked").await;
                self.refresh_user(user_id).await;
                true
            }
            Err(e) => {
                error!("Blocking user {} failed: {}", user_id, e);
                self.toasts.error(&e.user_message()).await;
                false
            }
        }
    }

    pub async fn unblock_user(&mut self, user_id: &str) -> bool {
        match self.state.users.unblock(user_id).await {
            Ok(_) => {
                self.toasts.info("User unblocked").await;
                self.refresh_user(user_id).await;
                true
            }
            Err(e) => {
                error!("Unblocking user {} failed: {}", user_id, e);
                self.toasts.error(&e.user_message()).await;
                false
            }
        }
    }

    pub async fn kick_participant(&mut self, session_id: &str, user_id: &str) -> bool {
        match self.state.sessions.kick(session_id, user_id).await {
            Ok(_) => {
                self.toasts.info("Participant removed").await;
                if self.modal_user.as_deref() == Some(user_id) {
                    self.close_user_modal().await;
                }
                self.reload_viewing().await;
                true
            }
            Err(e) => {
                error!("Removing {} from session {} failed: {}", user_id, session_id, e);
                self.toasts.error("Failed to remove participant").await;
                false
            }
        }
    }

    pub async fn delete_session(&mut self, session_id: &str) -> bool {
        match self.state.sessions.delete(session_id).await {
            Ok(_) => {
                self.toasts.success("Session deleted").await;
                match self.current {
                    Page::Profile => {
                        self.load_profile_sessions().await;
                        self.show_profile_tab(ProfileTab::Created).await;
                    }
                    Page::SessionView => self.navigate(Page::Browse).await,
                    Page::Browse => {
                        self.load_sessions().await;
                    }
                    _ => {}
                }
                true
            }
            Err(e) => {
                error!("Deleting session {} failed: {}", session_id, e);
                self.toasts.error("Failed to delete session").await;
                false
            }
        }
    }

    pub async fn send_chat(&mut self, text: &str) -> Option<SendOutcome> {
        match self.chat.send(text).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Error sending message: {}", e);
                self.toasts.error("Failed to send message").await;
                None
            }
        }
    }

    pub async fn send_code(&mut self, code: &str, lang: &str) -> Option<SendOutcome> {
        match self.chat.send_code_block(code, lang).await {
            Ok(outcome) => Some(outcome),
            Err(AppError::Validation(e)) => {
                self.toasts.error(&e.to_string()).await;
                None
            }
            Err(e) => {
                error!("Error sending code block: {}", e);
                self.toasts.error("Failed to send message").await;
                None
            }
        }
    }
}
