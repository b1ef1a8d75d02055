use tracing::error;

use super::app::App;
use super::profile::ProfileTab;
use super::router::Page;
use crate::error::{AppError, ValidationError};
use crate::sessions::SessionForm;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub year: String,
    pub password: String,
    pub confirm: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.password != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

impl App {
    async fn set_inline_error(&self, id: &str, message: &str) {
        self.state.document.write().await.set_text(id, message);
    }

    pub async fn submit_login(&mut self, form: &LoginForm) -> bool {
        self.set_inline_error("loginError", "").await;
        match self.state.auth.login(&form.email, &form.password).await {
            Ok(_) => {
                self.toasts.success("Welcome back!").await;
                self.navigate(Page::Browse).await;
                true
            }
            Err(e) => {
                self.set_inline_error("loginError", &e.user_message()).await;
                false
            }
        }
    }

    pub async fn submit_signup(&mut self, form: &SignupForm) -> bool {
        if let Err(e) = form.validate() {
            self.set_inline_error("signupError", &e.to_string()).await;
            return false;
        }

        self.set_inline_error("signupError", "").await;
        match self
            .state
            .auth
            .signup(&form.name, &form.email, &form.password, &form.year)
            .await
        {
            Ok(_) => {
                self.toasts.success("Account created successfully!").await;
                self.navigate(Page::Browse).await;
                true
            }
            Err(e) => {
                self.set_inline_error("signupError", &e.user_message()).await;
                false
            }
        }
    }

    pub async fn logout(&mut self) {
        if let Err(e) = self.state.auth.logout().await {
            error!("Logout failed: {}", e);
        }
        self.toasts.info("Logged out successfully").await;
        self.navigate(Page::Home).await;
    }

    /// Missing date/time is reported inline without contacting the server.
    pub async fn submit_create_session(&mut self, form: &SessionForm) -> bool {
        match self.state.sessions.create(form).await {
            Ok(_) => {
                self.set_inline_error("createError", "").await;
                self.toasts.success("Session created successfully!").await;
                self.navigate(Page::Browse).await;
                true
            }
            Err(AppError::Validation(e)) => {
                self.set_inline_error("createError", &e.to_string()).await;
                false
            }
            Err(e) => {
                self.set_inline_error("createError", &e.user_message()).await;
                self.toasts.error("Failed to create session").await;
                false
            }
        }
    }

    pub async fn join_session(&mut self, session_id: &str) -> bool {
        if !self.state.auth.is_logged_in().await {
            self.toasts.error("Please login to join a session").await;
            self.navigate(Page::Login).await;
            return false;
        }

        match self.state.sessions.request_join(session_id).await {
            Ok(_) => {
                self.toasts
                    .success("Join request sent! Waiting for host approval.")
                    .await;
                self.load_sessions().await;
                true
            }
            Err(e) => {
                self.toasts.error(&e.user_message()).await;
                false
            }
        }
    }

    pub async fn accept_request(&mut self, session_id: &str, user_id: &str) -> bool {
        match self.state.sessions.accept_request(session_id, user_id).await {
            Ok(_) => {
                self.toasts.success("Request accepted!").await;
                self.refresh_after_request(session_id).await;
                true
            }
            Err(e) => {
                error!("Accept request failed: {}", e);
                self.toasts.error("Failed to accept request").await;
                false
            }
        }
    }

    pub async fn decline_request(&mut self, session_id: &str, user_id: &str) -> bool {
        match self.state.sessions.decline_request(session_id, user_id).await {
            Ok(_) => {
                self.toasts.info("Request declined").await;
                self.refresh_after_request(session_id).await;
                true
            }
            Err(e) => {
                error!("Decline request failed: {}", e);
                self.toasts.error("Failed to decline request").await;
                false
            }
        }
    }

    async fn refresh_after_request(&mut self, session_id: &str) {
        if self.current == Page::Profile {
            self.load_profile_sessions().await;
            self.show_profile_tab(ProfileTab::Pending).await;
        } else if let Err(e) = self.view_session(session_id).await {
            error!("Failed to reload session {}: {}", session_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_confirmation() {
        let form = SignupForm {
            password: "secret1".into(),
            confirm: "secret2".into(),
            ..Default::default()
        };
        assert_eq!(form.validate(), Err(ValidationError::PasswordMismatch));

        let form = SignupForm {
            password: "secret1".into(),
            confirm: "secret1".into(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }
}
