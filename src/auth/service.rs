use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::identity::{login_body, signup_body, IdentityProvider};
use crate::api::ApiClient;
use crate::error::{AppError, AuthError};
use crate::models::{AuthResponse, User};
use crate::shell::SharedDocument;

/// Claims the client cares about in a stored bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(User),
}

/// Tracks who is signed in and keeps the stored token and header UI in step.
pub struct AuthService {
    api: Arc<ApiClient>,
    identity: Option<Arc<dyn IdentityProvider>>,
    document: SharedDocument,
    state: RwLock<AuthState>,
}

impl AuthService {
    pub fn new(
        api: Arc<ApiClient>,
        identity: Option<Arc<dyn IdentityProvider>>,
        document: SharedDocument,
    ) -> Self {
        Self {
            api,
            identity,
            document,
            state: RwLock::new(AuthState::Anonymous),
        }
    }

    /// Re-establishes a session from a stored token at startup.
    ///
    /// A token whose `exp` has passed is dropped without contacting the
    /// server; anything else is checked against `GET /users/me`.
    pub async fn restore(&self) -> bool {
        let Some(token) = self.api.token() else {
            self.set_state(AuthState::Anonymous).await;
            return false;
        };

        if token_expired(&token) {
            info!("Stored token has expired, discarding it");
            self.discard_token();
            self.set_state(AuthState::Anonymous).await;
            return false;
        }

        match self.api.get::<User>("/users/me").await {
            Ok(user) => {
                info!("Restored session for user {}", user.id);
                self.set_state(AuthState::Authenticated(user)).await;
                true
            }
            Err(e) => {
                warn!("Stored token rejected: {}", e);
                self.discard_token();
                self.set_state(AuthState::Anonymous).await;
                false
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let provider_token = match &self.identity {
            Some(identity) => {
                let credential = identity
                    .sign_in(email, password)
                    .await
                    .map_err(|e| AuthError::Provider(e.translate()))?;
                self.api.set_token(&credential.id_token)?;
                true
            }
            None => false,
        };

        let response = self
            .api
            .post::<AuthResponse, _>("/auth/login", &login_body(email, password))
            .await;
        self.complete(response, provider_token).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str, year: &str) -> Result<User, AppError> {
        let provider_token = match &self.identity {
            Some(identity) => {
                let credential = identity
                    .sign_up(email, password)
                    .await
                    .map_err(|e| AuthError::Provider(e.translate()))?;
                self.api.set_token(&credential.id_token)?;
                true
            }
            None => false,
        };

        let response = self
            .api
            .post::<AuthResponse, _>("/auth/signup", &signup_body(name, email, password, year))
            .await;
        self.complete(response, provider_token).await
    }

    async fn complete(
        &self,
        response: Result<AuthResponse, AppError>,
        provider_token: bool,
    ) -> Result<User, AppError> {
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                error!("Authentication failed: {}", e);
                if provider_token {
                    self.discard_token();
                }
                return Err(e);
            }
        };

        match response.token.as_deref() {
            Some(token) => self.api.set_token(token)?,
            None if !provider_token => {
                error!("Backend issued no token for user {}", response.user_id);
                return Err(AuthError::InvalidToken.into());
            }
            None => {}
        }

        let user = User::from(response);
        info!("User {} signed in", user.id);
        self.set_state(AuthState::Authenticated(user.clone())).await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.api.remove_token()?;
        self.set_state(AuthState::Anonymous).await;
        info!("User signed out");
        Ok(())
    }

    /// Replaces the cached user after a fresh profile fetch.
    pub async fn cache_user(&self, user: User) {
        if self.is_logged_in().await {
            self.set_state(AuthState::Authenticated(user)).await;
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        match &*self.state.read().await {
            AuthState::Authenticated(user) => Some(user.clone()),
            AuthState::Anonymous => None,
        }
    }

    pub async fn current_user_id(&self) -> Option<String> {
        self.current_user().await.map(|u| u.id)
    }

    pub async fn is_logged_in(&self) -> bool {
        matches!(*self.state.read().await, AuthState::Authenticated(_))
    }

    pub fn token(&self) -> Option<String> {
        self.api.token()
    }

    fn discard_token(&self) {
        if let Err(e) = self.api.remove_token() {
            error!("Failed to clear stored token: {}", e);
        }
    }

    async fn set_state(&self, state: AuthState) {
        self.update_ui(&state).await;
        *self.state.write().await = state;
    }

    async fn update_ui(&self, state: &AuthState) {
        let mut doc = self.document.write().await;
        match state {
            AuthState::Authenticated(user) => {
                doc.hide("authLinks");
                doc.show("userMenu");
                doc.set_text("userName", user.display_name());
            }
            AuthState::Anonymous => {
                doc.show("authLinks");
                doc.hide("userMenu");
            }
        }
    }
}

/// True only when the token decodes as a JWT whose `exp` is in the past.
/// The signature is not checked; the server stays the authority.
pub fn token_expired(token: &str) -> bool {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.leeway = 0;

    match decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp < Utc::now().timestamp(),
        Err(e) => matches!(e.kind(), ErrorKind::ExpiredSignature),
    }
}
