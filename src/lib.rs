pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod sessions;
pub mod shell;
pub mod users;

use std::sync::Arc;

use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use api::{ApiClient, FileTokenStore, MemoryTokenStore, TokenStore};
pub use auth::{AuthService, AuthState, FirebaseIdentity, IdentityProvider};
pub use sessions::SessionDirectory;
pub use shell::{App, Document, Page, SharedDocument, ShellCommand};
pub use users::UserDirectory;

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthService>,
    pub sessions: Arc<SessionDirectory>,
    pub users: Arc<UserDirectory>,
    pub document: SharedDocument,
}

impl AppState {
    /// Wires the components around one API client and one view document.
    /// The identity provider is only used when an API key is configured.
    pub fn new(config: Settings, store: Arc<dyn TokenStore>) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api.base_url, store)?);
        let document = Document::shared();

        let identity: Option<Arc<dyn IdentityProvider>> = if config.identity.api_key.trim().is_empty() {
            info!("No identity provider key configured, using backend login only");
            None
        } else {
            Some(Arc::new(FirebaseIdentity::new(&config.identity)))
        };

        let auth = Arc::new(AuthService::new(api.clone(), identity, document.clone()));

        Ok(Self {
            sessions: Arc::new(SessionDirectory::new(api.clone())),
            users: Arc::new(UserDirectory::new(api.clone())),
            config: Arc::new(config),
            api,
            auth,
            document,
        })
    }
}
