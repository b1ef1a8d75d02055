use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub storage_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub poll_interval_ms: u64,
    pub max_backoff_ms: u64,
}

impl ChatConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms.max(self.poll_interval_ms))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowseConfig {
    pub refresh_interval_secs: u64,
}

impl BrowseConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// What the session view shows once a session's nominal end has passed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryPolicy {
    /// Keep showing "In progress".
    Countdown,
    /// Show "Expired" and leave the session view.
    Expire,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionViewConfig {
    pub countdown_interval_ms: u64,
    pub expiry_policy: ExpiryPolicy,
    pub expired_redirect_delay_ms: u64,
}

impl SessionViewConfig {
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    pub fn expired_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.expired_redirect_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToastConfig {
    pub ttl_ms: u64,
    pub exit_ms: u64,
}

impl ToastConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn exit(&self) -> Duration {
        Duration::from_millis(self.exit_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub api: ApiConfig,
    pub identity: IdentityConfig,
    pub chat: ChatConfig,
    pub browse: BrowseConfig,
    pub session_view: SessionViewConfig,
    pub toast: ToastConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::with_defaults(Config::builder(), "development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in settings from environment variables (with prefix "APP_")
            // E.g., `APP_API__BASE_URL=https://example.org/api` would set `Settings.api.base_url`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Defaults only, with fast timers so tests do not wait on production intervals.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder(), "test")?
            .set_override("api.storage_path", "target/test-storage.json")?
            .set_override("chat.poll_interval_ms", 50)?
            .set_override("chat.max_backoff_ms", 400)?
            .set_override("browse.refresh_interval_secs", 1)?
            .set_override("session_view.countdown_interval_ms", 50)?
            .set_override("session_view.expired_redirect_delay_ms", 50)?
            .set_override("toast.ttl_ms", 100)?
            .set_override("toast.exit_ms", 20)?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.storage_path", ".studybuddy/storage.json")?
            .set_default("identity.endpoint", "https://identitytoolkit.googleapis.com")?
            .set_default("identity.api_key", "")?
            .set_default("chat.poll_interval_ms", 3000)?
            .set_default("chat.max_backoff_ms", 30000)?
            .set_default("browse.refresh_interval_secs", 30)?
            .set_default("session_view.countdown_interval_ms", 1000)?
            .set_default("session_view.expiry_policy", "countdown")?
            .set_default("session_view.expired_redirect_delay_ms", 2000)?
            .set_default("toast.ttl_ms", 4000)?
            .set_default("toast.exit_ms", 300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn cleanup_env() {
        env::remove_var("APP_API__BASE_URL");
        env::remove_var("APP_CHAT__POLL_INTERVAL_MS");
        env::remove_var("APP_SESSION_VIEW__EXPIRY_POLICY");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::new_for_test().expect("Failed to load settings");
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.api.base_url, "http://localhost:8080/api");
        assert_eq!(settings.session_view.expiry_policy, ExpiryPolicy::Countdown);
        assert_eq!(settings.chat.poll_interval(), Duration::from_millis(50));
        assert_eq!(settings.browse.refresh_interval(), Duration::from_secs(1));
        assert_eq!(settings.toast.ttl(), Duration::from_millis(100));
    }

    #[test]
    fn test_production_intervals() {
        let settings: Settings = Settings::with_defaults(Config::builder(), "development")
            .expect("Failed to set defaults")
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize settings");

        assert_eq!(settings.chat.poll_interval(), Duration::from_secs(3));
        assert_eq!(settings.browse.refresh_interval(), Duration::from_secs(30));
        assert_eq!(settings.toast.ttl(), Duration::from_secs(4));
        assert_eq!(settings.session_view.countdown_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_environment_override() {
        cleanup_env();

        env::set_var("APP_API__BASE_URL", "https://buddy.example.org/api");
        env::set_var("APP_CHAT__POLL_INTERVAL_MS", "1500");
        env::set_var("APP_SESSION_VIEW__EXPIRY_POLICY", "expire");

        let settings: Settings = Settings::with_defaults(Config::builder(), "test")
            .expect("Failed to set defaults")
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize settings");

        assert_eq!(settings.api.base_url, "https://buddy.example.org/api");
        assert_eq!(settings.chat.poll_interval_ms, 1500);
        assert_eq!(settings.session_view.expiry_policy, ExpiryPolicy::Expire);

        cleanup_env();
    }

    #[test]
    fn test_backoff_never_below_poll_interval() {
        let chat = ChatConfig {
            poll_interval_ms: 3000,
            max_backoff_ms: 1000,
        };
        assert_eq!(chat.max_backoff(), Duration::from_secs(3));
    }
}
