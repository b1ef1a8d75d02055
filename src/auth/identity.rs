use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::config::IdentityConfig;

/// Tokens handed back by the identity provider after a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub id_token: String,
    pub uid: String,
}

/// Failure reported by the identity provider, before translation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    /// Splits a provider message such as `WEAK_PASSWORD : Password should be at
    /// least 6 characters` into its code and the raw text.
    pub fn from_message(message: &str) -> Self {
        let code = message.split(" : ").next().unwrap_or(message).trim();
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// User-facing text for this failure.
    pub fn translate(&self) -> String {
        match self.code.as_str() {
            "EMAIL_EXISTS" => "This email is already registered".to_string(),
            "INVALID_EMAIL" => "Invalid email address".to_string(),
            "WEAK_PASSWORD" => "Password is too weak".to_string(),
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                "Invalid email or password".to_string()
            }
            "USER_DISABLED" => "This account has been disabled".to_string(),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Third-party password sign-in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, ProviderError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Credential, ProviderError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id_token: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Identity-toolkit REST client (`/v1/accounts:*`).
pub struct FirebaseIdentity {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FirebaseIdentity {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn call(&self, action: &str, email: &str, password: &str) -> Result<Credential, ProviderError> {
        let url = format!("{}/v1/accounts:{}", self.endpoint, action);
        debug!("Identity provider call: {}", action);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| {
                error!("Identity provider unreachable: {}", e);
                ProviderError {
                    code: "NETWORK_REQUEST_FAILED".to_string(),
                    message: "Network error, please try again".to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Identity provider response for {} unreadable: {}", action, e);
            unreadable_body(e)
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Identity provider returned {}", status));
            error!("Identity provider rejected {}: {}", action, message);
            return Err(ProviderError::from_message(&message));
        }

        let account: AccountResponse = serde_json::from_str(&body).map_err(|e| ProviderError {
            code: "INVALID_RESPONSE".to_string(),
            message: e.to_string(),
        })?;

        Ok(Credential {
            id_token: account.id_token,
            uid: account.local_id,
        })
    }
}

fn unreadable_body(err: impl std::fmt::Display) -> ProviderError {
    ProviderError {
        code: "INVALID_RESPONSE".to_string(),
        message: format!("Could not read identity provider response: {}", err),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, ProviderError> {
        self.call("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credential, ProviderError> {
        self.call("signUp", email, password).await
    }
}

/// Request body for `POST /auth/login`.
pub(crate) fn login_body(email: &str, password: &str) -> serde_json::Value {
    json!({ "email": email, "password": password })
}

/// Request body for `POST /auth/signup`.
pub(crate) fn signup_body(name: &str, email: &str, password: &str, year: &str) -> serde_json::Value {
    json!({ "name": name, "email": email, "password": password, "year": year })
}
