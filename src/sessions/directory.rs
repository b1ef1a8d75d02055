use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};
use url::form_urlencoded;

use crate::api::ApiClient;
use crate::error::{AppError, ValidationError};
use crate::models::{NewSession, Session};

/// Browse filters; blank values are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilters {
    pub year: Option<String>,
    pub module: Option<String>,
}

impl SessionFilters {
    pub fn query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [("year", &self.year), ("module", &self.module)] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                query.append_pair(key, value);
            }
        }
        query.finish()
    }
}

/// The create-session form as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionForm {
    pub title: String,
    pub module: String,
    pub year: String,
    pub date: String,
    pub time: String,
    pub duration: String,
    pub max_participants: String,
    pub preferences: Vec<String>,
    pub description: String,
    pub start_now: bool,
}

impl SessionForm {
    /// Checks the schedule and builds the request body. Numbers that do not
    /// parse are sent as `null` for the server to judge.
    pub fn validate(&self) -> Result<NewSession, ValidationError> {
        let date = self.date.trim();
        let time = self.time.trim();
        if !self.start_now && (date.is_empty() || time.is_empty()) {
            return Err(ValidationError::MissingSchedule);
        }

        let (date, time) = if self.start_now {
            (None, None)
        } else {
            (Some(date.to_string()), Some(time.to_string()))
        };

        Ok(NewSession {
            title: self.title.clone(),
            module: self.module.clone(),
            year: self.year.clone(),
            date,
            time,
            duration: self.duration.trim().parse().ok(),
            max_participants: self.max_participants.trim().parse().ok(),
            preferences: self.preferences.join(", "),
            description: self.description.clone(),
            start_now: self.start_now,
        })
    }
}

/// Session endpoints of the backend.
pub struct SessionDirectory {
    api: Arc<ApiClient>,
}

impl SessionDirectory {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Lists sessions; any failure yields an empty list.
    pub async fn list(&self, filters: &SessionFilters) -> Vec<Session> {
        let query = filters.query();
        let path = if query.is_empty() {
            "/sessions".to_string()
        } else {
            format!("/sessions?{}", query)
        };

        self.api.get(&path).await.unwrap_or_else(|e| {
            error!("Error getting sessions: {}", e);
            Vec::new()
        })
    }

    pub async fn get(&self, session_id: &str) -> Result<Session, AppError> {
        self.api.get(&format!("/sessions/{}", session_id)).await
    }

    /// Validates locally, then posts. Nothing is sent when validation fails.
    pub async fn create(&self, form: &SessionForm) -> Result<serde_json::Value, AppError> {
        let payload = form.validate()?;
        let created: serde_json::Value = self.api.post("/sessions", &payload).await?;
        info!("Created session {}", payload.title);
        Ok(created)
    }

    pub async fn my_sessions(&self) -> Vec<Session> {
        self.api.get("/sessions/my-sessions").await.unwrap_or_else(|e| {
            error!("Error getting my sessions: {}", e);
            Vec::new()
        })
    }

    pub async fn joined(&self) -> Vec<Session> {
        self.api.get("/sessions/joined").await.unwrap_or_else(|e| {
            error!("Error getting joined sessions: {}", e);
            Vec::new()
        })
    }

    pub async fn request_join(&self, session_id: &str) -> Result<serde_json::Value, AppError> {
        self.api
            .post(&format!("/sessions/{}/request", session_id), &json!({}))
            .await
    }

    pub async fn accept_request(&self, session_id: &str, user_id: &str) -> Result<serde_json::Value, AppError> {
        self.api
            .post(&format!("/sessions/{}/accept/{}", session_id, user_id), &json!({}))
            .await
    }

    pub async fn decline_request(&self, session_id: &str, user_id: &str) -> Result<serde_json::Value, AppError> {
        self.api
            .post(&format!("/sessions/{}/decline/{}", session_id, user_id), &json!({}))
            .await
    }

    pub async fn kick(&self, session_id: &str, user_id: &str) -> Result<serde_json::Value, AppError> {
        self.api
            .post(&format!("/sessions/{}/kick/{}", session_id, user_id), &json!({}))
            .await
    }

    pub async fn delete(&self, session_id: &str) -> Result<serde_json::Value, AppError> {
        self.api.delete(&format!("/sessions/{}", session_id)).await
    }
}
