use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use tracing::error;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{BlockStatus, MyRating, RatingStats, User, UserStats};

/// A user asking to join a session, with their rating aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub user: User,
    pub rating: RatingStats,
}

/// Everything the user-profile modal shows about another user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub rating: RatingStats,
    pub my_rating: MyRating,
    pub block: BlockStatus,
}

pub struct UserDirectory {
    api: Arc<ApiClient>,
}

impl UserDirectory {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn me(&self) -> Result<User, AppError> {
        self.api.get("/users/me").await
    }

    pub async fn my_stats(&self) -> Result<UserStats, AppError> {
        self.api.get("/users/me/stats").await
    }

    /// Replaces the signed-in user's modules. The body is a bare JSON array.
    pub async fn update_modules(&self, modules: &[String]) -> Result<serde_json::Value, AppError> {
        self.api.put("/users/me/modules", &modules).await
    }

    pub async fn get(&self, user_id: &str) -> Result<User, AppError> {
        self.api.get(&format!("/users/{}", user_id)).await
    }

    pub async fn rating(&self, user_id: &str) -> Result<RatingStats, AppError> {
        self.api.get(&format!("/users/{}/rating", user_id)).await
    }

    pub async fn my_rating(&self, user_id: &str) -> Result<MyRating, AppError> {
        self.api.get(&format!("/users/{}/my-rating", user_id)).await
    }

    pub async fn block_status(&self, user_id: &str) -> Result<BlockStatus, AppError> {
        self.api.get(&format!("/users/{}/block-status", user_id)).await
    }

    pub async fn rate(&self, user_id: &str, score: u8) -> Result<serde_json::Value, AppError> {
        self.api
            .post(&format!("/users/{}/rate", user_id), &json!({ "score": score }))
            .await
    }

    pub async fn block(&self, user_id: &str) -> Result<serde_json::Value, AppError> {
        self.api.post(&format!("/users/{}/block", user_id), &json!({})).await
    }

    pub async fn unblock(&self, user_id: &str) -> Result<serde_json::Value, AppError> {
        self.api.delete(&format!("/users/{}/block", user_id)).await
    }

    pub async fn blocked(&self) -> Result<Vec<User>, AppError> {
        self.api.get("/users/blocked/details").await
    }

    /// Profile, rating, own rating and block status, fetched together.
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let (user, rating, my_rating, block) = futures::join!(
            self.get(user_id),
            self.rating(user_id),
            self.my_rating(user_id),
            self.block_status(user_id),
        );
        Ok(UserProfile {
            user: user?,
            rating: rating?,
            my_rating: my_rating.unwrap_or_default(),
            block: block.unwrap_or_default(),
        })
    }

    /// Requesters with their ratings. Users that fail to load are skipped.
    pub async fn requesters(&self, user_ids: &[String]) -> Vec<Requester> {
        let lookups = user_ids.iter().map(|id| async move {
            match futures::join!(self.get(id), self.rating(id)) {
                (Ok(user), Ok(rating)) => Some(Requester { user, rating }),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to fetch user {}: {}", id, e);
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Participants in the given order; unknown ids become "Unknown User".
    pub async fn participants(&self, user_ids: &[String]) -> Vec<User> {
        let lookups = user_ids.iter().map(|id| async move {
            match self.get(id).await {
                Ok(user) => User { id: id.clone(), ..user },
                Err(_) => User {
                    id: id.clone(),
                    name: Some("Unknown User".to_string()),
                    ..Default::default()
                },
            }
        });
        join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryTokenStore;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer) -> UserDirectory {
        let api = ApiClient::new(&format!("{}/api", server.uri()), Arc::new(MemoryTokenStore::with_token("t"))).unwrap();
        UserDirectory::new(Arc::new(api))
    }

    #[tokio::test]
    async fn test_update_modules_sends_bare_array() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/users/me/modules"))
            .and(body_json(json!(["CS2010", "MA1001"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Modules updated"})))
            .expect(1)
            .mount(&server)
            .await;

        let modules = vec!["CS2010".to_string(), "MA1001".to_string()];
        let reply = directory(&server).update_modules(&modules).await.unwrap();
        assert_eq!(reply["message"], "Modules updated");
    }

    #[tokio::test]
    async fn test_requesters_skip_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1", "name": "Ada", "year": "2"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/u1/rating"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"averageRating": 4.5, "ratingCount": 2})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/u2"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "User not found"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/u2/rating"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"averageRating": 0.0, "ratingCount": 0})))
            .mount(&server)
            .await;

        let requesters = directory(&server)
            .requesters(&["u1".to_string(), "u2".to_string()])
            .await;
        assert_eq!(requesters.len(), 1);
        assert_eq!(requesters[0].user.display_name(), "Ada");
        assert_eq!(requesters[0].rating.rating_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_participant() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Ada"})))
            .mount(&server)
            .await;

        let users = directory(&server)
            .participants(&["u1".to_string(), "ghost".to_string()])
            .await;
        assert_eq!(users[0].id, "u1");
        assert_eq!(users[1].display_name(), "Unknown User");
    }

    #[tokio::test]
    async fn test_rate_sends_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/u3/rate"))
            .and(body_json(json!({"score": 4})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        directory(&server).rate("u3", 4).await.unwrap();
    }
}
