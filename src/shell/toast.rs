use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::document::SharedDocument;
use crate::chat::format::escape_html;
use crate::config::ToastConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl ToastKind {
    fn class(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub kind: ToastKind,
    /// Set once the exit animation has started.
    pub leaving: bool,
}

/// Transient notifications rendered into `toastContainer`.
#[derive(Clone)]
pub struct Toasts {
    entries: Arc<RwLock<Vec<Toast>>>,
    document: SharedDocument,
    ttl: Duration,
    exit: Duration,
}

impl Toasts {
    pub fn new(document: SharedDocument, config: &ToastConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            document,
            ttl: config.ttl(),
            exit: config.exit(),
        }
    }

    /// Shows a toast and schedules its removal.
    pub async fn show(&self, message: &str, kind: ToastKind) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.to_string(),
            kind,
            leaving: false,
        };
        let id = toast.id;
        info!("Toast ({}): {}", kind.class(), message);

        self.entries.write().await.push(toast);
        self.render().await;

        let toasts = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(toasts.ttl).await;
            toasts.mark_leaving(id).await;
            tokio::time::sleep(toasts.exit).await;
            toasts.remove(id).await;
        });
        id
    }

    pub async fn success(&self, message: &str) {
        self.show(message, ToastKind::Success).await;
    }

    pub async fn error(&self, message: &str) {
        self.show(message, ToastKind::Error).await;
    }

    pub async fn info(&self, message: &str) {
        self.show(message, ToastKind::Info).await;
    }

    pub async fn messages(&self) -> Vec<String> {
        self.entries.read().await.iter().map(|t| t.message.clone()).collect()
    }

    pub async fn last(&self) -> Option<Toast> {
        self.entries.read().await.last().cloned()
    }

    async fn mark_leaving(&self, id: Uuid) {
        if let Some(toast) = self.entries.write().await.iter_mut().find(|t| t.id == id) {
            toast.leaving = true;
        }
        self.render().await;
    }

    async fn remove(&self, id: Uuid) {
        self.entries.write().await.retain(|t| t.id != id);
        debug!("Toast {} dismissed", id);
        self.render().await;
    }

    async fn render(&self) {
        let html: String = self
            .entries
            .read()
            .await
            .iter()
            .map(|t| {
                format!(
                    "<div class=\"toast {}{}\"><span>{}</span></div>",
                    t.kind.class(),
                    if t.leaving { " leaving" } else { "" },
                    escape_html(&t.message)
                )
            })
            .collect();
        self.document.write().await.set_html("toastContainer", html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Document;

    #[tokio::test(start_paused = true)]
    async fn test_toast_lifecycle() {
        let doc = Document::shared();
        let toasts = Toasts::new(doc.clone(), &ToastConfig { ttl_ms: 4000, exit_ms: 300 });

        toasts.error("Failed to <load>").await;
        assert!(doc.read().await.html("toastContainer").unwrap().contains("toast error"));
        assert!(doc.read().await.html("toastContainer").unwrap().contains("Failed to &lt;load&gt;"));

        tokio::time::sleep(Duration::from_millis(4100)).await;
        assert!(toasts.last().await.unwrap().leaving);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(toasts.messages().await.is_empty());
        assert_eq!(doc.read().await.html("toastContainer"), Some(""));
    }
}
