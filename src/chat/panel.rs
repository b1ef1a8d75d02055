use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::format::{fence, render_messages};
use super::poller;
use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::ChatConfig;
use crate::error::{AppError, ValidationError};
use crate::models::ChatMessage;
use crate::shell::{SharedDocument, TimerHandle};

pub const CONNECTED: &str = "Connected";
pub const CONNECTION_ERROR: &str = "Connection error";
const CODE_COMMAND: &str = "/code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Loading,
    Polling,
    Closed,
}

/// Messages for one session plus the `since` cursor.
///
/// Applying a batch is idempotent: nothing older than the cursor is added,
/// a message id already buffered is skipped and the cursor never moves back.
#[derive(Debug, Default, Clone)]
pub struct MessageBuffer {
    messages: Vec<ChatMessage>,
    cursor: i64,
}

impl MessageBuffer {
    pub fn apply(&mut self, batch: Vec<ChatMessage>) -> usize {
        let mut added = 0;
        for msg in batch {
            if msg.timestamp < self.cursor || self.contains(&msg) {
                continue;
            }
            self.cursor = self.cursor.max(msg.timestamp);
            self.messages.push(msg);
            added += 1;
        }
        added
    }

    fn contains(&self, msg: &ChatMessage) -> bool {
        match &msg.id {
            Some(id) => self.messages.iter().any(|m| m.id.as_ref() == Some(id)),
            None => self.messages.iter().any(|m| m == msg),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Blank input; nothing happened.
    Empty,
    /// `/code` was typed and the code editor is now showing.
    EditorOpened,
    NoSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    Received(usize),
    Failed,
    /// The panel moved to another subscription while the request was out.
    Stale,
}

struct ChatState {
    phase: ChatPhase,
    session_id: Option<String>,
    buffer: MessageBuffer,
    /// Bumped on every open/close; responses from an older generation are dropped.
    generation: u64,
    poller: Option<TimerHandle>,
}

/// The session chat: history, polling, sending and rendering.
#[derive(Clone)]
pub struct ChatPanel {
    api: Arc<ApiClient>,
    auth: Arc<AuthService>,
    document: SharedDocument,
    config: ChatConfig,
    state: Arc<Mutex<ChatState>>,
}

impl ChatPanel {
    pub fn new(api: Arc<ApiClient>, auth: Arc<AuthService>, document: SharedDocument, config: ChatConfig) -> Self {
        Self {
            api,
            auth,
            document,
            config,
            state: Arc::new(Mutex::new(ChatState {
                phase: ChatPhase::Idle,
                session_id: None,
                buffer: MessageBuffer::default(),
                generation: 0,
                poller: None,
            })),
        }
    }

    /// Subscribes to a session's chat, replacing any previous subscription.
    pub async fn open(&self, session_id: &str) {
        let generation = {
            let mut state = self.state.lock().await;
            if let Some(poller) = state.poller.take() {
                poller.cancel();
            }
            state.generation += 1;
            state.session_id = Some(session_id.to_string());
            state.buffer = MessageBuffer::default();
            state.phase = ChatPhase::Loading;
            state.generation
        };
        info!("Opening chat for session {}", session_id);

        {
            let mut doc = self.document.write().await;
            doc.show("chatForm");
            doc.hide("codeEditorContainer");
            doc.set_value("chatInput", "");
        }

        match self.api.get::<Vec<ChatMessage>>(&chat_path(session_id)).await {
            Ok(history) => {
                let mut state = self.state.lock().await;
                if state.generation != generation {
                    debug!("Dropping chat history for superseded session {}", session_id);
                    return;
                }
                state.buffer.apply(history);
                drop(state);
                self.render().await;
            }
            Err(e) => {
                error!("Error loading messages for session {}: {}", session_id, e);
                self.set_status("Error loading messages", false).await;
            }
        }

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.phase = ChatPhase::Polling;
            state.poller = Some(poller::spawn(
                self.clone(),
                session_id.to_string(),
                generation,
                &self.config,
            ));
        }
    }

    /// One poll round: fetch messages after the cursor and apply them.
    pub(crate) async fn poll_once(&self, session_id: &str, generation: u64) -> PollOutcome {
        let cursor = {
            let state = self.state.lock().await;
            if state.generation != generation {
                return PollOutcome::Stale;
            }
            state.buffer.cursor()
        };

        let path = format!("{}?since={}", chat_path(session_id), cursor);
        let result = self.api.get::<Vec<ChatMessage>>(&path).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Dropping stale chat response for session {}", session_id);
            return PollOutcome::Stale;
        }

        match result {
            Ok(batch) => {
                let added = state.buffer.apply(batch);
                drop(state);
                if added > 0 {
                    self.render().await;
                }
                self.set_status(CONNECTED, true).await;
                PollOutcome::Received(added)
            }
            Err(e) => {
                drop(state);
                error!("Error checking messages for session {}: {}", session_id, e);
                self.set_status(CONNECTION_ERROR, false).await;
                PollOutcome::Failed
            }
        }
    }

    /// Sends typed text. The input is cleared only once the server accepted it.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, AppError> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(SendOutcome::Empty);
        }
        if content == CODE_COMMAND {
            self.document.write().await.set_value("chatInput", "");
            self.open_code_editor().await;
            return Ok(SendOutcome::EditorOpened);
        }

        let outcome = self.post(content).await?;
        if outcome == SendOutcome::Sent {
            self.document.write().await.set_value("chatInput", "");
        }
        Ok(outcome)
    }

    /// Sends code from the editor as one fenced block.
    pub async fn send_code_block(&self, code: &str, lang: &str) -> Result<SendOutcome, AppError> {
        if code.trim().is_empty() {
            return Err(ValidationError::EmptyCodeBlock.into());
        }

        let outcome = self.post(&fence(code.trim(), lang.trim())).await?;
        if outcome == SendOutcome::Sent {
            self.close_code_editor().await;
            let mut doc = self.document.write().await;
            doc.set_value("codeEditorInput", "");
            doc.set_value("chatInput", "");
        }
        Ok(outcome)
    }

    async fn post(&self, content: &str) -> Result<SendOutcome, AppError> {
        let (session_id, generation) = {
            let state = self.state.lock().await;
            match &state.session_id {
                Some(id) => (id.clone(), state.generation),
                None => return Ok(SendOutcome::NoSession),
            }
        };

        let message: ChatMessage = self
            .api
            .post(&chat_path(&session_id), &json!({ "content": content }))
            .await
            .map_err(|e| {
                error!("Error sending message to session {}: {}", session_id, e);
                e
            })?;

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.buffer.apply(vec![message]);
            drop(state);
            self.render().await;
        }
        Ok(SendOutcome::Sent)
    }

    pub async fn open_code_editor(&self) {
        let mut doc = self.document.write().await;
        doc.show("codeEditorContainer");
        doc.hide("chatForm");
    }

    pub async fn close_code_editor(&self) {
        let mut doc = self.document.write().await;
        doc.hide("codeEditorContainer");
        doc.show("chatForm");
    }

    /// Stops polling and forgets the session's messages.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(poller) = state.poller.take() {
            poller.cancel();
        }
        if let Some(id) = state.session_id.take() {
            info!("Closed chat for session {}", id);
        }
        state.generation += 1;
        state.buffer = MessageBuffer::default();
        state.phase = ChatPhase::Closed;
    }

    pub async fn phase(&self) -> ChatPhase {
        self.state.lock().await.phase
    }

    pub async fn session_id(&self) -> Option<String> {
        self.state.lock().await.session_id.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.buffer.messages().to_vec()
    }

    pub async fn cursor(&self) -> i64 {
        self.state.lock().await.buffer.cursor()
    }

    pub async fn is_polling(&self) -> bool {
        let state = self.state.lock().await;
        state.poller.as_ref().map(|p| p.is_active()).unwrap_or(false)
    }

    async fn render(&self) {
        let messages = self.messages().await;
        let viewer = self.auth.current_user_id().await;
        let html = render_messages(&messages, viewer.as_deref());
        self.document.write().await.set_html("chatMessages", html);
    }

    async fn set_status(&self, status: &str, ok: bool) {
        let mut doc = self.document.write().await;
        doc.set_text("chatStatus", status);
        doc.set_class("chatStatus", if ok { "chat-status connected" } else { "chat-status error" });
    }
}

fn chat_path(session_id: &str) -> String {
    format!("/sessions/{}/chat", session_id)
}
