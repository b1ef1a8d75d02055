use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::panel::{ChatPanel, PollOutcome};
use crate::config::ChatConfig;
use crate::shell::TimerHandle;

/// Poll delay that doubles on consecutive failures up to a ceiling.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            current: base,
            failures: 0,
        }
    }

    /// Next wait. After failures the wait is jittered within the upper half
    /// of the current step, so it never drops below the base interval.
    pub fn delay(&self) -> Duration {
        if self.failures == 0 {
            return self.base;
        }
        let half = self.current.as_millis() as u64 / 2;
        let jitter = rand::thread_rng().gen_range(0..=half);
        Duration::from_millis(half + jitter).max(self.base)
    }

    pub fn fail(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.current = self.current.saturating_mul(2).min(self.max);
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.current = self.base;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Draws the next wait once, so the logged delay is the one slept.
fn next_wait(backoff: &Backoff, session_id: &str) -> Duration {
    let delay = backoff.delay();
    if backoff.failures() > 0 {
        warn!(
            "Chat poll for session {} failed {} time(s), next attempt in {:?}",
            session_id,
            backoff.failures(),
            delay
        );
    }
    delay
}

/// Starts polling `session_id` for messages after the panel's cursor.
///
/// The task ends when cancelled or when the panel has moved on to another
/// subscription.
pub(crate) fn spawn(panel: ChatPanel, session_id: String, generation: u64, config: &ChatConfig) -> TimerHandle {
    let mut backoff = Backoff::new(config.poll_interval(), config.max_backoff());

    TimerHandle::spawn("chat poll", move |token| async move {
        loop {
            let delay = next_wait(&backoff, &session_id);
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => break,
                outcome = panel.poll_once(&session_id, generation) => outcome,
            };

            match outcome {
                PollOutcome::Received(_) => backoff.reset(),
                PollOutcome::Failed => backoff.fail(),
                PollOutcome::Stale => break,
            }
        }
        debug!("Chat poller for session {} stopped", session_id);
    })
}
