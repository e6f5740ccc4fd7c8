use anyhow::Result;
use nova_core::assistant::Assistant;
use nova_core::completion::ChatMessage;
use nova_core::session::{ChatState, Session};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// What the chat page renders for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatView {
    pub input: String,
    pub state: ChatState,
    pub history: Vec<ChatMessage>,
}

impl From<&Session> for ChatView {
    fn from(session: &Session) -> Self {
        Self {
            input: session.input().to_string(),
            state: session.state(),
            history: session.messages().to_vec(),
        }
    }
}

struct Entry {
    session: Session,
    /// Tick of the entry's creation or last reset. A reply generated for an
    /// older epoch is dropped.
    epoch: u64,
    last_used: u64,
}

/// Sessions by id, bounded to `capacity` entries.
struct Sessions {
    entries: HashMap<String, Entry>,
    capacity: usize,
    clock: u64,
}

impl Sessions {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// The entry for `id`, created if missing. Evicts the least recently used
    /// entry when full.
    fn touch(&mut self, id: &str) -> &mut Entry {
        let now = self.tick();
        if !self.entries.contains_key(id) {
            while self.entries.len() >= self.capacity {
                let Some(oldest) = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_used)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                tracing::debug!(session_id = %oldest, "evicting idle session");
                self.entries.remove(&oldest);
            }
        }
        let entry = self.entries.entry(id.to_string()).or_insert_with(|| Entry {
            session: Session::new(),
            epoch: now,
            last_used: now,
        });
        entry.last_used = now;
        entry
    }

    /// The entry still waiting on the reply started at (`epoch`, `turns`).
    fn pending(&mut self, id: &str, epoch: u64, turns: usize) -> Option<&mut Entry> {
        self.entries
            .get_mut(id)
            .filter(|e| e.epoch == epoch && e.session.messages().len() == turns)
    }
}

/// Multi-turn chat conversations, one per browser session.
pub struct ChatService {
    assistant: Arc<Assistant>,
    sessions: Mutex<Sessions>,
}

impl ChatService {
    /// At most `max_sessions` conversations are kept; the least recently used
    /// one is dropped to make room.
    pub fn new(assistant: Arc<Assistant>, max_sessions: usize) -> Self {
        Self {
            assistant,
            sessions: Mutex::new(Sessions::new(max_sessions)),
        }
    }

    /// Current view of a session. Unknown sessions read as empty.
    pub async fn view(&self, session_id: &str) -> ChatView {
        let sessions = self.sessions.lock().await;
        sessions
            .get(session_id)
            .map(|e| ChatView::from(&e.session))
            .unwrap_or_default()
    }

    /// Store the draft in the input field.
    #[instrument(skip(self, text))]
    pub async fn set_input(&self, session_id: &str, text: &str) -> ChatView {
        let mut sessions = self.sessions.lock().await;
        if text.is_empty() && sessions.get(session_id).is_none() {
            return ChatView::default();
        }
        let entry = sessions.touch(session_id);
        entry.session.set_input(text);
        ChatView::from(&entry.session)
    }

    /// Store the user turn. Blank text only clears the input field.
    #[instrument(skip(self, text))]
    pub async fn submit(&self, session_id: &str, text: &str) -> ChatView {
        let mut sessions = self.sessions.lock().await;
        if text.trim().is_empty() && sessions.get(session_id).is_none() {
            return ChatView::default();
        }
        let entry = sessions.touch(session_id);
        if !entry.session.submit(text) {
            tracing::debug!("submit ignored");
        }
        ChatView::from(&entry.session)
    }

    /// Generate and store the reply to the pending user turn, if any.
    ///
    /// The session lock is released while the model generates. When the
    /// generation fails the session goes back to idle, keeping the user turn.
    #[instrument(skip(self))]
    pub async fn reply(&self, session_id: &str) -> Result<ChatView> {
        let (prompt, epoch, turns) = {
            let mut sessions = self.sessions.lock().await;
            let Some(entry) = sessions.entries.get_mut(session_id) else {
                return Ok(ChatView::default());
            };
            match entry.session.pending_prompt() {
                Some(prompt) => (
                    prompt.to_string(),
                    entry.epoch,
                    entry.session.messages().len(),
                ),
                None => return Ok(ChatView::from(&entry.session)),
            }
        };

        let result = self.assistant.generate(&prompt).await;

        let mut sessions = self.sessions.lock().await;
        match sessions.pending(session_id, epoch, turns) {
            Some(entry) => match result {
                Ok(reply) => {
                    entry.session.complete_reply(&reply);
                    Ok(ChatView::from(&entry.session))
                }
                Err(e) => {
                    entry.session.abandon_reply();
                    Err(e)
                }
            },
            None => {
                tracing::debug!("reply dropped, session no longer waiting");
                result?;
                Ok(sessions
                    .get(session_id)
                    .map(|e| ChatView::from(&e.session))
                    .unwrap_or_default())
            }
        }
    }

    /// Clear history and input of a session. Unknown sessions stay unknown.
    #[instrument(skip(self))]
    pub async fn reset(&self, session_id: &str) -> ChatView {
        let mut sessions = self.sessions.lock().await;
        let epoch = sessions.tick();
        match sessions.entries.get_mut(session_id) {
            Some(entry) => {
                entry.session.reset();
                entry.epoch = epoch;
                ChatView::from(&entry.session)
            }
            None => ChatView::default(),
        }
    }

    #[cfg(test)]
    async fn session_count(&self) -> usize {
        self.sessions.lock().await.entries.len()
    }
}
