use crate::api::ApiClient;
use crate::models::AiAssistResponse;
use chrono::{DateTime, Local};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Error,
}

/// One line of the quick-assist transcript.
#[derive(Clone, Debug)]
pub struct AssistantEntry {
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Local>,
    /// Present on assistant entries; the task the backend created.
    pub task_created: Option<AiAssistResponse>,
}

impl AssistantEntry {
    fn new(kind: EntryKind, content: String) -> Self {
        Self {
            kind,
            content,
            timestamp: Local::now(),
            task_created: None,
        }
    }
}

/// In-memory transcript for the single-shot natural-language task creator.
///
/// Each `send` is an independent round trip: the user's message, then either
/// the backend's interpretation of the task it created or an error line.
/// Nothing is persisted server-side.
pub struct Assistant {
    pub entries: Vec<AssistantEntry>,
    pub is_processing: bool,
    pub error: Option<String>,
    pub last_response: Option<AiAssistResponse>,
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new()
    }
}

impl Assistant {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            is_processing: false,
            error: None,
            last_response: None,
        }
    }

    /// Forward a free-text message to the task-creation endpoint. Blank input
    /// is rejected locally without touching the network. Returns the
    /// structured response so the caller can refresh its task list.
    pub async fn send(&mut self, api: &ApiClient, message: &str) -> Option<AiAssistResponse> {
        if message.trim().is_empty() {
            self.error = Some("Please enter a message".to_string());
            return None;
        }

        self.is_processing = true;
        self.error = None;

        self.entries
            .push(AssistantEntry::new(EntryKind::User, message.to_string()));

        let result = match api.ai_assist(message).await {
            Ok(response) => {
                let mut entry =
                    AssistantEntry::new(EntryKind::Assistant, response.ai_interpretation.clone());
                entry.task_created = Some(response.clone());
                self.entries.push(entry);
                self.last_response = Some(response.clone());
                Some(response)
            }
            Err(err) => {
                let message = if err.is_rate_limited() {
                    "Rate limit reached. Please wait a moment before trying again.".to_string()
                } else {
                    err.to_string()
                };
                self.entries
                    .push(AssistantEntry::new(EntryKind::Error, message.clone()));
                self.error = Some(message);
                None
            }
        };

        self.is_processing = false;
        result
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_response = None;
        self.error = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
