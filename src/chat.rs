use crate::api::ApiClient;
use crate::models::{Conversation, Message, Role, ToolCallList};
use chrono::{Local, Utc};

/// State behind the conversational assistant view: the conversation list, the
/// open conversation's messages, and the in-flight/error flags.
///
/// Sending appends the user's message optimistically; a failed send removes
/// exactly that message. The first successful send without a conversation id
/// adopts the id the server assigned and refreshes the conversation list.
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    pub current_conversation_id: Option<String>,
    pub messages: Vec<Message>,
    pub is_loading_conversations: bool,
    pub is_loading_messages: bool,
    pub is_sending: bool,
    pub error: Option<String>,
    temp_seq: u64,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            conversations: Vec::new(),
            current_conversation_id: None,
            messages: Vec::new(),
            is_loading_conversations: false,
            is_loading_messages: false,
            is_sending: false,
            error: None,
            temp_seq: 0,
        }
    }

    pub async fn load_conversations(&mut self, api: &ApiClient, user_id: &str) {
        self.is_loading_conversations = true;
        self.error = None;

        match api.get_conversations(user_id).await {
            Ok(conversations) => self.conversations = conversations,
            Err(err) => self.error = Some(err.to_string()),
        }

        self.is_loading_conversations = false;
    }

    /// Switch to a conversation: clear the pane, then load its history.
    pub async fn open_conversation(&mut self, api: &ApiClient, user_id: &str, id: &str) {
        self.is_loading_messages = true;
        self.error = None;
        self.current_conversation_id = Some(id.to_string());
        self.messages.clear();

        match api.get_conversation(user_id, id).await {
            Ok(messages) => self.messages = messages,
            Err(err) => {
                self.error = Some(err.to_string());
                self.messages.clear();
            }
        }

        self.is_loading_messages = false;
    }

    /// Start a fresh chat locally; the server learns about it on first send.
    pub fn new_chat(&mut self) {
        self.current_conversation_id = None;
        self.messages.clear();
        self.error = None;
    }

    pub async fn delete_conversation(&mut self, api: &ApiClient, user_id: &str, id: &str) {
        match api.delete_conversation(user_id, id).await {
            Ok(()) => {
                self.conversations.retain(|c| c.id != id);
                if self.current_conversation_id.as_deref() == Some(id) {
                    self.new_chat();
                }
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    pub async fn rename_conversation(
        &mut self,
        api: &ApiClient,
        user_id: &str,
        id: &str,
        title: &str,
    ) {
        match api.rename_conversation(user_id, id, title).await {
            Ok(()) => {
                if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
                    conversation.title = title.to_string();
                }
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    /// Send a message within the current conversation (or implicitly start
    /// one). Returns true when the assistant replied.
    pub async fn send(&mut self, api: &ApiClient, user_id: &str, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            return false;
        }

        self.error = None;
        self.is_sending = true;

        // Sequence number keeps ids distinct for sends within one millisecond
        self.temp_seq += 1;
        let temp_id = format!("temp-{}-{}", Local::now().timestamp_millis(), self.temp_seq);
        self.messages.push(Message {
            id: temp_id.clone(),
            role: Role::User,
            content: content.to_string(),
            tool_calls: None,
            created_at: Utc::now().to_rfc3339(),
        });

        let conversation_id = self.current_conversation_id.clone();
        let result = api
            .send_chat_message(user_id, content, conversation_id.as_deref())
            .await;

        let ok = match result {
            Ok(response) => {
                let was_new = self.current_conversation_id.is_none();
                if was_new {
                    self.current_conversation_id = Some(response.conversation_id.clone());
                }

                let tool_calls = if response.tool_calls.is_empty() {
                    None
                } else {
                    Some(ToolCallList {
                        calls: response.tool_calls,
                    })
                };
                self.messages.push(Message {
                    id: response.message_id,
                    role: Role::Assistant,
                    content: response.response,
                    tool_calls,
                    created_at: Utc::now().to_rfc3339(),
                });

                // New conversations show up in the sidebar right away
                if was_new {
                    self.load_conversations(api, user_id).await;
                }
                true
            }
            Err(err) => {
                self.messages.retain(|m| m.id != temp_id);
                self.error = Some(err.to_string());
                false
            }
        };

        self.is_sending = false;
        ok
    }
}
