use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Task priority, serialized lowercase to match the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Numeric rank used for priority sorting (high outranks low).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

// Task struct
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub completed: bool,
    pub completion_date: Option<String>,
    pub reminder: Option<Reminder>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

// Reminder attached to a task
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Reminder {
    pub id: String,
    pub task_id: String,
    pub reminder_date: String,
    pub reminder_time: String,
    pub reminder_day: String,
    pub sent: bool,
    pub sent_at: Option<String>,
}

// Reminder payload for create/update requests (YYYY-MM-DD / HH:MM)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub reminder_date: String,
    pub reminder_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_day: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<ReminderDraft>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<ReminderDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_reminder: Option<bool>,
}

// Authenticated user profile
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Structured response from the natural-language task creation endpoint
#[derive(Clone, Deserialize, Debug)]
pub struct AiAssistResponse {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub ai_interpretation: String,
}

// Chat conversation summary
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

// A single chat message, possibly carrying tool calls the assistant made
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<ToolCallList>,
    pub created_at: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ToolCallList {
    pub calls: Vec<ToolCall>,
}

// A side-effecting action taken by the assistant while answering
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
    pub result: ToolCallResult,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ToolCallResult {
    pub status: String,
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub message_id: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

// Aggregate counts over the task cache; per-priority counts cover pending only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
}
