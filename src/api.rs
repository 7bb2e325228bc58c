use crate::error::ApiError;
use crate::models::{
    AiAssistResponse, AuthResponse, ChatResponse, Conversation, Message, Task, TaskCreate,
    TaskUpdate, User,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// HTTP client for the ObsidianList backend.
///
/// Attaches the session's bearer token to every request, retries network-level
/// failures with linear backoff, maps error statuses to readable messages, and
/// normalizes `tags` fields that arrive as JSON-encoded strings.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token: None,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the retry policy. `retries` counts attempts after the first;
    /// the delay before attempt n is `retry_delay * n`.
    pub fn with_retry_policy(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    // ---- core request plumbing ----

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..=self.retries {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Accept", "application/json");
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(res) => return read_response(res).await,
                // Only transport failures are retried, never HTTP error statuses
                Err(err) if is_retryable(&err) && attempt < self.retries => {
                    tokio::time::sleep(self.retry_delay * (attempt + 1)).await;
                }
                Err(err) => return Err(ApiError::Network(err.to_string())),
            }
        }

        Err(ApiError::Network("Failed to connect to server".to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.request(Method::GET, path, None, &[]).await?;
        Ok(serde_json::from_value(value)?)
    }

    // ---- auth ----

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = json!({ "name": name, "email": email, "password": password });
        let value = self
            .request(Method::POST, "/api/auth/signup", Some(&body), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = json!({ "email": email, "password": password });
        let value = self
            .request(Method::POST, "/api/auth/login", Some(&body), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("/api/auth/me").await
    }

    // ---- tasks ----

    pub async fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.get_json("/api/tasks").await
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, ApiError> {
        self.get_json(&format!("/api/tasks/{}", id)).await
    }

    pub async fn create_task(&self, task: &TaskCreate) -> Result<Task, ApiError> {
        let body = serde_json::to_value(task)?;
        let value = self
            .request(Method::POST, "/api/tasks", Some(&body), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update_task(&self, id: &str, updates: &TaskUpdate) -> Result<Task, ApiError> {
        let body = serde_json::to_value(updates)?;
        let value = self
            .request(Method::PUT, &format!("/api/tasks/{}", id), Some(&body), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &format!("/api/tasks/{}", id), None, &[])
            .await?;
        Ok(())
    }

    /// Toggle completion server-side; the server decides completion_date.
    pub async fn toggle_complete(&self, id: &str) -> Result<Task, ApiError> {
        let value = self
            .request(
                Method::PATCH,
                &format!("/api/tasks/{}/complete", id),
                None,
                &[],
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // ---- AI assistant ----

    /// Create a task from a natural-language message. Rate limited server-side;
    /// callers should branch on [`ApiError::RateLimited`].
    pub async fn ai_assist(&self, message: &str) -> Result<AiAssistResponse, ApiError> {
        let body = json!({ "message": message });
        let value = self
            .request(Method::POST, "/api/ai-assist", Some(&body), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    // ---- chat ----

    /// Send a chat message. The server starts a new conversation when
    /// `conversation_id` is absent and reports the assigned id back.
    pub async fn send_chat_message(
        &self,
        user_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        let mut body = json!({ "message": message });
        if let Some(id) = conversation_id {
            body["conversation_id"] = json!(id);
        }
        let value = self
            .request(
                Method::POST,
                &format!("/api/{}/chat", user_id),
                Some(&body),
                &[],
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ApiError> {
        self.get_json(&format!("/api/{}/conversations", user_id))
            .await
    }

    pub async fn get_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<Vec<Message>, ApiError> {
        self.get_json(&format!(
            "/api/{}/conversations/{}",
            user_id, conversation_id
        ))
        .await
    }

    pub async fn delete_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::DELETE,
            &format!("/api/{}/conversations/{}", user_id, conversation_id),
            None,
            &[],
        )
        .await?;
        Ok(())
    }

    pub async fn rename_conversation(
        &self,
        user_id: &str,
        conversation_id: &str,
        title: &str,
    ) -> Result<(), ApiError> {
        self.request(
            Method::PATCH,
            &format!("/api/{}/conversations/{}", user_id, conversation_id),
            None,
            &[("title", title)],
        )
        .await?;
        Ok(())
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

async fn read_response(res: reqwest::Response) -> Result<Value, ApiError> {
    let status = res.status();

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }

    if !status.is_success() {
        let detail = res
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from));
        return Err(map_status(status, detail));
    }

    let mut value = res
        .json::<Value>()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;
    normalize_tags(&mut value);
    Ok(value)
}

fn map_status(status: StatusCode, detail: Option<String>) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
        _ => ApiError::Server {
            status: status.as_u16(),
            detail: detail.unwrap_or_else(|| format!("Request failed ({})", status.as_u16())),
        },
    }
}

/// Some backend rows carry `tags` as a JSON-encoded string rather than a list.
/// Rewrite those in place so typed deserialization always sees a list; a
/// malformed string becomes an empty list. Applies to single objects and to
/// arrays of objects.
fn normalize_tags(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                normalize_tags_in_object(item);
            }
        }
        Value::Object(_) => normalize_tags_in_object(value),
        _ => {}
    }
}

fn normalize_tags_in_object(value: &mut Value) {
    let Some(tags) = value.get_mut("tags") else {
        return;
    };
    if let Value::String(raw) = tags {
        *tags = match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Array(_)) => parsed,
            _ => Value::Array(Vec::new()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_encoded_tags_become_a_list() {
        let mut value = json!({ "id": "t1", "tags": "[\"work\",\"urgent\"]" });
        normalize_tags(&mut value);
        assert_eq!(value["tags"], json!(["work", "urgent"]));
    }

    #[test]
    fn malformed_tags_default_to_empty_list() {
        let mut value = json!({ "id": "t1", "tags": "not json" });
        normalize_tags(&mut value);
        assert_eq!(value["tags"], json!([]));
    }

    #[test]
    fn non_array_json_string_defaults_to_empty_list() {
        // A quoted scalar parses as JSON but is not a list
        let mut value = json!({ "id": "t1", "tags": "\"work\"" });
        normalize_tags(&mut value);
        assert_eq!(value["tags"], json!([]));
    }

    #[test]
    fn arrays_of_objects_are_normalized_element_wise() {
        let mut value = json!([
            { "id": "a", "tags": "[\"home\"]" },
            { "id": "b", "tags": ["already", "a-list"] },
            { "id": "c" },
        ]);
        normalize_tags(&mut value);
        assert_eq!(value[0]["tags"], json!(["home"]));
        assert_eq!(value[1]["tags"], json!(["already", "a-list"]));
        assert!(value[2].get("tags").is_none());
    }

    #[test]
    fn structured_tags_are_left_alone() {
        let mut value = json!({ "tags": ["keep", "me"] });
        normalize_tags(&mut value);
        assert_eq!(value["tags"], json!(["keep", "me"]));
    }

    #[test]
    fn status_mapping_prefers_server_detail() {
        let err = map_status(StatusCode::INTERNAL_SERVER_ERROR, Some("boom".into()));
        assert_eq!(err.to_string(), "boom");
        let err = map_status(StatusCode::BAD_REQUEST, None);
        assert_eq!(err.to_string(), "Request failed (400)");
        assert!(map_status(StatusCode::TOO_MANY_REQUESTS, None).is_rate_limited());
    }
}
