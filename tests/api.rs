//! Remote-layer and store behavior against a local canned-response HTTP server.

use obsidianlist_tui::api::ApiClient;
use obsidianlist_tui::assistant::{Assistant, EntryKind};
use obsidianlist_tui::chat::ChatState;
use obsidianlist_tui::models::{Priority, Task, TaskCreate, TaskUpdate};
use obsidianlist_tui::tasks::TaskStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ---- minimal mock backend ----

struct Rule {
    method: &'static str,
    path: String,
    status: u16,
    body: Value,
    hits: Arc<AtomicUsize>,
}

struct MockBackend {
    rules: Vec<Rule>,
}

impl MockBackend {
    fn new() -> Self {
        Self { rules: Vec::new() }
    }

    fn route(
        mut self,
        method: &'static str,
        path: &str,
        status: u16,
        body: Value,
    ) -> (Self, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        self.rules.push(Rule {
            method,
            path: path.to_string(),
            status,
            body,
            hits: hits.clone(),
        });
        (self, hits)
    }

    fn with(self, method: &'static str, path: &str, status: u16, body: Value) -> Self {
        self.route(method, path, status, body).0
    }

    /// Bind on an ephemeral port and serve matching canned responses until the
    /// test ends. Returns a base URL for the client under test.
    async fn serve(self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let rules = Arc::new(self.rules);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let rules = rules.clone();
                tokio::spawn(async move {
                    if let Some(request_line) = read_request(&mut socket).await {
                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or("");
                        let path = parts
                            .next()
                            .unwrap_or("")
                            .split('?')
                            .next()
                            .unwrap_or("");

                        let (status, body) = match rules
                            .iter()
                            .find(|r| r.method == method && r.path == path)
                        {
                            Some(rule) => {
                                rule.hits.fetch_add(1, Ordering::SeqCst);
                                (rule.status, rule.body.to_string())
                            }
                            None => (404, json!({"detail": "no such route"}).to_string()),
                        };

                        // 204 carries no body, everything else is JSON
                        let response = if status == 204 {
                            format!("HTTP/1.1 {} X\r\nConnection: close\r\n\r\n", status)
                        } else {
                            format!(
                                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status,
                                body.len(),
                                body
                            )
                        };
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                });
            }
        });

        format!("http://{}", addr)
    }
}

/// Read a full HTTP request (headers plus content-length body) and return the
/// request line.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let header = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = header
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);

            if buf.len() - (end + 4) >= content_length {
                return header.lines().next().map(String::from);
            }
        }
    }
}

fn task_json(id: &str, title: &str, priority: &str, completed: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "priority": priority,
        "tags": [],
        "completed": completed,
        "completion_date": null,
        "reminder": null,
        "user_id": "u1",
        "created_at": "2025-06-01T10:00:00Z",
        "updated_at": "2025-06-01T10:00:00Z"
    })
}

fn client(base_url: String) -> ApiClient {
    ApiClient::new(base_url)
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

// ---- task store ----

#[tokio::test]
async fn create_prepends_the_new_task() {
    let backend = MockBackend::new().with(
        "POST",
        "/api/tasks",
        200,
        task_json("t1", "Buy milk", "high", false),
    );
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    let draft = TaskCreate {
        title: "Buy milk".to_string(),
        priority: Some(Priority::High),
        ..TaskCreate::default()
    };
    let created = store.create(&api, &draft).await;

    assert!(created.is_some());
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.tasks()[0].title, "Buy milk");
    assert_eq!(store.tasks()[0].priority, Priority::High);
    assert!(store.error.is_none());
}

#[tokio::test]
async fn failed_create_leaves_cache_untouched() {
    let backend = MockBackend::new().with(
        "POST",
        "/api/tasks",
        500,
        json!({"detail": "database unavailable"}),
    );
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    let draft = TaskCreate {
        title: "Buy milk".to_string(),
        ..TaskCreate::default()
    };
    let created = store.create(&api, &draft).await;

    assert!(created.is_none());
    assert!(store.tasks().is_empty());
    assert_eq!(store.error.as_deref(), Some("database unavailable"));
}

#[tokio::test]
async fn failed_update_restores_the_original_record() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([task_json("t1", "Original title", "low", false)]),
        )
        .with("PUT", "/api/tasks/t1", 500, json!({"detail": "nope"}));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let updates = TaskUpdate {
        title: Some("Renamed".to_string()),
        priority: Some(Priority::High),
        ..TaskUpdate::default()
    };
    let updated = store.update(&api, "t1", &updates).await;

    assert!(updated.is_none());
    let task = store.get("t1").expect("task still cached");
    assert_eq!(task.title, "Original title");
    assert_eq!(task.priority, Priority::Low);
    assert_eq!(store.error.as_deref(), Some("nope"));
}

#[tokio::test]
async fn failed_toggle_restores_the_original_record() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([task_json("t1", "Walk the dog", "medium", false)]),
        )
        .with(
            "PATCH",
            "/api/tasks/t1/complete",
            500,
            json!({"detail": "boom"}),
        );
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let toggled = store.toggle_complete(&api, "t1").await;

    assert!(toggled.is_none());
    let task = store.get("t1").expect("task still cached");
    assert!(!task.completed);
    assert!(task.completion_date.is_none());
}

#[tokio::test]
async fn successful_toggle_adopts_the_server_record() {
    let mut done = task_json("t1", "Walk the dog", "medium", true);
    done["completion_date"] = json!("2025-06-02");

    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([task_json("t1", "Walk the dog", "medium", false)]),
        )
        .with("PATCH", "/api/tasks/t1/complete", 200, done);
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;
    let toggled = store.toggle_complete(&api, "t1").await;

    assert!(toggled.is_some());
    let task = store.get("t1").expect("task cached");
    assert!(task.completed);
    // The server's date wins over the locally stamped one
    assert_eq!(task.completion_date.as_deref(), Some("2025-06-02"));
}

#[tokio::test]
async fn failed_delete_restores_the_exact_snapshot() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([
                task_json("t1", "first", "low", false),
                task_json("t2", "second", "medium", false),
                task_json("t3", "third", "high", false),
            ]),
        )
        .with("DELETE", "/api/tasks/t2", 403, json!({}));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let deleted = store.delete(&api, "t2").await;

    assert!(!deleted);
    assert_eq!(titles(store.tasks()), vec!["first", "second", "third"]);
    assert_eq!(
        store.error.as_deref(),
        Some("You don't have permission to perform this action.")
    );
}

#[tokio::test]
async fn batch_delete_rolls_back_all_or_nothing() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([
                task_json("t1", "first", "low", false),
                task_json("t2", "second", "medium", false),
                task_json("t3", "third", "high", false),
            ]),
        )
        // t1 deletes fine, t3 fails; the cache must revert completely
        .with("DELETE", "/api/tasks/t1", 204, json!(null))
        .with("DELETE", "/api/tasks/t3", 500, json!({"detail": "locked"}));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let ids = vec!["t1".to_string(), "t3".to_string()];
    let ok = store.delete_many(&api, &ids).await;

    assert!(!ok);
    assert_eq!(titles(store.tasks()), vec!["first", "second", "third"]);
    assert_eq!(store.error.as_deref(), Some("Failed to delete some tasks"));
}

#[tokio::test]
async fn batch_delete_removes_all_requested_tasks() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([
                task_json("t1", "first", "low", false),
                task_json("t2", "second", "medium", false),
                task_json("t3", "third", "high", false),
            ]),
        )
        .with("DELETE", "/api/tasks/t1", 204, json!(null))
        .with("DELETE", "/api/tasks/t3", 204, json!(null));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let ids = vec!["t1".to_string(), "t3".to_string()];
    assert!(store.delete_many(&api, &ids).await);
    assert_eq!(titles(store.tasks()), vec!["second"]);
}

#[tokio::test]
async fn batch_complete_rolls_back_all_or_nothing() {
    let mut done = task_json("t1", "first", "low", true);
    done["completion_date"] = json!("2025-06-02");

    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([
                task_json("t1", "first", "low", false),
                task_json("t2", "second", "medium", false),
            ]),
        )
        // t1 completes fine, t2 fails; both must revert to pending
        .with("PATCH", "/api/tasks/t1/complete", 200, done)
        .with(
            "PATCH",
            "/api/tasks/t2/complete",
            500,
            json!({"detail": "locked"}),
        );
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let ids = vec!["t1".to_string(), "t2".to_string()];
    let ok = store.complete_many(&api, &ids).await;

    assert!(!ok);
    for id in ["t1", "t2"] {
        let task = store.get(id).expect("task still cached");
        assert!(!task.completed);
        assert!(task.completion_date.is_none());
    }
    assert_eq!(store.error.as_deref(), Some("Failed to complete some tasks"));
}

#[tokio::test]
async fn batch_complete_adopts_the_server_records() {
    let mut first = task_json("t1", "first", "low", true);
    first["completion_date"] = json!("2025-06-02");
    let mut second = task_json("t2", "second", "medium", true);
    second["completion_date"] = json!("2025-06-02");

    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/tasks",
            200,
            json!([
                task_json("t1", "first", "low", false),
                task_json("t2", "second", "medium", false),
            ]),
        )
        .with("PATCH", "/api/tasks/t1/complete", 200, first)
        .with("PATCH", "/api/tasks/t2/complete", 200, second);
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    let ids = vec!["t1".to_string(), "t2".to_string()];
    assert!(store.complete_many(&api, &ids).await);
    for id in ["t1", "t2"] {
        let task = store.get(id).expect("task cached");
        assert!(task.completed);
        assert_eq!(task.completion_date.as_deref(), Some("2025-06-02"));
    }
}

#[tokio::test]
async fn refresh_failure_clears_the_cache() {
    let backend = MockBackend::new().with("GET", "/api/tasks", 401, json!({}));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    assert!(store.tasks().is_empty());
    assert_eq!(
        store.error.as_deref(),
        Some("Authentication required. Please log in.")
    );
}

#[tokio::test]
async fn string_encoded_tags_arrive_as_lists() {
    let mut tagged = task_json("t1", "Tagged", "medium", false);
    tagged["tags"] = json!("[\"work\",\"urgent\"]");
    let mut broken = task_json("t2", "Broken tags", "medium", false);
    broken["tags"] = json!("{not json");

    let backend = MockBackend::new().with("GET", "/api/tasks", 200, json!([tagged, broken]));
    let api = client(backend.serve().await);

    let mut store = TaskStore::new();
    store.refresh(&api).await;

    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.get("t1").unwrap().tags, vec!["work", "urgent"]);
    assert!(store.get("t2").unwrap().tags.is_empty());
}

#[tokio::test]
async fn single_task_fetch_normalizes_tags() {
    let mut tagged = task_json("t1", "Tagged", "high", false);
    tagged["tags"] = json!("[\"deep-work\"]");

    let backend = MockBackend::new().with("GET", "/api/tasks/t1", 200, tagged);
    let api = client(backend.serve().await);

    let task = api.get_task("t1").await.expect("task");
    assert_eq!(task.title, "Tagged");
    assert_eq!(task.tags, vec!["deep-work"]);
}

// ---- retry policy ----

#[tokio::test]
async fn connection_failures_are_retried() {
    // Reserve a port, then close it so the first attempt is refused
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    // The backend comes up on the same port before the retry fires
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let listener = TcpListener::bind(addr).await.expect("rebind");
        let (mut socket, _) = listener.accept().await.expect("accept");
        if read_request(&mut socket).await.is_some() {
            let body = json!([]).to_string();
            let response = format!(
                "HTTP/1.1 200 X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    let api = ApiClient::new(format!("http://{}", addr))
        .with_retry_policy(1, Duration::from_millis(200));
    let tasks = api.get_tasks().await.expect("retry reaches the backend");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn http_error_statuses_are_not_retried() {
    let (backend, hits) =
        MockBackend::new().route("GET", "/api/tasks", 500, json!({"detail": "boom"}));
    let api = client(backend.serve().await).with_retry_policy(2, Duration::from_millis(10));

    let result = api.get_tasks().await;

    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// ---- single-shot assistant ----

#[tokio::test]
async fn rate_limited_assist_reports_the_distinct_message() {
    let backend = MockBackend::new().with("POST", "/api/ai-assist", 429, json!({}));
    let api = client(backend.serve().await);

    let mut assistant = Assistant::new();
    let response = assistant.send(&api, "remind me to water the plants").await;

    assert!(response.is_none());
    assert_eq!(
        assistant.error.as_deref(),
        Some("Rate limit reached. Please wait a moment before trying again.")
    );
    let last = assistant.entries.last().expect("error entry");
    assert_eq!(last.kind, EntryKind::Error);

    // Dismissing the error keeps the transcript
    assistant.clear_error();
    assert!(assistant.error.is_none());
    assert_eq!(assistant.entries.len(), 2);
}

#[tokio::test]
async fn blank_assist_input_never_reaches_the_network() {
    let (backend, hits) = MockBackend::new().route("POST", "/api/ai-assist", 200, json!({}));
    let api = client(backend.serve().await);

    let mut assistant = Assistant::new();
    let response = assistant.send(&api, "   ").await;

    assert!(response.is_none());
    assert_eq!(assistant.error.as_deref(), Some("Please enter a message"));
    assert!(assistant.entries.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_assist_records_the_interpretation() {
    let backend = MockBackend::new().with(
        "POST",
        "/api/ai-assist",
        200,
        json!({
            "task_id": "t9",
            "title": "Water the plants",
            "description": null,
            "priority": "low",
            "tags": ["garden"],
            "ai_interpretation": "Created \"Water the plants\" with low priority."
        }),
    );
    let api = client(backend.serve().await);

    let mut assistant = Assistant::new();
    let response = assistant.send(&api, "water the plants sometime").await;

    let response = response.expect("assist response");
    assert_eq!(response.title, "Water the plants");
    assert_eq!(assistant.entries.len(), 2);
    assert_eq!(assistant.entries[0].kind, EntryKind::User);
    assert_eq!(assistant.entries[1].kind, EntryKind::Assistant);
    assert!(assistant.last_response.is_some());
}

// ---- multi-turn chat ----

#[tokio::test]
async fn first_send_adopts_the_new_conversation_id() {
    let (backend, conv_hits) = MockBackend::new()
        .with(
            "POST",
            "/api/u1/chat",
            200,
            json!({
                "response": "Done! I created that task.",
                "conversation_id": "c9",
                "message_id": "m2",
                "tool_calls": [
                    {
                        "tool": "create_task",
                        "arguments": {"title": "Buy milk"},
                        "result": {"status": "success", "task_id": "t1"}
                    }
                ]
            }),
        )
        .route(
            "GET",
            "/api/u1/conversations",
            200,
            json!([{
                "id": "c9",
                "title": "Buy milk",
                "created_at": "2025-06-01T10:00:00Z",
                "updated_at": "2025-06-01T10:00:00Z",
                "last_message": "Done! I created that task."
            }]),
        );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    let sent = chat.send(&api, "u1", "add buy milk to my list").await;

    assert!(sent);
    assert_eq!(chat.current_conversation_id.as_deref(), Some("c9"));
    assert_eq!(chat.conversations.len(), 1);
    // The conversation list is refreshed exactly once
    assert_eq!(conv_hits.load(Ordering::SeqCst), 1);

    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[1].content, "Done! I created that task.");
    let calls = &chat.messages[1].tool_calls.as_ref().expect("tool calls").calls;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tool, "create_task");
    assert_eq!(calls[0].result.status, "success");
}

#[tokio::test]
async fn send_within_a_conversation_skips_the_list_refresh() {
    let (backend, conv_hits) = MockBackend::new()
        .with(
            "POST",
            "/api/u1/chat",
            200,
            json!({
                "response": "Sure.",
                "conversation_id": "c1",
                "message_id": "m5",
                "tool_calls": []
            }),
        )
        .route("GET", "/api/u1/conversations", 200, json!([]));
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    chat.current_conversation_id = Some("c1".to_string());

    assert!(chat.send(&api, "u1", "and another thing").await);
    assert_eq!(conv_hits.load(Ordering::SeqCst), 0);
    assert_eq!(chat.messages.len(), 2);
    assert!(chat.messages[1].tool_calls.is_none());
}

#[tokio::test]
async fn consecutive_sends_use_distinct_local_ids() {
    let backend = MockBackend::new().with(
        "POST",
        "/api/u1/chat",
        200,
        json!({
            "response": "Sure.",
            "conversation_id": "c1",
            "message_id": "m-server",
            "tool_calls": []
        }),
    );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    chat.current_conversation_id = Some("c1".to_string());

    assert!(chat.send(&api, "u1", "first").await);
    assert!(chat.send(&api, "u1", "second").await);

    // The user lines keep their local ids; two sends in the same
    // millisecond must not collide
    assert_eq!(chat.messages.len(), 4);
    assert_ne!(chat.messages[0].id, chat.messages[2].id);
}

#[tokio::test]
async fn rename_updates_the_local_conversation_title() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/u1/conversations",
            200,
            json!([{
                "id": "c1",
                "title": "Untitled",
                "created_at": "2025-06-01T10:00:00Z",
                "updated_at": "2025-06-01T10:00:00Z",
                "last_message": null
            }]),
        )
        .with(
            "PATCH",
            "/api/u1/conversations/c1",
            200,
            json!({"status": "ok"}),
        );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    chat.load_conversations(&api, "u1").await;
    chat.rename_conversation(&api, "u1", "c1", "Groceries").await;

    assert_eq!(chat.conversations[0].title, "Groceries");
    assert!(chat.error.is_none());
}

#[tokio::test]
async fn failed_send_removes_the_optimistic_message() {
    let backend = MockBackend::new().with(
        "POST",
        "/api/u1/chat",
        500,
        json!({"detail": "assistant offline"}),
    );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    let sent = chat.send(&api, "u1", "hello?").await;

    assert!(!sent);
    assert!(chat.messages.is_empty());
    assert_eq!(chat.error.as_deref(), Some("assistant offline"));
}

#[tokio::test]
async fn deleting_the_current_conversation_starts_a_new_chat() {
    let backend = MockBackend::new()
        .with(
            "GET",
            "/api/u1/conversations",
            200,
            json!([{
                "id": "c1",
                "title": "Groceries",
                "created_at": "2025-06-01T10:00:00Z",
                "updated_at": "2025-06-01T10:00:00Z",
                "last_message": null
            }]),
        )
        .with(
            "DELETE",
            "/api/u1/conversations/c1",
            200,
            json!({"status": "ok", "message": "deleted"}),
        );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    chat.load_conversations(&api, "u1").await;
    chat.current_conversation_id = Some("c1".to_string());

    chat.delete_conversation(&api, "u1", "c1").await;

    assert!(chat.conversations.is_empty());
    assert!(chat.current_conversation_id.is_none());
    assert!(chat.messages.is_empty());
}

#[tokio::test]
async fn opening_a_conversation_replaces_the_message_list() {
    let backend = MockBackend::new().with(
        "GET",
        "/api/u1/conversations/c1",
        200,
        json!([
            {
                "id": "m1",
                "role": "user",
                "content": "add buy milk",
                "created_at": "2025-06-01T10:00:00Z"
            },
            {
                "id": "m2",
                "role": "assistant",
                "content": "Done.",
                "created_at": "2025-06-01T10:00:05Z"
            }
        ]),
    );
    let api = client(backend.serve().await);

    let mut chat = ChatState::new();
    chat.messages.push(obsidianlist_tui::models::Message {
        id: "stale".to_string(),
        role: obsidianlist_tui::models::Role::User,
        content: "left over".to_string(),
        tool_calls: None,
        created_at: "2025-06-01T09:00:00Z".to_string(),
    });

    chat.open_conversation(&api, "u1", "c1").await;

    assert_eq!(chat.current_conversation_id.as_deref(), Some("c1"));
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[0].content, "add buy milk");
}
