use crate::api::ApiClient;
use crate::models::{Priority, Task, TaskCreate, TaskStats, TaskUpdate};
use chrono::{DateTime, Local, NaiveDateTime};
use futures_util::future::join_all;

/// Sort order for the task list view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    CreatedAsc,
    #[default]
    CreatedDesc,
    PriorityAsc,
    PriorityDesc,
    TitleAsc,
    TitleDesc,
}

impl SortBy {
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::CreatedAsc => "oldest",
            SortBy::CreatedDesc => "newest",
            SortBy::PriorityAsc => "priority ↑",
            SortBy::PriorityDesc => "priority ↓",
            SortBy::TitleAsc => "title a-z",
            SortBy::TitleDesc => "title z-a",
        }
    }

    /// Cycle through the sort orders (bound to a single key in the UI).
    pub fn next(&self) -> SortBy {
        match self {
            SortBy::CreatedDesc => SortBy::CreatedAsc,
            SortBy::CreatedAsc => SortBy::PriorityDesc,
            SortBy::PriorityDesc => SortBy::PriorityAsc,
            SortBy::PriorityAsc => SortBy::TitleAsc,
            SortBy::TitleAsc => SortBy::TitleDesc,
            SortBy::TitleDesc => SortBy::CreatedDesc,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }

    pub fn next(&self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

/// Filter criteria applied to the cached task list before rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilters {
    pub search: String,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
    pub tag: Option<String>,
    pub sort_by: SortBy,
}

impl TaskFilters {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.priority.is_some()
            || self.status != StatusFilter::All
            || self.tag.is_some()
    }
}

/// Client-side cache of the user's tasks.
///
/// Mutations are optimistic: the cache changes immediately, then is reconciled
/// with the server's authoritative record on success or rolled back to the
/// pre-mutation snapshot on failure. Batch operations roll back all-or-nothing.
pub struct TaskStore {
    tasks: Vec<Task>,
    pub filters: TaskFilters,
    pub is_loading: bool,
    pub is_mutating: bool,
    pub error: Option<String>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            filters: TaskFilters::default(),
            is_loading: false,
            is_mutating: false,
            error: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ---- fetch ----

    /// Replace the whole cache with the server's task list. On error the
    /// cache is cleared rather than left stale.
    pub async fn refresh(&mut self, api: &ApiClient) {
        self.is_loading = true;
        self.error = None;

        match api.get_tasks().await {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => {
                self.tasks.clear();
                self.error = Some(err.to_string());
            }
        }

        self.is_loading = false;
    }

    // ---- mutations ----

    /// Create a task. No optimistic insert; the server's record is prepended
    /// on success so the newest task appears first.
    pub async fn create(&mut self, api: &ApiClient, draft: &TaskCreate) -> Option<Task> {
        self.is_mutating = true;
        self.error = None;

        let result = match api.create_task(draft).await {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                Some(task)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        };

        self.is_mutating = false;
        result
    }

    /// Merge a partial update into the cached record immediately, then
    /// reconcile with the server's version or restore the original record.
    pub async fn update(&mut self, api: &ApiClient, id: &str, updates: &TaskUpdate) -> Option<Task> {
        self.is_mutating = true;
        self.error = None;

        let original = self.get(id).cloned();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            apply_update(task, updates);
        }

        let result = match api.update_task(id, updates).await {
            Ok(task) => {
                self.replace(task.clone());
                Some(task)
            }
            Err(err) => {
                if let Some(original) = original {
                    self.replace(original);
                }
                self.error = Some(err.to_string());
                None
            }
        };

        self.is_mutating = false;
        result
    }

    /// Remove the task from the cache immediately; restore the full snapshot
    /// (ordering included) if the server refuses.
    pub async fn delete(&mut self, api: &ApiClient, id: &str) -> bool {
        self.is_mutating = true;
        self.error = None;

        let snapshot = self.tasks.clone();
        self.tasks.retain(|t| t.id != id);

        let ok = match api.delete_task(id).await {
            Ok(()) => true,
            Err(err) => {
                self.tasks = snapshot;
                self.error = Some(err.to_string());
                false
            }
        };

        self.is_mutating = false;
        ok
    }

    /// Flip completion locally (stamping today's date) before the server
    /// answers; reconcile or roll back like `update`.
    pub async fn toggle_complete(&mut self, api: &ApiClient, id: &str) -> Option<Task> {
        self.is_mutating = true;
        self.error = None;

        let original = self.get(id).cloned();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            apply_toggle(task);
        }

        let result = match api.toggle_complete(id).await {
            Ok(task) => {
                self.replace(task.clone());
                Some(task)
            }
            Err(err) => {
                if let Some(original) = original {
                    self.replace(original);
                }
                self.error = Some(err.to_string());
                None
            }
        };

        self.is_mutating = false;
        result
    }

    // ---- batch operations ----

    /// Delete several tasks with one concurrent request per id. If any
    /// sub-request fails the whole cache reverts to the pre-batch snapshot.
    pub async fn delete_many(&mut self, api: &ApiClient, ids: &[String]) -> bool {
        self.is_mutating = true;
        self.error = None;

        let snapshot = self.tasks.clone();
        self.tasks.retain(|t| !ids.contains(&t.id));

        let results = join_all(ids.iter().map(|id| api.delete_task(id))).await;

        let ok = if results.iter().any(|r| r.is_err()) {
            self.tasks = snapshot;
            self.error = Some("Failed to delete some tasks".to_string());
            false
        } else {
            true
        };

        self.is_mutating = false;
        ok
    }

    /// Mark several tasks complete, all-or-nothing like `delete_many`. Each
    /// server response replaces its cached record on success.
    pub async fn complete_many(&mut self, api: &ApiClient, ids: &[String]) -> bool {
        self.is_mutating = true;
        self.error = None;

        let snapshot = self.tasks.clone();
        let today = today();
        for task in self.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
            task.completed = true;
            task.completion_date = Some(today.clone());
        }

        let results = join_all(ids.iter().map(|id| api.toggle_complete(id))).await;

        let ok = if results.iter().any(|r| r.is_err()) {
            self.tasks = snapshot;
            self.error = Some("Failed to complete some tasks".to_string());
            false
        } else {
            for task in results.into_iter().flatten() {
                self.replace(task);
            }
            true
        };

        self.is_mutating = false;
        ok
    }

    // ---- derived views ----

    /// The cache filtered and sorted per the current criteria.
    pub fn filtered(&self) -> Vec<Task> {
        let mut result = filter_tasks(&self.tasks, &self.filters);
        sort_tasks(&mut result, self.filters.sort_by);
        result
    }

    pub fn stats(&self) -> TaskStats {
        calculate_stats(&self.tasks)
    }

    /// De-duplicated, alphabetically sorted union of tags across the cache.
    pub fn available_tags(&self) -> Vec<String> {
        extract_tags(&self.tasks)
    }

    pub fn clear_filters(&mut self) {
        self.filters = TaskFilters::default();
    }

    pub fn has_active_filters(&self) -> bool {
        self.filters.is_active()
    }

    fn replace(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }
}

/// Merge a partial update into a cached task for optimistic display. A
/// reminder draft has no server-assigned id yet, so the existing reminder
/// stands until the server's record arrives.
fn apply_update(task: &mut Task, updates: &TaskUpdate) {
    if let Some(title) = &updates.title {
        task.title = title.clone();
    }
    if let Some(description) = &updates.description {
        task.description = Some(description.clone());
    }
    if let Some(priority) = updates.priority {
        task.priority = priority;
    }
    if let Some(completed) = updates.completed {
        task.completed = completed;
    }
    if let Some(completion_date) = &updates.completion_date {
        task.completion_date = completion_date.clone();
    }
    if let Some(tags) = &updates.tags {
        task.tags = tags.clone();
    }
    if updates.remove_reminder == Some(true) {
        task.reminder = None;
    }
}

/// Optimistic completion flip: stamps today's date when completing, clears it
/// when un-completing.
fn apply_toggle(task: &mut Task) {
    task.completed = !task.completed;
    task.completion_date = if task.completed { Some(today()) } else { None };
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

pub fn filter_tasks(tasks: &[Task], filters: &TaskFilters) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| {
            if !filters.search.is_empty() {
                let query = filters.search.to_lowercase();
                let in_title = task.title.to_lowercase().contains(&query);
                let in_description = task
                    .description
                    .as_ref()
                    .map(|d| d.to_lowercase().contains(&query))
                    .unwrap_or(false);
                if !in_title && !in_description {
                    return false;
                }
            }
            if let Some(priority) = filters.priority {
                if task.priority != priority {
                    return false;
                }
            }
            match filters.status {
                StatusFilter::All => {}
                StatusFilter::Pending => {
                    if task.completed {
                        return false;
                    }
                }
                StatusFilter::Completed => {
                    if !task.completed {
                        return false;
                    }
                }
            }
            if let Some(tag) = &filters.tag {
                if !task.tags.iter().any(|t| t == tag) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

pub fn sort_tasks(tasks: &mut [Task], sort_by: SortBy) {
    match sort_by {
        SortBy::CreatedAsc => tasks.sort_by_key(created_ts),
        SortBy::CreatedDesc => {
            tasks.sort_by_key(created_ts);
            tasks.reverse();
        }
        SortBy::PriorityAsc => tasks.sort_by_key(|t| t.priority.rank()),
        SortBy::PriorityDesc => tasks.sort_by_key(|t| std::cmp::Reverse(t.priority.rank())),
        SortBy::TitleAsc => tasks.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortBy::TitleDesc => tasks.sort_by(|a, b| compare_titles(&b.title, &a.title)),
    }
}

// Case-insensitive, so "apple" sorts before "Banana"
fn compare_titles(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn created_ts(task: &Task) -> i64 {
    parse_timestamp(&task.created_at).unwrap_or(0)
}

// Backend timestamps are RFC 3339, occasionally without an offset
fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

pub fn calculate_stats(tasks: &[Task]) -> TaskStats {
    let pending = |t: &&Task| !t.completed;
    TaskStats {
        total: tasks.len(),
        pending: tasks.iter().filter(pending).count(),
        completed: tasks.iter().filter(|t| t.completed).count(),
        high_priority: tasks
            .iter()
            .filter(|t| t.priority == Priority::High && !t.completed)
            .count(),
        medium_priority: tasks
            .iter()
            .filter(|t| t.priority == Priority::Medium && !t.completed)
            .count(),
        low_priority: tasks
            .iter()
            .filter(|t| t.priority == Priority::Low && !t.completed)
            .count(),
    }
}

pub fn extract_tags(tasks: &[Task]) -> Vec<String> {
    let mut tags: Vec<String> = tasks.iter().flat_map(|t| t.tags.iter().cloned()).collect();
    tags.sort();
    tags.dedup();
    tags
}
