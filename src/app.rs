use crate::api::ApiClient;
use crate::assistant::Assistant;
use crate::chat::ChatState;
use crate::models::{Priority, Task, TaskCreate, TaskUpdate};
use crate::parser::parse_task_input;
use crate::session::Session;
use crate::tasks::TaskStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::collections::HashSet;
use std::io;

#[derive(Clone, Copy, PartialEq)]
pub enum View {
    Login,
    Tasks,
    Chat,
}

pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Clone, Copy, PartialEq)]
pub enum Popup {
    None,
    AddTask,
    EditTask,
    Search,
    Assist,
}

#[derive(Clone, Copy, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
}

#[derive(Clone, Copy, PartialEq)]
pub enum LoginField {
    Name,
    Email,
    Password,
}

pub struct App {
    pub api: ApiClient,
    pub session: Option<Session>,
    pub view: View,
    pub input_mode: InputMode,
    pub popup: Popup,

    // Tasks view
    pub tasks: TaskStore,
    pub task_state: ListState,
    pub marked: HashSet<String>,
    pub active_input: ActiveInput,
    pub new_task_title: String,
    pub new_task_description: String,
    pub editing_task_id: Option<String>,
    pub search_input: String,

    // Quick AI assist
    pub assistant: Assistant,
    pub assist_input: String,

    // Chat view
    pub chat: ChatState,
    pub conv_state: ListState,
    pub chat_input: String,
    pub rename_input: String,
    pub chat_loaded: bool,

    // Login view
    pub signup_mode: bool,
    pub login_field: LoginField,
    pub login_name: String,
    pub login_email: String,
    pub login_password: String,
    pub login_error: Option<String>,
    pub login_busy: bool,
}

impl App {
    pub fn new(api: ApiClient, session: Option<Session>) -> App {
        let view = if session.is_some() {
            View::Tasks
        } else {
            View::Login
        };
        App {
            api,
            session,
            view,
            input_mode: InputMode::Normal,
            popup: Popup::None,
            tasks: TaskStore::new(),
            task_state: ListState::default(),
            marked: HashSet::new(),
            active_input: ActiveInput::Title,
            new_task_title: String::new(),
            new_task_description: String::new(),
            editing_task_id: None,
            search_input: String::new(),
            assistant: Assistant::new(),
            assist_input: String::new(),
            chat: ChatState::new(),
            conv_state: ListState::default(),
            chat_input: String::new(),
            rename_input: String::new(),
            chat_loaded: false,
            signup_mode: false,
            login_field: LoginField::Email,
            login_name: String::new(),
            login_email: String::new(),
            login_password: String::new(),
            login_error: None,
            login_busy: false,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user.id.clone())
    }

    // ---- task list selection ----

    /// The task list as currently rendered (filtered and sorted).
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.tasks.filtered()
    }

    pub fn selected_task(&self) -> Option<Task> {
        let visible = self.visible_tasks();
        self.task_state
            .selected()
            .and_then(|i| visible.get(i).cloned())
    }

    fn clamp_task_selection(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.task_state.select(None);
        } else {
            match self.task_state.selected() {
                Some(i) if i < len => {}
                _ => self.task_state.select(Some(len - 1)),
            }
        }
    }

    fn next_task(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.task_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.task_state.select(Some(i));
    }

    fn previous_task(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.task_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.task_state.select(Some(i));
    }

    fn next_conversation(&mut self) {
        let len = self.chat.conversations.len();
        if len == 0 {
            return;
        }
        let i = match self.conv_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.conv_state.select(Some(i));
    }

    fn previous_conversation(&mut self) {
        let len = self.chat.conversations.len();
        if len == 0 {
            return;
        }
        let i = match self.conv_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.conv_state.select(Some(i));
    }

    // ---- startup ----

    pub async fn initial_load(&mut self) {
        if let Some(session) = &self.session {
            self.api.set_token(Some(session.token.clone()));
            // Stored token may have expired; drop to login if so
            match self.api.me().await {
                Ok(user) => {
                    let mut session = session.clone();
                    session.user = user;
                    self.session = Some(session);
                }
                Err(err) if err.is_auth_failure() => {
                    self.logout();
                    return;
                }
                Err(_) => {}
            }
            self.tasks.refresh(&self.api).await;
            if !self.tasks.tasks().is_empty() {
                self.task_state.select(Some(0));
            }
        }
    }

    fn logout(&mut self) {
        Session::clear();
        self.session = None;
        self.api.set_token(None);
        self.view = View::Login;
        self.input_mode = InputMode::Normal;
        self.popup = Popup::None;
        self.tasks = TaskStore::new();
        self.chat = ChatState::new();
        self.assistant.clear();
        self.marked.clear();
        self.chat_loaded = false;
    }

    async fn after_auth(&mut self, session: Session) {
        if let Err(err) = session.save() {
            self.login_error = Some(err.to_string());
        }
        self.api.set_token(Some(session.token.clone()));
        self.session = Some(session);
        self.view = View::Tasks;
        self.login_password.clear();
        self.login_error = None;
        self.tasks.refresh(&self.api).await;
        if !self.tasks.tasks().is_empty() {
            self.task_state.select(Some(0));
        }
    }

    // ---- input dispatch ----

    pub async fn handle_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        match self.view {
            View::Login => self.handle_login_input(key).await,
            View::Tasks => self.handle_tasks_input(key).await,
            View::Chat => self.handle_chat_input(key).await,
        }
    }

    async fn handle_login_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.signup_mode = !self.signup_mode;
            self.login_field = if self.signup_mode {
                LoginField::Name
            } else {
                LoginField::Email
            };
            return Ok(false);
        }

        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Tab => {
                self.login_field = match (self.login_field, self.signup_mode) {
                    (LoginField::Name, _) => LoginField::Email,
                    (LoginField::Email, _) => LoginField::Password,
                    (LoginField::Password, true) => LoginField::Name,
                    (LoginField::Password, false) => LoginField::Email,
                };
            }
            KeyCode::Enter => {
                self.submit_login().await;
            }
            KeyCode::Char(c) => match self.login_field {
                LoginField::Name => self.login_name.push(c),
                LoginField::Email => self.login_email.push(c),
                LoginField::Password => self.login_password.push(c),
            },
            KeyCode::Backspace => {
                match self.login_field {
                    LoginField::Name => self.login_name.pop(),
                    LoginField::Email => self.login_email.pop(),
                    LoginField::Password => self.login_password.pop(),
                };
            }
            _ => {}
        }
        Ok(false)
    }

    async fn submit_login(&mut self) {
        if self.login_email.trim().is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password are required.".to_string());
            return;
        }
        if self.signup_mode && self.login_name.trim().is_empty() {
            self.login_error = Some("Name is required to sign up.".to_string());
            return;
        }

        self.login_busy = true;
        self.login_error = None;

        let result = if self.signup_mode {
            self.api
                .signup(
                    self.login_name.trim(),
                    self.login_email.trim(),
                    &self.login_password,
                )
                .await
        } else {
            self.api
                .login(self.login_email.trim(), &self.login_password)
                .await
        };

        match result {
            Ok(auth) => {
                self.after_auth(Session::new(auth.token, auth.user)).await;
            }
            Err(err) => self.login_error = Some(err.to_string()),
        }

        self.login_busy = false;
    }

    async fn handle_tasks_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        match self.popup {
            Popup::None => return self.handle_tasks_normal(key).await,
            Popup::AddTask | Popup::EditTask => self.handle_task_editor(key).await,
            Popup::Search => self.handle_search_input(key),
            Popup::Assist => self.handle_assist_input(key).await,
        }
        Ok(false)
    }

    async fn handle_tasks_normal(&mut self, key: KeyEvent) -> io::Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.next_task(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_task(),
            KeyCode::Char('r') => {
                self.tasks.refresh(&self.api).await;
                self.clamp_task_selection();
            }
            KeyCode::Char('a') => {
                self.popup = Popup::AddTask;
                self.input_mode = InputMode::Editing;
                self.active_input = ActiveInput::Title;
                self.new_task_title.clear();
                self.new_task_description.clear();
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    self.popup = Popup::EditTask;
                    self.input_mode = InputMode::Editing;
                    self.active_input = ActiveInput::Title;
                    self.editing_task_id = Some(task.id.clone());
                    self.new_task_title = task.title.clone();
                    self.new_task_description = task.description.clone().unwrap_or_default();
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.selected_task() {
                    self.tasks.delete(&self.api, &task.id).await;
                    self.marked.remove(&task.id);
                    self.clamp_task_selection();
                }
            }
            KeyCode::Char(' ') => {
                if let Some(task) = self.selected_task() {
                    self.tasks.toggle_complete(&self.api, &task.id).await;
                }
            }
            KeyCode::Char('m') => {
                if let Some(task) = self.selected_task() {
                    if !self.marked.remove(&task.id) {
                        self.marked.insert(task.id.clone());
                    }
                }
            }
            KeyCode::Char('D') => {
                if !self.marked.is_empty() {
                    let ids: Vec<String> = self.marked.iter().cloned().collect();
                    if self.tasks.delete_many(&self.api, &ids).await {
                        self.marked.clear();
                    }
                    self.clamp_task_selection();
                }
            }
            KeyCode::Char('C') => {
                if !self.marked.is_empty() {
                    let ids: Vec<String> = self.marked.iter().cloned().collect();
                    if self.tasks.complete_many(&self.api, &ids).await {
                        self.marked.clear();
                    }
                }
            }
            KeyCode::Char('R') => {
                if let Some(task) = self.selected_task() {
                    if task.reminder.is_some() {
                        let updates = TaskUpdate {
                            remove_reminder: Some(true),
                            ..TaskUpdate::default()
                        };
                        self.tasks.update(&self.api, &task.id, &updates).await;
                    }
                }
            }
            KeyCode::Char('/') => {
                self.popup = Popup::Search;
                self.search_input = self.tasks.filters.search.clone();
            }
            KeyCode::Char('f') => {
                self.tasks.filters.priority = match self.tasks.filters.priority {
                    None => Some(Priority::High),
                    Some(Priority::High) => Some(Priority::Medium),
                    Some(Priority::Medium) => Some(Priority::Low),
                    Some(Priority::Low) => None,
                };
                self.clamp_task_selection();
            }
            KeyCode::Char('s') => {
                self.tasks.filters.status = self.tasks.filters.status.next();
                self.clamp_task_selection();
            }
            KeyCode::Char('o') => {
                self.tasks.filters.sort_by = self.tasks.filters.sort_by.next();
            }
            KeyCode::Char('t') => {
                self.cycle_tag_filter();
                self.clamp_task_selection();
            }
            KeyCode::Char('x') => {
                self.tasks.clear_filters();
                self.clamp_task_selection();
            }
            KeyCode::Char('i') => {
                self.popup = Popup::Assist;
                self.assist_input.clear();
            }
            KeyCode::Char('c') | KeyCode::Tab => {
                self.view = View::Chat;
                if !self.chat_loaded {
                    if let Some(user_id) = self.user_id() {
                        self.chat.load_conversations(&self.api, &user_id).await;
                        self.chat_loaded = true;
                    }
                }
            }
            KeyCode::Char('L') => self.logout(),
            _ => {}
        }
        Ok(false)
    }

    fn cycle_tag_filter(&mut self) {
        let tags = self.tasks.available_tags();
        if tags.is_empty() {
            self.tasks.filters.tag = None;
            return;
        }
        self.tasks.filters.tag = match &self.tasks.filters.tag {
            None => Some(tags[0].clone()),
            Some(current) => tags
                .iter()
                .position(|t| t == current)
                .and_then(|i| tags.get(i + 1))
                .cloned(),
        };
    }

    async fn handle_task_editor(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Editing => match key.code {
                KeyCode::Char('i') => self.input_mode = InputMode::Insert,
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => self.submit_task_editor().await,
                KeyCode::Esc => self.close_task_editor(),
                _ => {}
            },
            InputMode::Insert => match key.code {
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Title => self.new_task_title.push(c),
                    ActiveInput::Description => self.new_task_description.push(c),
                },
                KeyCode::Backspace => {
                    match self.active_input {
                        ActiveInput::Title => self.new_task_title.pop(),
                        ActiveInput::Description => self.new_task_description.pop(),
                    };
                }
                KeyCode::Enter => self.submit_task_editor().await,
                KeyCode::Esc => self.input_mode = InputMode::Editing,
                _ => {}
            },
            InputMode::Normal => {}
        }
    }

    async fn submit_task_editor(&mut self) {
        if self.new_task_title.trim().is_empty() {
            return;
        }
        let parsed = parse_task_input(&self.new_task_title);
        let description = if self.new_task_description.trim().is_empty() {
            None
        } else {
            Some(self.new_task_description.clone())
        };

        match self.popup {
            Popup::AddTask => {
                let draft = TaskCreate {
                    title: parsed.title,
                    description,
                    priority: parsed.priority,
                    tags: if parsed.tags.is_empty() {
                        None
                    } else {
                        Some(parsed.tags)
                    },
                    reminder: parsed.reminder,
                };
                if self.tasks.create(&self.api, &draft).await.is_some() {
                    self.task_state.select(Some(0));
                    self.close_task_editor();
                }
            }
            Popup::EditTask => {
                if let Some(id) = self.editing_task_id.clone() {
                    let updates = TaskUpdate {
                        title: Some(parsed.title),
                        description,
                        priority: parsed.priority,
                        tags: if parsed.tags.is_empty() {
                            None
                        } else {
                            Some(parsed.tags)
                        },
                        reminder: parsed.reminder,
                        ..TaskUpdate::default()
                    };
                    if self.tasks.update(&self.api, &id, &updates).await.is_some() {
                        self.close_task_editor();
                    }
                }
            }
            _ => {}
        }
    }

    fn close_task_editor(&mut self) {
        self.popup = Popup::None;
        self.input_mode = InputMode::Normal;
        self.editing_task_id = None;
        self.new_task_title.clear();
        self.new_task_description.clear();
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.search_input.push(c),
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Enter => {
                self.tasks.filters.search = self.search_input.trim().to_string();
                self.popup = Popup::None;
                self.clamp_task_selection();
            }
            KeyCode::Esc => {
                self.popup = Popup::None;
            }
            _ => {}
        }
    }

    async fn handle_assist_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.assist_input.push(c),
            KeyCode::Backspace => {
                self.assist_input.pop();
            }
            KeyCode::Enter => {
                let message = self.assist_input.clone();
                if self.assistant.send(&self.api, &message).await.is_some() {
                    // The backend created a task; pick it up
                    self.tasks.refresh(&self.api).await;
                    self.clamp_task_selection();
                }
                self.assist_input.clear();
            }
            KeyCode::Esc => {
                self.assistant.clear_error();
                self.popup = Popup::None;
            }
            _ => {}
        }
    }

    fn selected_conversation_id(&self) -> Option<String> {
        self.conv_state
            .selected()
            .and_then(|i| self.chat.conversations.get(i))
            .map(|c| c.id.clone())
    }

    async fn handle_chat_input(&mut self, key: KeyEvent) -> io::Result<bool> {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Esc | KeyCode::Tab => {
                    self.view = View::Tasks;
                }
                KeyCode::Char('j') | KeyCode::Down => self.next_conversation(),
                KeyCode::Char('k') | KeyCode::Up => self.previous_conversation(),
                KeyCode::Enter => {
                    if let (Some(id), Some(user_id)) =
                        (self.selected_conversation_id(), self.user_id())
                    {
                        self.chat.open_conversation(&self.api, &user_id, &id).await;
                    }
                }
                KeyCode::Char('n') => {
                    self.chat.new_chat();
                    self.conv_state.select(None);
                }
                KeyCode::Char('e') => {
                    if let Some(i) = self.conv_state.selected() {
                        if let Some(conversation) = self.chat.conversations.get(i) {
                            self.rename_input = conversation.title.clone();
                            self.input_mode = InputMode::Editing;
                        }
                    }
                }
                KeyCode::Char('d') => {
                    if let (Some(id), Some(user_id)) =
                        (self.selected_conversation_id(), self.user_id())
                    {
                        self.chat
                            .delete_conversation(&self.api, &user_id, &id)
                            .await;
                        let len = self.chat.conversations.len();
                        if len == 0 {
                            self.conv_state.select(None);
                        } else if let Some(i) = self.conv_state.selected() {
                            if i >= len {
                                self.conv_state.select(Some(len - 1));
                            }
                        }
                    }
                }
                KeyCode::Char('r') => {
                    if let Some(user_id) = self.user_id() {
                        self.chat.load_conversations(&self.api, &user_id).await;
                    }
                }
                KeyCode::Char('i') => self.input_mode = InputMode::Insert,
                _ => {}
            },
            InputMode::Insert => match key.code {
                KeyCode::Char(c) => self.chat_input.push(c),
                KeyCode::Backspace => {
                    self.chat_input.pop();
                }
                KeyCode::Enter => {
                    let content = self.chat_input.clone();
                    if let Some(user_id) = self.user_id() {
                        if self.chat.send(&self.api, &user_id, &content).await {
                            self.chat_input.clear();
                        }
                    }
                }
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                _ => {}
            },
            InputMode::Editing => match key.code {
                KeyCode::Char(c) => self.rename_input.push(c),
                KeyCode::Backspace => {
                    self.rename_input.pop();
                }
                KeyCode::Enter => {
                    let title = self.rename_input.trim().to_string();
                    if let (Some(id), Some(user_id)) =
                        (self.selected_conversation_id(), self.user_id())
                    {
                        if !title.is_empty() {
                            self.chat
                                .rename_conversation(&self.api, &user_id, &id, &title)
                                .await;
                        }
                    }
                    self.input_mode = InputMode::Normal;
                    self.rename_input.clear();
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.rename_input.clear();
                }
                _ => {}
            },
        }
        Ok(false)
    }
}
