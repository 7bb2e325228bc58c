use crate::app::{ActiveInput, App, InputMode, LoginField, Popup, View};
use crate::assistant::EntryKind;
use crate::models::{Priority, Role};
use crossterm::event::{self, Event as CEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                let should_quit = app.handle_input(key).await?;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(size);

    let body_chunk = chunks[0];
    let footer_chunk = chunks[1];

    match app.view {
        View::Login => draw_login(f, app, body_chunk),
        View::Tasks => draw_tasks(f, app, body_chunk),
        View::Chat => draw_chat(f, app, body_chunk),
    }

    let legend = Paragraph::new(get_legend(app))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, footer_chunk);
}

// ---- login ----

fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_absolute(50, 12, area);
    let title = if app.signup_mode {
        "Sign up for ObsidianList"
    } else {
        "Log in to ObsidianList"
    };

    let field_line = |label: &str, value: &str, field: LoginField, mask: bool| {
        let marker = if app.login_field == field { "> " } else { "  " };
        let shown = if mask {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let style = if app.login_field == field {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(marker.to_string()),
            Span::styled(format!("{:<10}", label), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(shown, style),
        ])
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(""));
    if app.signup_mode {
        lines.push(field_line("Name", &app.login_name, LoginField::Name, false));
    }
    lines.push(field_line("Email", &app.login_email, LoginField::Email, false));
    lines.push(field_line(
        "Password",
        &app.login_password,
        LoginField::Password,
        true,
    ));
    lines.push(Line::from(""));

    if app.login_busy {
        lines.push(Line::from(Span::styled(
            "  Signing in...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(error) = &app.login_error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));
    let form = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(form, popup_area);
}

// ---- tasks ----

fn draw_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    draw_stats_bar(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[1]);

    let visible = app.visible_tasks();

    let list_title = if app.tasks.has_active_filters() {
        "Tasks (filtered)".to_string()
    } else {
        "Tasks".to_string()
    };

    let tasks_widget = if !visible.is_empty() {
        let items: Vec<ListItem> = visible
            .iter()
            .map(|task| {
                let mut spans: Vec<Span> = Vec::new();
                if app.marked.contains(&task.id) {
                    spans.push(Span::styled("* ", Style::default().fg(Color::Magenta)));
                }
                if task.completed {
                    spans.push(Span::styled("DONE ", Style::default().fg(Color::Green)));
                }
                spans.push(Span::styled(
                    format!("[{}] ", priority_tag(task.priority)),
                    Style::default().fg(priority_color(task.priority)),
                ));
                spans.push(Span::raw(task.title.clone()));
                if task.reminder.is_some() {
                    spans.push(Span::styled(" ⏰", Style::default().fg(Color::Yellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(list_title))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    } else {
        let placeholder = if app.tasks.is_loading {
            "Loading tasks..."
        } else if app.tasks.has_active_filters() {
            "No tasks match the current filters"
        } else {
            "No tasks yet. Press 'a' to add one or 'i' to ask the assistant."
        };
        List::new(vec![ListItem::new(placeholder)])
            .block(Block::default().borders(Borders::ALL).title(list_title))
    };

    f.render_stateful_widget(tasks_widget, body[0], &mut app.task_state);

    draw_task_detail(f, app, body[1]);

    match app.popup {
        Popup::AddTask | Popup::EditTask => draw_task_editor(f, app, area),
        Popup::Search => draw_search_popup(f, app, area),
        Popup::Assist => draw_assist_popup(f, app, area),
        Popup::None => {}
    }
}

fn draw_stats_bar(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.tasks.stats();
    let filters = &app.tasks.filters;

    let mut spans = vec![
        Span::styled(
            format!(" {} total ", stats.total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| {} pending | {} done ", stats.pending, stats.completed)),
        Span::styled(
            format!("| {} high ", stats.high_priority),
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            format!("| {} medium ", stats.medium_priority),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("| {} low ", stats.low_priority),
            Style::default().fg(Color::Blue),
        ),
        Span::raw(format!("| sort: {} ", filters.sort_by.label())),
        Span::raw(format!("| status: {} ", filters.status.label())),
    ];
    if let Some(priority) = filters.priority {
        spans.push(Span::raw(format!("| priority: {} ", priority.as_str())));
    }
    if let Some(tag) = &filters.tag {
        spans.push(Span::raw(format!("| tag: #{} ", tag)));
    }
    if !filters.search.is_empty() {
        spans.push(Span::raw(format!("| search: \"{}\" ", filters.search)));
    }

    let title = match &app.session {
        Some(session) => format!("ObsidianList — {}", session.user.name),
        None => "ObsidianList".to_string(),
    };

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(bar, area);
}

fn draw_task_detail(f: &mut Frame, app: &App, area: Rect) {
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");

    let Some(task) = app.selected_task() else {
        let paragraph = Paragraph::new("Select a task to view details")
            .block(detail_block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let mut lines: Vec<Line<'static>> = Vec::new();

    lines.push(Line::from(Span::styled(
        task.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled("Priority: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            task.priority.as_str().to_string(),
            Style::default().fg(priority_color(task.priority)),
        ),
    ]));

    let status = if task.completed {
        match &task.completion_date {
            Some(date) => format!("completed on {}", date),
            None => "completed".to_string(),
        }
    } else {
        "pending".to_string()
    };
    lines.push(Line::from(vec![
        Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(status),
    ]));

    lines.push(Line::from(vec![Span::styled(
        "Tags: ",
        Style::default().add_modifier(Modifier::BOLD),
    )]));
    if task.tags.is_empty() {
        lines.push(Line::from(Span::raw("No tags".to_string())));
    } else {
        let mut tag_spans: Vec<Span<'static>> = Vec::new();
        for (i, tag) in task.tags.iter().enumerate() {
            if i > 0 {
                tag_spans.push(Span::raw(" ".to_string()));
            }
            tag_spans.push(Span::styled(
                format!(" {} ", tag),
                Style::default().bg(Color::Yellow).fg(Color::Black),
            ));
        }
        lines.push(Line::from(tag_spans));
    }

    lines.push(Line::from(vec![Span::styled(
        "Reminder: ",
        Style::default().add_modifier(Modifier::BOLD),
    )]));
    match &task.reminder {
        Some(reminder) => {
            let sent = if reminder.sent { " (sent)" } else { "" };
            lines.push(Line::from(Span::raw(format!(
                "{} {} at {}{}",
                reminder.reminder_day, reminder.reminder_date, reminder.reminder_time, sent
            ))));
        }
        None => lines.push(Line::from(Span::raw("No reminder".to_string()))),
    }

    lines.push(Line::from(vec![Span::styled(
        "Description: ",
        Style::default().add_modifier(Modifier::BOLD),
    )]));
    match &task.description {
        Some(desc) if !desc.trim().is_empty() => {
            for line in desc.lines() {
                lines.push(Line::from(Span::raw(line.to_string())));
            }
        }
        _ => lines.push(Line::from(Span::raw("No description".to_string()))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Created {}", task.created_at),
        Style::default().fg(Color::DarkGray),
    )));

    if let Some(error) = &app.tasks.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_task_editor(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(60, 40, area);
    let title = match app.popup {
        Popup::EditTask => "Edit Task (Tab: switch field, Enter: save)",
        _ => "New Task (!priority #tag @date, Tab: switch field, Enter: save)",
    };

    let popup_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(popup_area);

    let field_style = |field: ActiveInput| {
        if app.active_input == field {
            match app.input_mode {
                InputMode::Insert => Style::default().fg(Color::Yellow),
                _ => Style::default().fg(Color::Green),
            }
        } else {
            Style::default().fg(Color::White)
        }
    };

    let title_input = Paragraph::new(Text::from(app.new_task_title.as_str()))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title")
                .style(field_style(ActiveInput::Title)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(title_input, inner[0]);

    let description_input = Paragraph::new(Text::from(app.new_task_description.as_str()))
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Description")
                .style(field_style(ActiveInput::Description)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(description_input, inner[1]);
}

fn draw_search_popup(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_absolute(60, 3, area);
    let popup_block = Block::default()
        .title("Search title/description (Enter: apply, Esc: cancel)")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let input = Paragraph::new(Text::from(app.search_input.as_str()))
        .style(Style::default().fg(Color::White))
        .block(popup_block);

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_assist_popup(f: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect(70, 70, area);

    let popup_block = Block::default()
        .title("AI Task Assistant")
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(popup_area);

    let mut lines: Vec<Line<'static>> = Vec::new();
    if app.assistant.entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "Describe a task in plain language, e.g. \"remind me to buy groceries tomorrow, high priority\"",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for entry in &app.assistant.entries {
        let (label, style) = match entry.kind {
            EntryKind::User => ("you", Style::default().fg(Color::Cyan)),
            EntryKind::Assistant => ("assistant", Style::default().fg(Color::Green)),
            EntryKind::Error => ("error", Style::default().fg(Color::Red)),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] {} ", entry.timestamp.format("%H:%M"), label),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::raw(entry.content.clone()),
        ]));
        if let Some(task) = &entry.task_created {
            lines.push(Line::from(Span::styled(
                format!("    created \"{}\" ({})", task.title, task.priority),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    if app.assistant.is_processing {
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let transcript = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(transcript, inner[0]);

    let input = Paragraph::new(Text::from(app.assist_input.as_str()))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(input, inner[1]);
}

// ---- chat ----

fn draw_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(area);

    let conv_title = if app.chat.is_loading_conversations {
        "Conversations (loading...)"
    } else {
        "Conversations"
    };

    let conversations_widget = if !app.chat.conversations.is_empty() {
        let items: Vec<ListItem> = app
            .chat
            .conversations
            .iter()
            .map(|conversation| {
                let mut lines = vec![Line::from(Span::styled(
                    conversation.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if let Some(preview) = &conversation.last_message {
                    lines.push(Line::from(Span::styled(
                        truncate(preview, 40),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        List::new(items)
            .block(Block::default().borders(Borders::ALL).title(conv_title))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    } else {
        List::new(vec![ListItem::new("No conversations yet")])
            .block(Block::default().borders(Borders::ALL).title(conv_title))
    };

    f.render_stateful_widget(conversations_widget, chunks[0], &mut app.conv_state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(chunks[1]);

    let chat_title = match app.chat.current_conversation_id {
        Some(_) => "Chat",
        None => "Chat (new conversation)",
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    if app.chat.is_loading_messages {
        lines.push(Line::from(Span::styled(
            "Loading messages...",
            Style::default().fg(Color::Yellow),
        )));
    } else if app.chat.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask the assistant to create, list, or complete tasks for you.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for message in &app.chat.messages {
        let (label, style) = match message.role {
            Role::User => ("you", Style::default().fg(Color::Cyan)),
            Role::Assistant => ("assistant", Style::default().fg(Color::Green)),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", label),
            style.add_modifier(Modifier::BOLD),
        )));
        for content_line in message.content.lines() {
            lines.push(Line::from(Span::raw(format!("  {}", content_line))));
        }
        if let Some(tool_calls) = &message.tool_calls {
            for call in &tool_calls.calls {
                lines.push(Line::from(Span::styled(
                    format!("  [{} -> {}]", call.tool, call.result.status),
                    Style::default().fg(Color::Magenta),
                )));
            }
        }
        lines.push(Line::from(""));
    }
    if app.chat.is_sending {
        lines.push(Line::from(Span::styled(
            "Assistant is typing...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(error) = &app.chat.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    // Keep the tail of the transcript in view
    let height = right[0].height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line<'static>> = lines.into_iter().skip(skip).collect();

    let messages_widget = Paragraph::new(visible)
        .block(Block::default().borders(Borders::ALL).title(chat_title))
        .wrap(Wrap { trim: false });
    f.render_widget(messages_widget, right[0]);

    let input_style = match app.input_mode {
        InputMode::Insert => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::White),
    };
    let input = Paragraph::new(Text::from(app.chat_input.as_str())).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Message (i to type, Enter to send)")
            .style(input_style),
    );
    f.render_widget(input, right[1]);

    if matches!(app.input_mode, InputMode::Editing) {
        let popup_area = centered_rect_absolute(50, 3, area);
        let rename = Paragraph::new(Text::from(app.rename_input.as_str()))
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .title("Rename conversation (Enter: save, Esc: cancel)")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Green)),
            );
        f.render_widget(Clear, popup_area);
        f.render_widget(rename, popup_area);
    }
}

// ---- helpers ----

fn priority_tag(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "H",
        Priority::Medium => "M",
        Priority::Low => "L",
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Blue,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}…", kept)
    }
}

fn get_legend(app: &App) -> Text<'static> {
    let key = |k: &str| Span::styled(format!(" {} ", k), Style::default().fg(Color::Red));
    let label = |l: &str| Span::raw(format!(": {} ", l));

    match app.view {
        View::Login => Text::from(Line::from(vec![
            key("Tab"),
            label("Next Field"),
            key("Enter"),
            label("Submit"),
            key("Ctrl-s"),
            label(if app.signup_mode {
                "Switch to Login"
            } else {
                "Switch to Signup"
            }),
            key("Esc"),
            label("Quit"),
        ])),
        View::Tasks => match app.popup {
            Popup::None => Text::from(Line::from(vec![
                key("q"),
                label("Quit"),
                key("j/k"),
                label("Move"),
                key("Space"),
                label("Toggle Done"),
                key("a"),
                label("Add"),
                key("e"),
                label("Edit"),
                key("d"),
                label("Delete"),
                key("m"),
                label("Mark"),
                key("D/C"),
                label("Delete/Complete Marked"),
                key("/"),
                label("Search"),
                key("f/s/t"),
                label("Filter"),
                key("o"),
                label("Sort"),
                key("x"),
                label("Clear Filters"),
                key("i"),
                label("AI Assist"),
                key("Tab"),
                label("Chat"),
                key("L"),
                label("Logout"),
            ])),
            Popup::AddTask | Popup::EditTask => Text::from(Line::from(vec![
                key("i"),
                label("Insert"),
                key("Tab"),
                label("Switch Field"),
                key("Enter"),
                label("Submit"),
                key("Esc"),
                label("Cancel"),
            ])),
            Popup::Search | Popup::Assist => Text::from(Line::from(vec![
                key("Enter"),
                label("Submit"),
                key("Esc"),
                label("Close"),
            ])),
        },
        View::Chat => match app.input_mode {
            InputMode::Insert => Text::from(Line::from(vec![
                key("Enter"),
                label("Send"),
                key("Esc"),
                label("Stop Typing"),
            ])),
            InputMode::Editing => Text::from(Line::from(vec![
                key("Enter"),
                label("Save"),
                key("Esc"),
                label("Cancel"),
            ])),
            InputMode::Normal => Text::from(Line::from(vec![
                key("q"),
                label("Quit"),
                key("j/k"),
                label("Move"),
                key("Enter"),
                label("Open"),
                key("n"),
                label("New Chat"),
                key("e"),
                label("Rename"),
                key("d"),
                label("Delete"),
                key("r"),
                label("Refresh"),
                key("i"),
                label("Type Message"),
                key("Tab"),
                label("Tasks"),
            ])),
        },
    }
}

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(r.height.saturating_sub(height) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length(r.width.saturating_sub(width) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}
