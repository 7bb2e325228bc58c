use crate::models::{Priority, ReminderDraft};
use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub reminder: Option<ReminderDraft>,
}

/// Parse quick-add input into task fields.
///
/// Inline tokens: `!high`/`!medium`/`!low` set the priority, `#tag` collects
/// tags, `@YYYY-MM-DD` (optionally followed by `HH:MM`) attaches a reminder.
/// Tokens are stripped from the title and the first occurrence wins for
/// priority and reminder.
pub fn parse_task_input(input: &str) -> ParsedTask {
    let priority_re = Regex::new(r"!(high|medium|low)\b\s*").unwrap();
    let tag_re = Regex::new(r"#([A-Za-z0-9_-]+)\s*").unwrap();
    let reminder_re = Regex::new(r"@(\d{4}-\d{2}-\d{2})(?:\s+(\d{2}:\d{2}))?\s*").unwrap();

    let mut priority = None;
    for caps in priority_re.captures_iter(input) {
        if priority.is_none() {
            priority = match &caps[1] {
                "high" => Some(Priority::High),
                "medium" => Some(Priority::Medium),
                "low" => Some(Priority::Low),
                _ => None,
            };
        }
    }

    let mut tags = Vec::new();
    for caps in tag_re.captures_iter(input) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut reminder = None;
    for caps in reminder_re.captures_iter(input) {
        if reminder.is_none() {
            let date = caps[1].to_string();
            // Dates that don't exist on the calendar are left in the title
            if let Some(day) = weekday_label(&date) {
                reminder = Some(ReminderDraft {
                    reminder_date: date,
                    reminder_time: caps
                        .get(2)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_else(|| "09:00".to_string()),
                    reminder_day: Some(day),
                });
            }
        }
    }

    let title = priority_re.replace_all(input, "");
    let title = tag_re.replace_all(&title, "");
    let title = if reminder.is_some() {
        reminder_re.replace_all(&title, "").to_string()
    } else {
        title.to_string()
    };

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTask {
        title,
        priority,
        tags,
        reminder,
    }
}

/// Weekday label for a `YYYY-MM-DD` date, or None if it isn't a real date.
pub fn weekday_label(date: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let label = match parsed.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    Some(label.to_string())
}
