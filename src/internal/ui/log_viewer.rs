use once_cell::sync::Lazy;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};
use regex::Regex;

use crate::internal::activity::{ActivityLog, SUCCESS_MARKER};

// Example: [2025-11-29 09:30:15] SUCCESS: Found unique: 'Alpha'
static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]\s?(.*)$").expect("valid activity line pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    pub fn parse(line: &str) -> Self {
        match LINE_RE.captures(line) {
            Some(caps) => Self {
                timestamp: caps[1].to_string(),
                message: caps[2].to_string(),
            },
            // Hand-edited or truncated lines are shown as they are.
            None => Self {
                timestamp: String::new(),
                message: line.to_string(),
            },
        }
    }

    fn style(&self) -> Style {
        let msg = self.message.as_str();
        if msg.starts_with(SUCCESS_MARKER) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if msg.starts_with("FAILURE:") || msg.starts_with("Error:") {
            Style::default().fg(Color::Red)
        } else if msg.starts_with("Duplicate:")
            || msg.starts_with("Skipped")
            || msg.starts_with("Warning:")
        {
            Style::default().fg(Color::Yellow)
        } else if msg.starts_with("---") {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

/// Scrollable view over the tail of the activity log.
pub struct LogViewer {
    pub entries: Vec<LogEntry>,
    /// Lines scrolled up from the bottom; 0 follows new output.
    pub scroll: u16,
    capacity: usize,
}

impl LogViewer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            scroll: 0,
            capacity,
        }
    }

    /// Replace the entries with the tail of `activity`.
    pub fn load(&mut self, activity: &ActivityLog) {
        self.entries = activity
            .tail(self.capacity)
            .iter()
            .map(|line| LogEntry::parse(line))
            .collect();
        self.scroll_to_bottom();
    }

    pub fn push(&mut self, line: &str) {
        self.entries.push(LogEntry::parse(line));
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(0..excess);
        }
    }

    pub fn scroll_up(&mut self) {
        let max = self.entries.len().saturating_sub(1) as u16;
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Activity ")
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1));
        let inner_height = block.inner(area).height as usize;

        let end = self.entries.len().saturating_sub(self.scroll as usize);
        let start = end.saturating_sub(inner_height);

        let lines: Vec<Line> = self.entries[start..end]
            .iter()
            .map(|entry| {
                let mut spans = Vec::with_capacity(2);
                if !entry.timestamp.is_empty() {
                    spans.push(Span::styled(
                        format!("{} ", entry.timestamp),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                spans.push(Span::styled(entry.message.clone(), entry.style()));
                Line::from(spans)
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}
