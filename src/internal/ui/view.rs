use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use super::app::App;
use crate::internal::notification::NotificationKind;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub fn draw(app: &mut App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(chunks[1]);

    render_topics(app, f, body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(body[1]);

    render_stats(app, f, right[0]);
    app.log_viewer.render(f, right[1]);

    render_status_bar(app, f, chunks[2]);

    if app.notification.is_some() {
        render_notification(app, f);
    }
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let status = match (app.searching, app.progress) {
        (true, Some((attempt, max))) => {
            let spin = SPINNER[attempt as usize % SPINNER.len()];
            format!("{} Searching... attempt {}/{}", spin, attempt, max)
        }
        (true, None) => "Searching...".to_string(),
        (false, _) => "Ready".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Infinite Wiki v{} ", app.app_version),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(status, Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_topics(app: &mut App, f: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .topics
        .iter()
        .map(|topic| ListItem::new(topic.replace('_', " ")))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Select Topic ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.topic_state);
}

fn render_stats(app: &App, f: &mut Frame, area: Rect) {
    let value = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(vec![
            Span::raw("Total seen: "),
            Span::styled(app.stats.total.to_string(), value),
        ]),
        Line::from(vec![
            Span::raw("Today:      "),
            Span::styled(app.stats.today.to_string(), value),
        ]),
    ];

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Stats ").borders(Borders::ALL)),
        area,
    );
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let roll_hint = match app.searching {
        true => "searching...",
        false => "Enter/r: roll",
    };
    let text = format!(
        " {} | j/k: topic | PgUp/PgDn: scroll log | q: quit | {}",
        roll_hint,
        app.storage.dir().display()
    );
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_notification(app: &App, f: &mut Frame) {
    if let Some(notification) = &app.notification {
        let area = f.area();

        let popup_width = (notification.message.len() as u16 + 4).min(area.width.saturating_sub(4));
        let popup_height = 3;
        let popup_x = (area.width.saturating_sub(popup_width)) / 2;
        let popup_y = (area.height.saturating_sub(popup_height)) / 2;
        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

        let bg_color = match notification.kind {
            NotificationKind::Info => Color::Blue,
            NotificationKind::Error => Color::Red,
        };

        let popup = Paragraph::new(notification.message.as_str())
            .style(
                Style::default()
                    .bg(bg_color)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(notification.kind.title()),
            )
            .alignment(Alignment::Center);

        f.render_widget(Clear, popup_area);
        f.render_widget(popup, popup_area);
    }
}
