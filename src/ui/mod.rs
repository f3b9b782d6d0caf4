mod questions;
mod responses;
mod summary;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{ResultsApp, View};

const VIEWS: [View; 3] = [View::Summary, View::Questions, View::Responses];

pub fn render(frame: &mut Frame, app: &ResultsApp) {
    let area = frame.area();
    frame.render_widget(Block::default().bg(Color::Reset), area);

    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_header(frame, chunks[0], app);
    match app.view {
        View::Summary => summary::render(frame, chunks[1], app.report()),
        View::Questions => questions::render(frame, chunks[1], app.report(), app.scroll()),
        View::Responses => responses::render(frame, chunks[1], app.report(), app.scroll()),
    }
    render_controls(frame, chunks[2]);
}

/// Colour for a percentage, matching the grade bands.
pub(crate) fn grade_color(percentage: f64) -> Color {
    match percentage as u32 {
        90.. => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

/// A fixed-width bar of `█` and `░` for a 0..=100 percentage.
pub(crate) fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &ResultsApp) {
    let mut tabs = Vec::new();
    for view in VIEWS {
        let style = if view == app.view {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tabs.push(Span::styled(format!(" {} ", view.title()), style));
    }

    let content = vec![
        Line::from(Span::styled(
            app.report().title.clone(),
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(tabs),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("tab switch view  ·  j/k scroll  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
