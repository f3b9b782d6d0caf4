use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::scoring::{FormReport, ResponseStatus};

use super::truncate;

const NAME_LENGTH: usize = 16;

pub fn render(frame: &mut Frame, area: Rect, report: &FormReport, scroll: usize) {
    let mut lines: Vec<Line> = report
        .responses
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(index, response)| {
            let name = response
                .student_name
                .as_deref()
                .unwrap_or(&response.student_id);
            Line::from(vec![
                Span::styled(
                    format!("{:3}. ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<20}", truncate(name, NAME_LENGTH)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>5.1}%  ", response.score),
                    Style::default().fg(status_color(response.status)),
                ),
                Span::styled(
                    format!("{:<10}", response.status.label()),
                    Style::default().fg(status_color(response.status)),
                ),
                Span::styled(
                    response.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No responses yet...",
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Responses ({}) ", report.response_count))
            .title_style(Style::default().fg(Color::Cyan))
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn status_color(status: ResponseStatus) -> Color {
    match status {
        ResponseStatus::Approved => Color::Green,
        ResponseStatus::Regular => Color::Yellow,
        ResponseStatus::Failed => Color::Red,
    }
}
