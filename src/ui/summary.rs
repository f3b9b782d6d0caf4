use ratatui::{
    prelude::*,
    widgets::{Block, Padding, Paragraph},
};

use crate::models::Subject;
use crate::scoring::FormReport;

use super::{grade_color, progress_bar};

pub fn render(frame: &mut Frame, area: Rect, report: &FormReport) {
    let subject = Subject::find(&report.subject)
        .map(|s| s.name)
        .unwrap_or_else(|| report.subject.clone());

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "RESULTS",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Subject: ", Style::default().fg(Color::DarkGray)),
            Span::styled(subject, Style::default().fg(Color::Gray)),
        ]),
        Line::from(vec![
            Span::styled("Questions: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                report.question_count.to_string(),
                Style::default().fg(Color::Gray),
            ),
            Span::styled("   Responses: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                report.response_count.to_string(),
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::from(""),
    ];

    if report.response_count == 0 {
        content.push(Line::from(Span::styled(
            "No responses yet",
            Style::default().fg(Color::DarkGray).italic(),
        )));
    } else {
        let color = grade_color(report.average_score);
        content.push(Line::from(Span::styled(
            format!(
                "Average {:.0}%  ·  {}",
                report.average_score,
                report.grade().label()
            ),
            Style::default().fg(color).bold(),
        )));
        content.push(Line::from(Span::styled(
            progress_bar(report.average_score, 30),
            Style::default().fg(color),
        )));
    }

    let widget = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(Block::default().padding(Padding::horizontal(1)));
    frame.render_widget(widget, area);
}
