//! Per-question breakdown: share of correct answers and how often each
//! option was picked.

use ratatui::{
    prelude::*,
    widgets::{Block, Padding, Paragraph},
};

use crate::scoring::FormReport;

use super::{grade_color, progress_bar, truncate};

const QUESTION_PREVIEW_LENGTH: usize = 50;
const OPTION_PREVIEW_LENGTH: usize = 30;
const BAR_WIDTH: usize = 15;

pub fn render(frame: &mut Frame, area: Rect, report: &FormReport, scroll: usize) {
    if report.question_stats.is_empty() {
        let widget = Paragraph::new("No answers to break down yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray).italic());
        frame.render_widget(widget, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (index, stat) in report.question_stats.iter().enumerate().skip(scroll) {
        let color = grade_color(stat.percentage);
        lines.push(Line::from(vec![
            Span::styled(
                format!("Q{:<3}", index + 1),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                truncate(&stat.text, QUESTION_PREVIEW_LENGTH),
                Style::default().fg(Color::White),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(progress_bar(stat.percentage, BAR_WIDTH), Style::default().fg(color)),
            Span::styled(
                format!(" {}/{} correct ({:.0}%)", stat.correct, stat.total, stat.percentage),
                Style::default().fg(color),
            ),
        ]));

        for (option_index, count) in stat.option_counts.iter().enumerate() {
            let is_correct = option_index == stat.correct_answer;
            let letter = (b'A' + option_index as u8) as char;
            let text = stat
                .options
                .get(option_index)
                .map(|o| truncate(o, OPTION_PREVIEW_LENGTH))
                .unwrap_or_default();
            let style = if is_correct {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("      {} {}. ", if is_correct { "+" } else { " " }, letter),
                    style,
                ),
                Span::styled(format!("{:<32}", text), style),
                Span::styled(format!("{:>3}", count), Style::default().fg(Color::DarkGray)),
            ]));
        }
        lines.push(Line::from(""));
    }

    let widget = Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(1)));
    frame.render_widget(widget, area);
}
