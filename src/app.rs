use crate::scoring::FormReport;

/// Which page of the results dashboard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Questions,
    Responses,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Summary => View::Questions,
            View::Questions => View::Responses,
            View::Responses => View::Summary,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Summary => "Summary",
            View::Questions => "Questions",
            View::Responses => "Responses",
        }
    }
}

pub struct ResultsApp {
    pub view: View,
    report: FormReport,
    scroll: usize,
}

impl ResultsApp {
    pub fn new(report: FormReport) -> Self {
        Self {
            view: View::Summary,
            report,
            scroll: 0,
        }
    }

    pub fn report(&self) -> &FormReport {
        &self.report
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Switch to the next view and reset the scroll position.
    pub fn next_view(&mut self) {
        self.view = self.view.next();
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        if self.scroll + 1 < self.row_count() {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Scrollable rows in the current view.
    fn row_count(&self) -> usize {
        match self.view {
            View::Summary => 0,
            View::Questions => self.report.question_stats.len(),
            View::Responses => self.report.responses.len(),
        }
    }
}
