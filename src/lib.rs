//! # quiz-forms
//!
//! Multiple-choice quiz forms for teachers and students: authoring, one-shot
//! submissions with automatic scoring, and per-form results, served as a JSON
//! protocol over WebSocket.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quiz_forms::services::FormService;
//! use quiz_forms::storage::Storage;
//!
//! fn main() -> quiz_forms::Result<()> {
//!     let storage = Arc::new(Storage::open("data")?);
//!     storage.initialize()?;
//!
//!     let forms = FormService::new(storage);
//!     for form in forms.all_forms()? {
//!         println!("{} ({} questions)", form.title, form.questions.len());
//!     }
//!     Ok(())
//! }
//! ```

mod app;
pub mod config;
pub mod data;
mod error;
pub mod models;
pub mod protocol;
pub mod scoring;
pub mod server;
pub mod services;
pub mod storage;
pub mod terminal;
mod ui;

use std::path::Path;
use std::sync::Arc;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

pub use app::{ResultsApp, View};
pub use config::Config;
pub use error::{AuthError, Error, Result, ValidationError};

use scoring::FormReport;
use services::FormService;
use storage::Storage;

/// Read-only terminal view of one form's results.
pub struct ResultsDashboard {
    app: ResultsApp,
}

impl ResultsDashboard {
    pub fn new(report: FormReport) -> Self {
        Self {
            app: ResultsApp::new(report),
        }
    }

    /// Build the report for `form_id` from stored data.
    pub fn from_storage(storage: Arc<Storage>, form_id: &str) -> Result<Self> {
        let report = FormService::new(storage).report_for(form_id)?;
        Ok(Self::new(report))
    }

    /// Build the report from a data directory without seeding it.
    pub fn open<P: AsRef<Path>>(data_dir: P, form_id: &str) -> Result<Self> {
        let storage = Storage::open(data_dir)?;
        Self::from_storage(Arc::new(storage), form_id)
    }

    pub fn app(&self) -> &ResultsApp {
        &self.app
    }

    /// Take over the terminal until the user quits.
    pub fn run(mut self) -> Result<()> {
        let mut guard = terminal::TerminalGuard::enter()?;
        run_event_loop(guard.terminal(), &mut self.app)
    }
}

fn run_event_loop(terminal: &mut terminal::DashboardTerminal, app: &mut ResultsApp) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if handle_input(app, key.code) {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true if the dashboard should exit.
fn handle_input(app: &mut ResultsApp, key: KeyCode) -> bool {
    match key {
        KeyCode::Tab => {
            app.next_view();
            false
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.scroll_down();
            false
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.scroll_up();
            false
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_input() {
        let storage = Arc::new(Storage::in_memory());
        storage.initialize().unwrap();
        let mut dashboard = ResultsDashboard::from_storage(storage, "1").unwrap();
        let app = &mut dashboard.app;

        assert!(!handle_input(app, KeyCode::Tab));
        assert_eq!(app.view, View::Questions);
        assert!(!handle_input(app, KeyCode::Char('j')));
        assert!(!handle_input(app, KeyCode::Char('x')));
        assert!(handle_input(app, KeyCode::Char('q')));
    }

    #[test]
    fn test_unknown_form() {
        let storage = Arc::new(Storage::in_memory());
        storage.initialize().unwrap();
        let err = ResultsDashboard::from_storage(storage, "missing").err().unwrap();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_open_leaves_data_dir_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let err = ResultsDashboard::open(dir.path(), "1").err().unwrap();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
