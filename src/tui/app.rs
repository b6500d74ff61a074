//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Patient/Clinician mode switching
//! - Batch runs via background worker

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::SqliteStorage;
use crate::application::{CalculationService, EgfrEngine};
use crate::config::AppConfig;
use crate::domain::{Calculation, UserMode};

use super::ui::{
    batch::{render_batch, BatchState},
    calculator::{render_calculator_form, CalculatorFormState},
    dashboard::{render_dashboard, DashboardState},
    render_disclaimer,
    result::render_result,
};
use super::worker::{BatchProgress, BatchWorker, BatchWorkerHandle};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Calculator,
    Result,
    Batch,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    mode: UserMode,

    service: Arc<CalculationService<SqliteStorage>>,

    /// Window for the dashboard stage summary
    recent_limit: usize,

    dashboard_state: DashboardState,
    form_state: CalculatorFormState,
    batch_state: BatchState,

    /// Last finished calculation, shown on the result screen
    last_result: Option<Calculation>,

    pending_worker: Option<BatchWorkerHandle>,
}

impl App {
    /// Create a new application from configuration.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
        let service = Arc::new(CalculationService::new(
            EgfrEngine::new(config.coefficients),
            storage,
        ));
        Ok(Self::with_dependencies(service, config.recent_limit))
    }

    /// Create application with an externally constructed service.
    #[must_use]
    pub fn with_dependencies(
        service: Arc<CalculationService<SqliteStorage>>,
        recent_limit: usize,
    ) -> Self {
        let mode = UserMode::default();
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            mode,
            dashboard_state: DashboardState {
                mode,
                convention: service.engine().coefficients().name(),
                ..DashboardState::default()
            },
            service,
            recent_limit,
            form_state: CalculatorFormState::for_mode(mode),
            batch_state: BatchState::default(),
            last_result: None,
            pending_worker: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn mode(&self) -> UserMode {
        self.mode
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.update_dashboard_state();

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());
                let content_area = chunks[0];

                match self.screen {
                    Screen::Dashboard => render_dashboard(f, content_area, &self.dashboard_state),
                    Screen::Calculator => {
                        render_calculator_form(f, content_area, &self.form_state);
                    }
                    Screen::Result => {
                        if let Some(calculation) = &self.last_result {
                            render_result(f, content_area, calculation);
                        }
                    }
                    Screen::Batch => render_batch(f, content_area, &self.batch_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain progress messages from the batch worker.
    fn poll_worker(&mut self) {
        while let Some(progress) = self.pending_worker.as_ref().and_then(BatchWorkerHandle::try_recv) {
            match progress {
                BatchProgress::Loading => {}
                BatchProgress::Row { done, total } => {
                    self.batch_state.done = done;
                    self.batch_state.total = total;
                }
                BatchProgress::Complete(report) => {
                    self.batch_state.done = report.len();
                    self.batch_state.total = report.len();
                    self.batch_state.report = Some(report);
                    self.finish_batch();
                    break;
                }
                BatchProgress::Error(message) => {
                    self.batch_state.error = Some(message);
                    self.finish_batch();
                    break;
                }
            }
        }
    }

    fn finish_batch(&mut self) {
        self.batch_state.running = false;
        self.pending_worker = None;
        self.update_dashboard_state();
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Calculator => self.handle_calculator_key(key),
            Screen::Result => self.handle_result_key(key),
            Screen::Batch => self.handle_batch_key(key),
        }
    }

    /// Switch between Patient and Clinician mode.
    ///
    /// The form and any displayed result are discarded so that nothing
    /// entered in one mode is shown in the other.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.form_state.clear_sensitive();
        self.form_state = CalculatorFormState::for_mode(self.mode);
        self.last_result = None;
        self.dashboard_state.mode = self.mode;
        self.dashboard_state.status = None;
        if self.screen == Screen::Result
            || (self.screen == Screen::Batch && self.mode == UserMode::Patient)
        {
            self.screen = Screen::Dashboard;
        }
        tracing::info!("Switched to {} mode", self.mode.as_str());
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n' | 'N') => {
                self.form_state = CalculatorFormState::for_mode(self.mode);
                self.screen = Screen::Calculator;
            }
            KeyCode::Char('b' | 'B') => {
                if self.mode == UserMode::Clinician {
                    self.screen = Screen::Batch;
                } else {
                    self.dashboard_state.status =
                        Some("Batch import is available in Clinician mode".to_string());
                }
            }
            KeyCode::Char('m' | 'M') | KeyCode::F(2) => self.toggle_mode(),
            KeyCode::Char('x' | 'X') => {
                match self.service.clear_history() {
                    Ok(()) => self.dashboard_state.status = Some("History cleared".to_string()),
                    Err(e) => self.dashboard_state.status = Some(e.to_string()),
                }
                self.update_dashboard_state();
            }
            KeyCode::Char('q' | 'Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_calculator_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle_choice(false),
            KeyCode::Right => self.form_state.cycle_choice(true),
            KeyCode::F(2) => self.toggle_mode(),
            KeyCode::F(5) => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Char('n' | 'N') => {
                self.form_state = CalculatorFormState::for_mode(self.mode);
                self.screen = Screen::Calculator;
            }
            KeyCode::F(2) => self.toggle_mode(),
            _ => {}
        }
    }

    fn handle_batch_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc if !self.batch_state.running => self.screen = Screen::Dashboard,
            KeyCode::Enter if !self.batch_state.running => self.start_batch(),
            KeyCode::Up => self.batch_state.select_prev(),
            KeyCode::Down => self.batch_state.select_next(),
            KeyCode::Backspace => self.batch_state.delete_char(),
            KeyCode::Char(c) => self.batch_state.input_char(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let record = self.form_state.to_record();
        match self.service.calculate(&record, self.mode) {
            Ok(calculation) => {
                self.last_result = Some(calculation);
                self.form_state.clear_sensitive();
                self.update_dashboard_state();
                self.screen = Screen::Result;
            }
            Err(e) => self.form_state.error_message = Some(e.to_string()),
        }
    }

    fn start_batch(&mut self) {
        let path = self.batch_state.path.trim();
        if path.is_empty() {
            self.batch_state.error = Some("Enter the path of a JSON record file".to_string());
            return;
        }
        let path = PathBuf::from(path);
        self.batch_state.start();
        self.pending_worker = Some(BatchWorker::spawn(Arc::clone(&self.service), path));
    }

    fn update_dashboard_state(&mut self) {
        match self.service.count() {
            Ok(count) => self.dashboard_state.calculation_count = count,
            Err(e) => tracing::warn!("Failed to count calculations: {}", e),
        }
        match self.service.stage_summary(self.recent_limit) {
            Ok(summary) => self.dashboard_state.recent = summary,
            Err(e) => tracing::warn!("Failed to load stage summary: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CkdStage;

    fn create_test_app() -> App {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let service = Arc::new(CalculationService::new(EgfrEngine::default(), storage));
        App::with_dependencies(service, 10)
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_submit_sample_shows_result() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::Calculator);

        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);
        assert!(app.last_result.is_some());
        assert_eq!(app.dashboard_state.calculation_count, 1);
    }

    #[test]
    fn test_stage_summary_refreshes_with_dashboard_state() {
        let mut app = create_test_app();
        assert_eq!(app.dashboard_state.recent.total, 0);

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::Enter);

        let recent = app.dashboard_state.recent;
        assert_eq!(recent.total, 1);
        assert_eq!(recent.count(CkdStage::G3), 1);
    }

    #[test]
    fn test_invalid_form_stays_on_calculator() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Calculator);
        assert!(app.form_state.error_message.is_some());
    }

    #[test]
    fn test_mode_toggle_resets_form_and_result() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::Result);

        press(&mut app, KeyCode::F(2));
        assert_eq!(app.mode(), UserMode::Clinician);
        assert!(app.last_result.is_none());
        assert_eq!(app.screen(), Screen::Dashboard);
        assert!(app.form_state.fields.iter().all(|f| f.value.is_empty()
            || matches!(f.kind, crate::tui::ui::calculator::FieldKind::Choice(_))));
    }

    #[test]
    fn test_batch_requires_clinician_mode() {
        let mut app = create_test_app();
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.screen(), Screen::Dashboard);
        assert!(app.dashboard_state.status.is_some());

        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.screen(), Screen::Batch);

        press(&mut app, KeyCode::Enter);
        assert!(app.batch_state.error.is_some());
        assert!(!app.batch_state.running);
    }
}
