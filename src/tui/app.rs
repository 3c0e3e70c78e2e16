//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous prediction on submit

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::{InferencePipeline, ModelRegistry};
use crate::config::AppConfig;
use crate::domain::Assessment;
use crate::PredictionError;

use super::ui::{
    form::{render_lab_form, LabFormState},
    render_disclaimer,
    result::{render_result, render_unavailable, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Form,
    Result,
    /// Artifacts failed to load. Terminal state until restart.
    Unavailable,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// `None` when the artifacts failed to load.
    pipeline: Option<InferencePipeline>,

    /// Load failure shown on the unavailable screen
    unavailable_reason: Option<String>,

    form_state: LabFormState,
    result_state: ResultState,
}

impl App {
    /// Create the application from configuration.
    ///
    /// Loads the model artifacts through the process-wide registry. A load
    /// failure does not abort startup; the app opens on the unavailable
    /// screen instead.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let pipeline = config
            .artifact_loader()
            .map_err(|e| {
                tracing::error!(error = %e, "Invalid model trust configuration");
                PredictionError::from(e)
            })
            .and_then(|loader| ModelRegistry::global(loader).pipeline());

        Self::with_pipeline(pipeline)
    }

    /// Create the application over an already-resolved pipeline.
    pub fn with_pipeline(pipeline: Result<InferencePipeline, PredictionError>) -> Self {
        let (screen, pipeline, unavailable_reason) = match pipeline {
            Ok(p) => (Screen::Form, Some(p), None),
            Err(e) => (Screen::Unavailable, None, Some(e.to_string())),
        };

        Self {
            screen,
            should_quit: false,
            pipeline,
            unavailable_reason,
            form_state: LabFormState::default(),
            result_state: ResultState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                let disclaimer_area = chunks[1];

                match self.screen {
                    Screen::Form => render_lab_form(f, content_area, &self.form_state),
                    Screen::Result => render_result(f, content_area, &self.result_state),
                    Screen::Unavailable => render_unavailable(
                        f,
                        content_area,
                        self.unavailable_reason.as_deref().unwrap_or("unknown error"),
                    ),
                }

                render_disclaimer(f, disclaimer_area);
            })?;

            if event::poll(Duration::from_millis(100))? {
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

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
            Screen::Unavailable => self.handle_unavailable_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left | KeyCode::Right => self.form_state.switch_column(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Form;
            }
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.form_state = LabFormState::default();
                self.result_state = ResultState::Idle;
                self.screen = Screen::Form;
            }
            _ => {}
        }
    }

    fn handle_unavailable_key(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            self.should_quit = true;
        }
    }

    fn submit_form(&mut self) {
        let Some(pipeline) = &self.pipeline else {
            self.screen = Screen::Unavailable;
            return;
        };

        let panel = match self.form_state.to_lab_panel() {
            Ok(panel) => panel,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        match pipeline.predict(&panel) {
            Ok(result) => {
                self.result_state = ResultState::Complete {
                    assessment: Assessment::new(result),
                };
                self.screen = Screen::Result;
                self.form_state.clear_sensitive();
            }
            Err(PredictionError::Validation(e)) => {
                self.form_state.error_message = Some(e.to_string());
            }
            Err(e @ PredictionError::Inference(_)) => {
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
                self.screen = Screen::Result;
            }
            Err(PredictionError::Unavailable(e)) => {
                self.unavailable_reason = Some(e.to_string());
                self.screen = Screen::Unavailable;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ArtifactLoader, LoadError};
    use crate::domain::Grade;
    use crate::tui::ui::form::{field, FieldValue};
    use std::path::PathBuf;

    fn fixture_app() -> App {
        let registry = ModelRegistry::new(ArtifactLoader::new("models"));
        App::with_pipeline(registry.pipeline())
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_sample_submission_shows_result() {
        let mut app = fixture_app();
        assert_eq!(app.screen, Screen::Form);

        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Result);
        match &app.result_state {
            ResultState::Complete { assessment } => {
                let r = assessment.result;
                assert!((0.0..=1.0).contains(&r.probability));
                assert_eq!(r.grade == Grade::One, r.probability >= 0.5);
            }
            other => panic!("unexpected state: {other:?}"),
        }

        // Entered values are wiped after submission.
        assert_eq!(
            app.form_state.fields[field::ALT].value,
            FieldValue::Number(String::new())
        );
    }

    #[test]
    fn test_zero_esr_reported_on_form() {
        let mut app = fixture_app();
        press(&mut app, KeyCode::Char('S'));
        app.form_state.fields[field::ESR].value = FieldValue::Number("0".into());
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Form);
        assert_eq!(
            app.form_state.error_message.as_deref(),
            Some("esr must be nonzero")
        );
    }

    #[test]
    fn test_unparsable_value_reported_on_form() {
        let mut app = fixture_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Form);
        assert!(app.form_state.error_message.is_some());
    }

    #[test]
    fn test_unavailable_blocks_submission() {
        let err = LoadError::Missing {
            path: PathBuf::from("models/gbdt_model.json"),
        };
        let mut app = App::with_pipeline(Err(PredictionError::Unavailable(err)));
        assert_eq!(app.screen, Screen::Unavailable);

        press(&mut app, KeyCode::Char('S'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Unavailable);
        assert!(app
            .unavailable_reason
            .as_deref()
            .is_some_and(|r| r.contains("not found")));

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_q_quits_anywhere() {
        let mut app = fixture_app();
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
