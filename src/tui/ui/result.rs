//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Assessment, Grade};
use crate::tui::styles::MedicalTheme;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Completed with result
    Complete { assessment: Assessment },
    /// Inference failed after validation passed
    Error { message: String },
}

/// Render the prediction result
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2]);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction Result", MedicalTheme::title()),
        Span::styled(" │ Renal Tubular Acidosis", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(Span::styled(
        "Enter patient indicators to begin",
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let result = &assessment.result;

    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Grade
            Constraint::Length(3), // Probability
            Constraint::Length(4), // Advisory
            Constraint::Length(1), // Timestamp
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let grade_style = MedicalTheme::grade(result.grade);

    let summary = Paragraph::new(vec![
        Line::from(Span::styled(
            result.summary(),
            grade_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            result.grade.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    let percent = (result.probability * 100.0).round().clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Predicted Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(grade_style)
        .percent(percent)
        .label(result.percent_label());
    f.render_widget(gauge, chunks[1]);

    let advisory_style = match result.grade {
        Grade::One => MedicalTheme::warning(),
        Grade::Zero => MedicalTheme::info(),
    };
    let advisory = Paragraph::new(Line::from(Span::styled(
        result.grade.advisory(),
        advisory_style,
    )))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(advisory_style),
    );
    f.render_widget(advisory, chunks[2]);

    let timestamp = Paragraph::new(Line::from(Span::styled(
        format!(
            "Assessed at {}",
            assessment.assessed_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(timestamp, chunks[3]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Enter/Esc] ", MedicalTheme::key_hint()),
        Span::styled("Back to Form ", MedicalTheme::key_desc()),
        Span::styled("[N] ", MedicalTheme::key_hint()),
        Span::styled("New Patient ", MedicalTheme::key_desc()),
        Span::styled("[Ctrl+Q] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

/// Blocking screen shown when the model artifacts failed to load.
pub fn render_unavailable(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Model unavailable",
            MedicalTheme::danger().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
        Line::from(""),
        Line::from(Span::styled(
            "Predictions are disabled. Check the model directory and restart.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" RenalGuard ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
