//! Laboratory panel input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::LabPanel;
use crate::tui::styles::MedicalTheme;

/// Field positions. The first three render in the left column.
pub mod field {
    pub const ALT: usize = 0;
    pub const ALBUMIN: usize = 1;
    pub const HEMOGLOBIN: usize = 2;
    pub const ESR: usize = 3;
    pub const ANTIBODY: usize = 4;
    pub const TRIGLYCERIDE: usize = 5;
}

const FIELD_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free-text numeric entry, parsed on submit.
    Number(String),
    /// Yes/No selection.
    Toggle(bool),
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub value: FieldValue,
}

impl FormField {
    fn number(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            hint,
            value: FieldValue::Number(String::new()),
        }
    }

    fn toggle(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            hint,
            value: FieldValue::Toggle(false),
        }
    }

    fn parse_number(&self) -> Result<f64, String> {
        let FieldValue::Number(text) = &self.value else {
            return Err(format!("{}: not a numeric field", self.label));
        };
        if text.is_empty() {
            return Err(format!("{}: Enter a value", self.label));
        }
        let value: f64 = text
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;
        if !value.is_finite() {
            return Err(format!("{}: Invalid number", self.label));
        }
        if value < 0.0 {
            return Err(format!("{}: Value must not be negative", self.label));
        }
        Ok(value)
    }
}

/// Lab form state
pub struct LabFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for LabFormState {
    fn default() -> Self {
        let fields = vec![
            FormField::number("ALT", "U/L (≥ 0)"),
            FormField::number("Albumin", "g/L (≥ 0)"),
            FormField::number("Hemoglobin", "g/L (≥ 0)"),
            FormField::number("ESR", "mm/h (> 0)"),
            FormField::toggle("Anti-synthetase Antibody", "[Space] toggle"),
            FormField::number("Triglyceride", "mmol/L (≥ 0)"),
        ];
        debug_assert_eq!(fields.len(), FIELD_COUNT);

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }
}

impl LabFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Jump to the same row in the other column.
    pub fn switch_column(&mut self) {
        let half = FIELD_COUNT / 2;
        self.selected_field = (self.selected_field + half) % FIELD_COUNT;
    }

    /// Handle a typed character for the current field.
    ///
    /// Numeric fields accept digits and one `.`; the toggle field accepts
    /// `y`, `n` and space.
    pub fn input_char(&mut self, c: char) {
        match &mut self.fields[self.selected_field].value {
            FieldValue::Number(text) => {
                if c.is_ascii_digit() || (c == '.' && !text.contains('.')) {
                    text.push(c);
                } else {
                    return;
                }
            }
            FieldValue::Toggle(on) => match c {
                ' ' => *on = !*on,
                'y' | 'Y' => *on = true,
                'n' | 'N' => *on = false,
                _ => return,
            },
        }
        self.error_message = None;
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldValue::Number(text) = &mut self.fields[self.selected_field].value {
            text.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        match &mut self.fields[self.selected_field].value {
            FieldValue::Number(text) => text.clear(),
            FieldValue::Toggle(on) => *on = false,
        }
    }

    /// Wipe all field buffers from memory and reset the form.
    ///
    /// Called once a submission has been handed to the pipeline so entered
    /// lab values do not linger in UI state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            match &mut field.value {
                FieldValue::Number(text) => text.zeroize(),
                FieldValue::Toggle(on) => *on = false,
            }
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse the form into a panel.
    ///
    /// Reports empty, unparsable and negative entries. Pipeline validation
    /// (e.g. a zero ESR) is left to the pipeline.
    pub fn to_lab_panel(&self) -> Result<LabPanel, String> {
        let antibody_positive = match self.fields[field::ANTIBODY].value {
            FieldValue::Toggle(on) => on,
            FieldValue::Number(_) => false,
        };

        Ok(LabPanel {
            alt: self.fields[field::ALT].parse_number()?,
            albumin: self.fields[field::ALBUMIN].parse_number()?,
            hemoglobin: self.fields[field::HEMOGLOBIN].parse_number()?,
            esr: self.fields[field::ESR].parse_number()?,
            antibody_positive,
            triglyceride: self.fields[field::TRIGLYCERIDE].parse_number()?,
        })
    }

    /// Load sample data for testing (antibody-positive patient, raised ESR)
    pub fn load_sample_data(&mut self) {
        let sample = [
            (field::ALT, "40"),         // U/L
            (field::ALBUMIN, "35"),     // g/L
            (field::HEMOGLOBIN, "120"), // g/L
            (field::ESR, "20"),         // mm/h
            (field::TRIGLYCERIDE, "1.5"), // mmol/L
        ];
        for (i, val) in sample {
            self.fields[i].value = FieldValue::Number(val.to_string());
        }
        self.fields[field::ANTIBODY].value = FieldValue::Toggle(true);
        self.error_message = None;
    }
}

/// Render the lab input form
pub fn render_lab_form(f: &mut Frame, area: Rect, state: &LabFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Patient Indicators", MedicalTheme::title()),
        Span::styled(
            " │ Enter lab values to predict renal tubular acidosis risk",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &LabFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.fields.len() / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let border_style = if is_selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        };

        let title_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match &field.value {
            FieldValue::Number(text) if text.is_empty() => {
                spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
            }
            FieldValue::Number(text) => {
                spans.push(Span::styled(text.as_str(), MedicalTheme::text()));
            }
            FieldValue::Toggle(on) => {
                let (no, yes) = if *on {
                    (MedicalTheme::text_muted(), MedicalTheme::selected())
                } else {
                    (MedicalTheme::selected(), MedicalTheme::text_muted())
                };
                spans.push(Span::styled(" No (0) ", no));
                spans.push(Span::raw(" "));
                spans.push(Span::styled(" Yes (1) ", yes));
                if is_selected {
                    spans.push(Span::styled(format!("  {}", field.hint), MedicalTheme::text_muted()));
                }
            }
        }
        if is_selected && matches!(field.value, FieldValue::Number(_)) {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &LabFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓←→/Tab] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Submit ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(state: &mut LabFormState, s: &str) {
        for c in s.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_sample_data_parses() {
        let mut state = LabFormState::default();
        state.load_sample_data();
        let panel = state.to_lab_panel().expect("sample parses");
        assert_eq!(panel.alt, 40.0);
        assert_eq!(panel.esr, 20.0);
        assert!(panel.antibody_positive);
        assert_eq!(panel.triglyceride, 1.5);
    }

    #[test]
    fn test_empty_field_reported() {
        let mut state = LabFormState::default();
        state.load_sample_data();
        state.selected_field = field::HEMOGLOBIN;
        state.clear_field();
        let err = state.to_lab_panel().unwrap_err();
        assert!(err.starts_with("Hemoglobin"));
    }

    #[test]
    fn test_numeric_input_filtering() {
        let mut state = LabFormState::default();
        type_str(&mut state, "1a2.3.4-");
        assert_eq!(state.fields[field::ALT].value, FieldValue::Number("12.34".into()));

        state.delete_char();
        assert_eq!(state.fields[field::ALT].value, FieldValue::Number("12.3".into()));
    }

    #[test]
    fn test_toggle_field() {
        let mut state = LabFormState::default();
        state.selected_field = field::ANTIBODY;
        state.input_char('y');
        assert_eq!(state.fields[field::ANTIBODY].value, FieldValue::Toggle(true));
        state.input_char(' ');
        assert_eq!(state.fields[field::ANTIBODY].value, FieldValue::Toggle(false));
        state.input_char('7');
        assert_eq!(state.fields[field::ANTIBODY].value, FieldValue::Toggle(false));
    }

    #[test]
    fn test_zero_esr_passes_form_parsing() {
        let mut state = LabFormState::default();
        state.load_sample_data();
        state.fields[field::ESR].value = FieldValue::Number("0".into());
        let panel = state.to_lab_panel().expect("parses");
        assert_eq!(panel.esr, 0.0);
    }

    #[test]
    fn test_negative_rejected() {
        let mut state = LabFormState::default();
        state.load_sample_data();
        state.fields[field::ALBUMIN].value = FieldValue::Number("-3".into());
        assert!(state.to_lab_panel().unwrap_err().contains("negative"));
    }

    #[test]
    fn test_navigation_wraps_and_switches_columns() {
        let mut state = LabFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, field::TRIGLYCERIDE);
        state.next_field();
        assert_eq!(state.selected_field, field::ALT);

        state.switch_column();
        assert_eq!(state.selected_field, field::ESR);
        state.switch_column();
        assert_eq!(state.selected_field, field::ALT);
    }

    #[test]
    fn test_clear_sensitive() {
        let mut state = LabFormState::default();
        state.load_sample_data();
        state.selected_field = field::ESR;
        state.clear_sensitive();
        assert_eq!(state.selected_field, 0);
        for f in &state.fields {
            match &f.value {
                FieldValue::Number(text) => assert!(text.is_empty()),
                FieldValue::Toggle(on) => assert!(!on),
            }
        }
    }
}
