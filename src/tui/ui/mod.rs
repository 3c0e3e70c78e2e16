//! UI module: View components for the TUI.

pub mod form;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub const DISCLAIMER: &str =
    "Note: this prediction is for reference only and cannot replace professional medical advice.";

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        DISCLAIMER,
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
