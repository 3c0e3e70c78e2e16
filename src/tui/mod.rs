//! TUI module: Terminal User Interface using Ratatui.
//!
//! - Lab panel entry form
//! - Prediction result with grade, probability gauge and advisory
//! - Blocking "model unavailable" screen when the artifacts failed to load

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
