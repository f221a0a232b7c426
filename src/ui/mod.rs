//! UI module for jackstrip
//!
//! Provides the terminal user interface using ratatui.

mod app;
mod widgets;

pub use app::App;
