//! Terminal UI components.
//!
//! The screen is a toolbar hint line, the editor pane on the left, the
//! HTML preview on the right, and a status bar with toasts. Overlays cover
//! the help screen and the input prompts.

mod overlays;
mod render;
mod status;

pub use render::{
    MainLayout, editor_h_offset, line_number_width, main_layout, pane_inner, render, wrap_text,
};

/// Share of the body width given to the editor pane.
pub const EDITOR_WIDTH_PERCENT: u16 = 50;
