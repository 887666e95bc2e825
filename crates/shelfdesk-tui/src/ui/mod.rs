//! Terminal UI module using ratatui.
//!
//! - `render`: main frame layout, product table, pagination strip and overlays
//! - `editor`: product editor overlay
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod editor;
pub mod input;
pub mod render;
pub mod styles;
