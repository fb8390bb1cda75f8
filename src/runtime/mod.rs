//! Runtime module - winit/platform integration
//!
//! The host window: keyboard input feeds the leader state machine, timer
//! deadlines drive the event loop, and the settings file is hot-reloaded.

pub mod app;

pub use app::App;
