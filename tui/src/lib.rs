//! Cortex TUI - Terminal interface for the Cortex chat client
//!
//! A full-screen terminal UI with a resizable chat sidebar, a conversation
//! panel, and spoken replies via the backend's synthesis endpoint.
//!
//! # Architecture
//!
//! - **App**: Event loop, input handling, and rendering
//! - **Display**: Pure line-building helpers for the conversation panel
//! - **Audio**: rodio-backed [`cortex_core::AudioOutput`] implementation
//! - **Login**: Interactive credential prompt before the TUI starts

pub mod app;
pub mod audio;
pub mod display;
pub mod login;

pub use app::App;
