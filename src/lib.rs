//! Clipbook: send the active browser tab to NotebookLM as a website source.

pub mod automation;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use error::{ClipbookError, Result};
