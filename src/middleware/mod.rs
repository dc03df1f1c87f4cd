//! Middleware layer.
//!
//! Cross-cutting stages that sit around handlers. Today that is the terminal
//! error stage: every error a handler returns ends up in an
//! [`ErrorHandler`](error_handler::ErrorHandler) and leaves as JSON.

pub mod error_handler;
