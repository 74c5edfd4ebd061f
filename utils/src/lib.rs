//! Shared utilities for Agora governance tooling.

pub mod logging;
pub mod time;

pub use logging::{init_tracing, LogFormat, UnknownLogFormat};
pub use time::format_duration;
