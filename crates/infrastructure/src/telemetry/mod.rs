//! Logging initialization
//!
//! Console logging through `tracing-subscriber`, as text or JSON lines.

mod logging;

pub use logging::{LogFormat, LoggingConfig, TelemetryError, init_logging};
