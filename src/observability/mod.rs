//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http pipeline, table client, remote service
//!     → tracing events (structured fields, `todo_sync::*` targets)
//!     → metrics.rs (counters, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → logging.rs installs a fmt subscriber for the CLI
//!     → library users bring their own subscriber / recorder
//! ```

pub mod logging;
pub mod metrics;
