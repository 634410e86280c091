//! Infrastructure layer providing external service integrations.
//!
//! This module contains the snapshot store, the submission sinks, the
//! command-line configuration and log setup.

pub mod persistence;
pub mod sink;
pub mod config;
pub mod logging;

pub use persistence::*;
pub use sink::*;
pub use config::*;
pub use logging::*;
