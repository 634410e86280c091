//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the wizard state machine, the editable step forms and the UI state that
//! ties them together.

pub mod controller;
pub mod debounce;
pub mod forms;
pub mod state;

pub use controller::*;
pub use debounce::*;
pub use forms::*;
pub use state::*;
