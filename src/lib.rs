//! cvwiz - Résumé Intake Wizard Library
//!
//! A three-step terminal form collecting personal data, professional
//! experience and education, with per-step validation gating navigation.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
