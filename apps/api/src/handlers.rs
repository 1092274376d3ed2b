//! HTTP handlers.

pub mod health;
pub mod payroll;
pub mod settings;
