// olxcheck - staged semantic validation for OLX course directories

pub mod cli;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod validator;

pub use anyhow::{Context, Result};

// Re-export commonly used types
pub use models::{Course, Diagnostic, DiagnosticCode, Severity};
pub use pipeline::{validate, Stage, ValidateOptions};
pub use validator::{ErrorStore, Registries, Validator, ValidatorRegistry};
