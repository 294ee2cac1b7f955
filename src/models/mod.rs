pub mod config;
pub mod course;
pub mod diagnostic;
pub mod policy;

pub use config::{OlxcheckConfig, OutputFormat};
pub use course::{ContentNode, Course, NodeId, NodeKind};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, UnknownCode};
pub use policy::{Grader, GradingPolicy, Policy, PolicyKey};
