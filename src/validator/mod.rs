pub mod dates;
pub mod global;
pub mod grading;
pub mod long;
pub mod registry;
pub mod self_check;
pub mod store;

pub use grading::validate_grading_policy;
pub use registry::{Registries, Validator, ValidatorRegistry};
pub use store::ErrorStore;
