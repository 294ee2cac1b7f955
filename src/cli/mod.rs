pub mod codes;
pub mod validate;

pub use validate::ValidateCommand;
