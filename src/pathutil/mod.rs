//! Path classification and validation.

mod home;
mod infer;
mod validate;

pub use home::{Home, clean, join_slash, to_slash};
pub use infer::{InferResult, infer};
pub use validate::{Validation, validate_entry_name, validate_for_add};
