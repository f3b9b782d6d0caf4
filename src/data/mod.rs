//! Bundled sample data and JSON form import.

mod loader;
mod seed;

pub use loader::{load_forms_from_json, LoadError};
pub use seed::{sample_forms, sample_users};
