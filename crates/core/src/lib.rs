//! Core business logic for civica.

pub mod services;

pub use services::*;

/// Generate a unique ID using ULID.
pub fn generate_id() -> String {
    civica_common::IdGenerator::new().generate()
}
