//! Core business logic for afrec.

pub mod services;

pub use services::*;
