//! Job definitions.

mod email;

pub use email::EmailJob;
