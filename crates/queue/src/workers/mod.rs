//! Job workers.

mod email;

pub use email::{EmailWorkerContext, email_worker};
