//! Background job queue for afrec.
//!
//! This crate provides asynchronous job processing using Redis:
//!
//! - **Jobs**: outbound email delivery
//! - **Workers**: concurrent job execution with Apalis
//!
//! The registry's save-path notifications are dispatched synchronously; this
//! queue carries email work that tolerates deferral (bulk mail, re-sends
//! triggered by operators).

pub mod jobs;
pub mod workers;

pub use jobs::*;
pub use workers::*;
