//! Database repositories.

mod device;
mod device_document;
mod issue_request;
mod password_reset;
mod user;
mod user_profile;

pub use device::{DeviceFilter, DeviceRepository};
pub use device_document::DeviceDocumentRepository;
pub use issue_request::{IssueRequestFilter, IssueRequestRepository};
pub use password_reset::PasswordResetRepository;
pub use user::{UserFilter, UserRepository};
pub use user_profile::UserProfileRepository;
