//! Database entities.

pub mod device;
pub mod device_document;
pub mod issue_request;
pub mod password_reset;
pub mod user;
pub mod user_profile;

pub use device::Entity as Device;
pub use device_document::Entity as DeviceDocument;
pub use issue_request::Entity as IssueRequest;
pub use password_reset::Entity as PasswordReset;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
