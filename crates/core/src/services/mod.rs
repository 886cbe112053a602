//! Business logic services.

#![allow(missing_docs)]

pub mod device;
pub mod email;
pub mod issue_request;
pub mod notifier;
pub mod user;

pub use device::{
    CreateDeviceInput, DeviceSaveResult, DeviceService, RegulatorySlot, UpdateDeviceInput,
    UploadDocumentInput,
};
pub use email::{
    EmailAttachment, EmailConfig, EmailMessage, EmailProvider, EmailService, EmailTemplate,
    EmailTemplateVars, MailgunConfig, SendGridConfig, SmtpConfig,
};
pub use issue_request::{
    CreateIssueRequestInput, IssueRequestSaveResult, IssueRequestService, UpdateIssueRequestInput,
};
pub use notifier::{StatusChangeNotifier, StatusWatch};
pub use user::{ChangePasswordInput, CreateUserInput, UpdateUserInput, UserService};
