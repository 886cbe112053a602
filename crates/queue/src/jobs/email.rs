//! Outbound email job.

use serde::{Deserialize, Serialize};

/// Job to deliver an email through the configured provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email addresses.
    pub to: Vec<String>,

    /// Subject line.
    pub subject: String,

    /// Plain text body.
    pub text_body: String,

    /// HTML body.
    pub html_body: Option<String>,
}

impl EmailJob {
    /// Create a new email job.
    #[must_use]
    pub const fn new(
        to: Vec<String>,
        subject: String,
        text_body: String,
        html_body: Option<String>,
    ) -> Self {
        Self {
            to,
            subject,
            text_body,
            html_body,
        }
    }
}
