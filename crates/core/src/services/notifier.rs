//! Status-change notification dispatcher.
//!
//! Save paths load the stored record, seed a [`StatusWatch`] with its status,
//! and observe the status about to be written. A flagged change fans out a
//! user-facing status email plus an administrator event email; record creation
//! fans out only the "created" emails. Dispatch is synchronous within the save
//! path and a send failure propagates, except for password-reset mail.

use std::path::PathBuf;

use afrec_common::{AppError, AppResult};
use afrec_db::entities::{device, issue_request, user};

use crate::services::email::{
    EmailAttachment, EmailService, EmailTemplate, EmailTemplateVars, attachment_content_type,
};

/// Dirty-flag tracker for a record's status field.
///
/// Seeded with the status loaded from storage; [`StatusWatch::observe`]
/// compares the value about to be written, reports whether it differs, and
/// refreshes the cached value so the flag is computed exactly once per save.
#[derive(Debug, Clone, Copy)]
pub struct StatusWatch<S> {
    current: S,
}

impl<S: Copy + PartialEq> StatusWatch<S> {
    /// Seed the watch with the status loaded from storage.
    #[must_use]
    pub const fn new(loaded: S) -> Self {
        Self { current: loaded }
    }

    /// Compare the status about to be written against the cached value.
    ///
    /// Returns true when the value differs, then refreshes the cache.
    pub fn observe(&mut self, next: S) -> bool {
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// The most recently observed status.
    #[must_use]
    pub const fn current(&self) -> S {
        self.current
    }
}

/// Status-change notification dispatcher.
#[derive(Clone)]
pub struct StatusChangeNotifier {
    email: EmailService,
    admin_emails: Vec<String>,
    frontend_url: String,
    welcome_attachments: Vec<PathBuf>,
}

impl StatusChangeNotifier {
    /// Create a new notifier.
    #[must_use]
    pub const fn new(
        email: EmailService,
        admin_emails: Vec<String>,
        frontend_url: String,
        welcome_attachments: Vec<PathBuf>,
    ) -> Self {
        Self {
            email,
            admin_emails,
            frontend_url,
            welcome_attachments,
        }
    }

    fn skip_disabled(&self, event: &str) -> bool {
        if self.email.is_enabled() {
            return false;
        }
        tracing::debug!(event = event, "Email disabled, skipping notification");
        true
    }

    async fn send_to_admins(
        &self,
        template: EmailTemplate,
        vars: &EmailTemplateVars,
    ) -> AppResult<()> {
        if self.admin_emails.is_empty() {
            tracing::warn!("No administrator emails configured, dropping admin notification");
            return Ok(());
        }
        self.email
            .send_template(self.admin_emails.clone(), template, vars, Vec::new())
            .await
    }

    /// Fan-out for a newly registered user: welcome email with the configured
    /// onboarding attachments, then the administrator event email.
    pub async fn user_registered(&self, user: &user::Model) -> AppResult<()> {
        if self.skip_disabled("user_registered") {
            return Ok(());
        }

        let attachments = self.load_welcome_attachments().await?;
        let vars = EmailTemplateVars {
            user_name: Some(user.username.clone()),
            brand_name: Some(user.brand_name().to_string()),
            ..EmailTemplateVars::default()
        };
        self.email
            .send_template(
                vec![user.email.clone()],
                EmailTemplate::Welcome,
                &vars,
                attachments,
            )
            .await?;

        let admin_vars = EmailTemplateVars {
            user_name: Some(user.username.clone()),
            user_email: Some(user.email.clone()),
            country: user.country.map(|c| c.as_str().to_string()),
            ..EmailTemplateVars::default()
        };
        self.send_to_admins(EmailTemplate::AdminNewUser, &admin_vars)
            .await
    }

    /// Administrator event email for a newly created device.
    pub async fn device_created(
        &self,
        owner: &user::Model,
        device: &device::Model,
    ) -> AppResult<()> {
        if self.skip_disabled("device_created") {
            return Ok(());
        }

        let vars = EmailTemplateVars {
            entity_name: Some(device.device_name.clone()),
            user_email: Some(owner.email.clone()),
            ..EmailTemplateVars::default()
        };
        self.send_to_admins(EmailTemplate::AdminNewDevice, &vars)
            .await
    }

    /// Fan-out for a flagged device status change: owner status email plus
    /// administrator event email.
    pub async fn device_status_changed(
        &self,
        owner: &user::Model,
        device: &device::Model,
        old_status: device::DeviceStatus,
        new_status: device::DeviceStatus,
    ) -> AppResult<()> {
        if self.skip_disabled("device_status_changed") {
            return Ok(());
        }

        let user_vars = EmailTemplateVars {
            user_name: Some(owner.username.clone()),
            status: Some(new_status.as_str().to_string()),
            ..EmailTemplateVars::default()
        };
        self.email
            .send_template(
                vec![owner.email.clone()],
                EmailTemplate::DeviceStatusUpdate,
                &user_vars,
                Vec::new(),
            )
            .await?;

        let admin_vars = EmailTemplateVars {
            entity_name: Some(device.device_name.clone()),
            user_email: Some(owner.email.clone()),
            old_status: Some(old_status.as_str().to_string()),
            new_status: Some(new_status.as_str().to_string()),
            ..EmailTemplateVars::default()
        };
        self.send_to_admins(EmailTemplate::AdminDeviceStatusChange, &admin_vars)
            .await
    }

    /// Administrator event email for a newly created issue request.
    pub async fn issue_request_created(
        &self,
        owner: &user::Model,
        device_name: &str,
    ) -> AppResult<()> {
        if self.skip_disabled("issue_request_created") {
            return Ok(());
        }

        let vars = EmailTemplateVars {
            entity_name: Some(device_name.to_string()),
            user_email: Some(owner.email.clone()),
            ..EmailTemplateVars::default()
        };
        self.send_to_admins(EmailTemplate::AdminNewIssueRequest, &vars)
            .await
    }

    /// Fan-out for a flagged issue request status change.
    pub async fn issue_request_status_changed(
        &self,
        owner: &user::Model,
        device_name: &str,
        old_status: issue_request::IssueStatus,
        new_status: issue_request::IssueStatus,
    ) -> AppResult<()> {
        if self.skip_disabled("issue_request_status_changed") {
            return Ok(());
        }

        let user_vars = EmailTemplateVars {
            user_name: Some(owner.username.clone()),
            status: Some(new_status.as_str().to_string()),
            ..EmailTemplateVars::default()
        };
        self.email
            .send_template(
                vec![owner.email.clone()],
                EmailTemplate::IssueRequestStatusUpdate,
                &user_vars,
                Vec::new(),
            )
            .await?;

        let admin_vars = EmailTemplateVars {
            entity_name: Some(device_name.to_string()),
            user_email: Some(owner.email.clone()),
            old_status: Some(old_status.as_str().to_string()),
            new_status: Some(new_status.as_str().to_string()),
            ..EmailTemplateVars::default()
        };
        self.send_to_admins(EmailTemplate::AdminIssueRequestStatusChange, &admin_vars)
            .await
    }

    /// Password-reset email. Send failures are logged and swallowed so the
    /// reset flow proceeds without a guaranteed message.
    pub async fn password_reset_requested(&self, user: &user::Model, token: &str) -> AppResult<()> {
        if self.skip_disabled("password_reset_requested") {
            return Ok(());
        }

        let reset_url = format!(
            "{}/reset-password?token={}",
            self.frontend_url.trim_end_matches('/'),
            urlencoding::encode(token)
        );
        let vars = EmailTemplateVars {
            user_name: Some(user.username.clone()),
            action_url: Some(reset_url),
            ..EmailTemplateVars::default()
        };

        if let Err(e) = self
            .email
            .send_template(
                vec![user.email.clone()],
                EmailTemplate::PasswordReset,
                &vars,
                Vec::new(),
            )
            .await
        {
            tracing::error!(error = %e, user_id = %user.id, "Failed to send password reset email");
        }

        Ok(())
    }

    async fn load_welcome_attachments(&self) -> AppResult<Vec<EmailAttachment>> {
        let mut attachments = Vec::with_capacity(self.welcome_attachments.len());
        for path in &self.welcome_attachments {
            let data = tokio::fs::read(path).await.map_err(|e| {
                AppError::Email(format!(
                    "Failed to read welcome attachment {}: {e}",
                    path.display()
                ))
            })?;
            let filename = path
                .file_name()
                .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
            let content_type = attachment_content_type(&filename).to_string();
            attachments.push(EmailAttachment {
                filename,
                content_type,
                data,
            });
        }
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afrec_db::entities::device::DeviceStatus;
    use chrono::Utc;

    #[test]
    fn unchanged_status_leaves_flag_unset() {
        let mut watch = StatusWatch::new(DeviceStatus::Draft);
        assert!(!watch.observe(DeviceStatus::Draft));
    }

    #[test]
    fn changed_status_sets_flag_exactly_once_per_save() {
        let mut watch = StatusWatch::new(DeviceStatus::Draft);

        // First save with a new status flags the change and refreshes the cache.
        assert!(watch.observe(DeviceStatus::Submitted));
        assert_eq!(watch.current(), DeviceStatus::Submitted);

        // Saving again with the same status must not flag a second time.
        assert!(!watch.observe(DeviceStatus::Submitted));
    }

    #[test]
    fn every_transition_is_observable() {
        // Transitions are unconstrained: any status may move to any other.
        let all = [
            DeviceStatus::Draft,
            DeviceStatus::Submitted,
            DeviceStatus::Approved,
            DeviceStatus::Rejected,
        ];
        for from in all {
            for to in all {
                let mut watch = StatusWatch::new(from);
                assert_eq!(watch.observe(to), from != to);
            }
        }
    }

    fn make_user() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "kuda".to_string(),
            username_lower: "kuda".to_string(),
            email: "kuda@example.com".to_string(),
            name: None,
            country: None,
            token: None,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn disabled_email_skips_all_paths() {
        let notifier = StatusChangeNotifier::new(
            EmailService::new(None),
            vec!["admin@example.com".to_string()],
            "https://app.example".to_string(),
            Vec::new(),
        );
        let user = make_user();

        assert!(notifier.user_registered(&user).await.is_ok());
        assert!(notifier.password_reset_requested(&user, "tok").await.is_ok());
    }

    #[tokio::test]
    async fn password_reset_send_failure_does_not_propagate() {
        // Configured service with an unreachable relay: the send fails, the
        // reset path must still return Ok.
        use crate::services::email::{EmailConfig, EmailProvider, SmtpConfig};

        let config = EmailConfig {
            provider: EmailProvider::Smtp(SmtpConfig {
                host: "127.0.0.1".to_string(),
                port: 1,
                starttls: false,
                username: None,
                password: None,
            }),
            from_address: "info@africarecs.example".to_string(),
            from_name: "Africa RECs".to_string(),
            reply_to: None,
            app_name: "Africa RECs International".to_string(),
            app_url: "https://africarecs.example".to_string(),
        };
        let notifier = StatusChangeNotifier::new(
            EmailService::new(Some(config)),
            Vec::new(),
            "https://app.example".to_string(),
            Vec::new(),
        );

        let result = notifier
            .password_reset_requested(&make_user(), "tok")
            .await;
        assert!(result.is_ok());
    }
}
