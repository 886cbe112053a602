//! Email notification service.
//!
//! Every outbound message is rendered as an HTML+text pair from a typed
//! template. Delivery failures surface as [`AppError::Email`]; callers decide
//! whether that is fatal (it is everywhere except the password-reset path).

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use afrec_common::{AppError, AppResult};

/// Email provider configuration.
#[derive(Debug, Clone)]
pub enum EmailProvider {
    /// SMTP relay
    Smtp(SmtpConfig),
    /// SendGrid HTTP API
    SendGrid(SendGridConfig),
    /// Mailgun HTTP API
    Mailgun(MailgunConfig),
}

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// Use STARTTLS (plain TLS otherwise)
    pub starttls: bool,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
}

/// SendGrid configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key
    pub api_key: String,
}

/// Mailgun configuration.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// Mailgun API key
    pub api_key: String,
    /// Mailgun domain
    pub domain: String,
    /// Use EU region
    pub eu_region: bool,
}

/// Email configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email provider
    pub provider: EmailProvider,
    /// From address
    pub from_address: String,
    /// From name
    pub from_name: String,
    /// Reply-to address (optional)
    pub reply_to: Option<String>,
    /// Application name (for templates)
    pub app_name: String,
    /// Application URL (for templates)
    pub app_url: String,
}

/// Email templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Welcome email sent at registration
    Welcome,
    /// Device status update for the owner
    DeviceStatusUpdate,
    /// Issue request status update for the owner
    IssueRequestStatusUpdate,
    /// Password reset link
    PasswordReset,
    /// Administrator: new user registered
    AdminNewUser,
    /// Administrator: new device submitted
    AdminNewDevice,
    /// Administrator: device status changed
    AdminDeviceStatusChange,
    /// Administrator: new issue request
    AdminNewIssueRequest,
    /// Administrator: issue request status changed
    AdminIssueRequestStatusChange,
}

/// Template variables for emails.
#[derive(Debug, Default, Clone)]
pub struct EmailTemplateVars {
    /// Recipient's display name or username
    pub user_name: Option<String>,
    /// Account email of the user the event concerns
    pub user_email: Option<String>,
    /// Country of the user the event concerns
    pub country: Option<String>,
    /// Regional brand name derived from the user's country
    pub brand_name: Option<String>,
    /// Device name the event concerns
    pub entity_name: Option<String>,
    /// Current status (user-facing status updates)
    pub status: Option<String>,
    /// Previous status (admin change events)
    pub old_status: Option<String>,
    /// New status (admin change events)
    pub new_status: Option<String>,
    /// Action URL (password reset link)
    pub action_url: Option<String>,
    /// Administrative console URL (admin events)
    pub admin_url: Option<String>,
}

/// A file attached to an outbound email.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    /// File name shown to the recipient
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub data: Vec<u8>,
}

/// Email message to be sent.
#[derive(Debug)]
pub struct EmailMessage {
    /// Recipient email addresses
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body (optional)
    pub html_body: Option<String>,
    /// Reply-to address (optional, overrides config)
    pub reply_to: Option<String>,
    /// File attachments
    pub attachments: Vec<EmailAttachment>,
}

/// Email service.
#[derive(Clone)]
pub struct EmailService {
    config: Option<EmailConfig>,
    http_client: reqwest::Client,
}

impl EmailService {
    /// Create a new email service.
    #[must_use]
    pub fn new(config: Option<EmailConfig>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Check if email service is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send an email.
    pub async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

        match &config.provider {
            EmailProvider::Smtp(smtp) => self.send_smtp(smtp, config, message).await,
            EmailProvider::SendGrid(sg) => self.send_sendgrid(sg, config, message).await,
            EmailProvider::Mailgun(mg) => self.send_mailgun(mg, config, message).await,
        }
    }

    /// Render and send a templated email.
    pub async fn send_template(
        &self,
        to: Vec<String>,
        template: EmailTemplate,
        vars: &EmailTemplateVars,
        attachments: Vec<EmailAttachment>,
    ) -> AppResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Email("Email service not configured".to_string()))?;

        let (subject, text_body, html_body) = render_template(template, vars, config);

        self.send(EmailMessage {
            to,
            subject,
            text_body,
            html_body: Some(html_body),
            reply_to: None,
            attachments,
        })
        .await
    }

    // Provider-specific implementations

    async fn send_smtp(
        &self,
        smtp: &SmtpConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<()> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Email(format!("Invalid from address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(message.subject.clone());

        for to in &message.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid recipient {to}: {e}")))?;
            builder = builder.to(mailbox);
        }

        if let Some(reply_to) = message.reply_to.as_deref().or(config.reply_to.as_deref()) {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|e| AppError::Email(format!("Invalid reply-to address: {e}")))?;
            builder = builder.reply_to(mailbox);
        }

        let body_part = match message.html_body {
            Some(html) => MultiPart::alternative_plain_html(message.text_body, html),
            None => MultiPart::mixed().singlepart(SinglePart::plain(message.text_body)),
        };

        let email = if message.attachments.is_empty() {
            builder
                .multipart(body_part)
                .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?
        } else {
            let mut mixed = MultiPart::mixed().multipart(body_part);
            for attachment in message.attachments {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|e| AppError::Email(format!("Invalid attachment type: {e}")))?;
                mixed = mixed.singlepart(
                    Attachment::new(attachment.filename).body(attachment.data, content_type),
                );
            }
            builder
                .multipart(mixed)
                .map_err(|e| AppError::Email(format!("Failed to build message: {e}")))?
        };

        let relay = if smtp.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        }
        .map_err(|e| AppError::Email(format!("Invalid SMTP relay: {e}")))?
        .port(smtp.port);

        let relay = match (&smtp.username, &smtp.password) {
            (Some(username), Some(password)) => {
                relay.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => relay,
        };

        relay
            .build()
            .send(email)
            .await
            .map_err(|e| AppError::Email(format!("SMTP send failed: {e}")))?;

        Ok(())
    }

    async fn send_sendgrid(
        &self,
        sg: &SendGridConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<()> {
        let recipients: Vec<serde_json::Value> = message
            .to
            .iter()
            .map(|to| serde_json::json!({"email": to}))
            .collect();

        let body = serde_json::json!({
            "personalizations": [{
                "to": recipients
            }],
            "from": {
                "email": config.from_address,
                "name": config.from_name
            },
            "subject": message.subject,
            "content": [
                {"type": "text/plain", "value": message.text_body},
                {"type": "text/html", "value": message.html_body.unwrap_or_default()}
            ]
        });

        let response = self
            .http_client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header("Authorization", format!("Bearer {}", sg.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("SendGrid request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::Email(format!("SendGrid rejected message: {error_text}")))
        }
    }

    async fn send_mailgun(
        &self,
        mg: &MailgunConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<()> {
        let base_url = if mg.eu_region {
            "https://api.eu.mailgun.net"
        } else {
            "https://api.mailgun.net"
        };

        let mut form_params = vec![
            (
                "from",
                format!("{} <{}>", config.from_name, config.from_address),
            ),
            ("to", message.to.join(", ")),
            ("subject", message.subject),
            ("text", message.text_body),
        ];

        if let Some(html) = message.html_body {
            form_params.push(("html", html));
        }

        let response = self
            .http_client
            .post(format!("{}/v3/{}/messages", base_url, mg.domain))
            .basic_auth("api", Some(&mg.api_key))
            .form(&form_params)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("Mailgun request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::Email(format!("Mailgun rejected message: {error_text}")))
        }
    }
}

/// Render an email template into (subject, text body, html body).
#[must_use]
pub fn render_template(
    template: EmailTemplate,
    vars: &EmailTemplateVars,
    config: &EmailConfig,
) -> (String, String, String) {
    let user_name = vars.user_name.as_deref().unwrap_or("there");
    let brand = vars.brand_name.as_deref().unwrap_or("Africa RECs");
    let entity = vars.entity_name.as_deref().unwrap_or("(unnamed)");
    let admin_url = vars
        .admin_url
        .as_deref()
        .unwrap_or(config.app_url.as_str());

    match template {
        EmailTemplate::Welcome => {
            let subject = format!("Welcome to {}!", config.app_name);
            let text = format!(
                "Hi {user_name}!\n\n\
                Welcome to {brand}, part of {}. Your account has been created.\n\n\
                The attached documents explain the registration process and how \
                to submit your first production device.\n\n\
                Get started: {}",
                config.app_name, config.app_url
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {user_name}!</p>\
                    <p>Welcome to <strong>{brand}</strong>, part of {}. Your account has been created.</p>\
                    <p>The attached documents explain the registration process and how \
                    to submit your first production device.</p>\
                    <p><a href=\"{}\" style=\"display:inline-block;padding:12px 24px;background:#007bff;color:#fff;text-decoration:none;border-radius:4px;\">Get Started</a></p>",
                    config.app_name, config.app_url
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::DeviceStatusUpdate => {
            let status = vars.status.as_deref().unwrap_or("updated");
            let subject = "Device Status Update".to_string();
            let text = format!(
                "Hi {user_name},\n\n\
                The status of your production device registration is now: {status}.\n\n\
                Sign in to {} to see the details: {}",
                config.app_name, config.app_url
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {user_name},</p>\
                    <p>The status of your production device registration is now: \
                    <strong>{status}</strong>.</p>\
                    <p><a href=\"{}\">Sign in to see the details</a></p>",
                    config.app_url
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::IssueRequestStatusUpdate => {
            let status = vars.status.as_deref().unwrap_or("updated");
            let subject = "Issue Request Status Update".to_string();
            let text = format!(
                "Hi {user_name},\n\n\
                The status of your certificate issue request is now: {status}.\n\n\
                Sign in to {} to see the details: {}",
                config.app_name, config.app_url
            );
            let html = wrap_html(
                &format!(
                    "<p>Hi {user_name},</p>\
                    <p>The status of your certificate issue request is now: \
                    <strong>{status}</strong>.</p>\
                    <p><a href=\"{}\">Sign in to see the details</a></p>",
                    config.app_url
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::PasswordReset => {
            let subject = format!("Password Reset for {}", config.app_name);
            let action_url = vars.action_url.as_deref().unwrap_or("");
            let text = format!(
                "You requested a password reset for your account on {}.\n\n\
                Click the following link to reset your password:\n{action_url}\n\n\
                The link expires in 24 hours. If you didn't request this, you can \
                safely ignore this email.",
                config.app_name
            );
            let html = wrap_html(&format!(
                "<p>You requested a password reset for your account on {}.</p>\
                <p><a href=\"{action_url}\" style=\"display:inline-block;padding:12px 24px;background:#007bff;color:#fff;text-decoration:none;border-radius:4px;\">Reset Password</a></p>\
                <p><small>The link expires in 24 hours. If you didn't request this, you can safely ignore this email.</small></p>",
                config.app_name
            ), config);
            (subject, text, html)
        }

        EmailTemplate::AdminNewUser => {
            let email = vars.user_email.as_deref().unwrap_or("unknown");
            let country = vars.country.as_deref().unwrap_or("not set");
            let subject = "New User Registration".to_string();
            let text = format!(
                "A new user registered on {}.\n\n\
                Username: {user_name}\nEmail: {email}\nCountry: {country}\n\n\
                Review the account: {admin_url}",
                config.app_name
            );
            let html = wrap_html(
                &format!(
                    "<p>A new user registered on {}.</p>\
                    <ul><li>Username: <strong>{user_name}</strong></li>\
                    <li>Email: {email}</li>\
                    <li>Country: {country}</li></ul>\
                    <p><a href=\"{admin_url}\">Review the account</a></p>",
                    config.app_name
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::AdminNewDevice => {
            let subject = format!("New Device Submitted: {entity}");
            let owner = vars.user_email.as_deref().unwrap_or("unknown");
            let text = format!(
                "A new production device was registered on {}.\n\n\
                Device: {entity}\nOwner: {owner}\n\n\
                Review the device: {admin_url}",
                config.app_name
            );
            let html = wrap_html(
                &format!(
                    "<p>A new production device was registered on {}.</p>\
                    <ul><li>Device: <strong>{entity}</strong></li>\
                    <li>Owner: {owner}</li></ul>\
                    <p><a href=\"{admin_url}\">Review the device</a></p>",
                    config.app_name
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::AdminDeviceStatusChange => {
            let old_status = vars.old_status.as_deref().unwrap_or("unknown");
            let new_status = vars.new_status.as_deref().unwrap_or("unknown");
            let subject = format!("Device Status Changed: {entity}");
            let owner = vars.user_email.as_deref().unwrap_or("unknown");
            let text = format!(
                "Device status change on {}.\n\n\
                Device: {entity}\nOwner: {owner}\n\
                Status: {old_status} -> {new_status}\n\n\
                View the device: {admin_url}",
                config.app_name
            );
            let html = wrap_html(
                &format!(
                    "<p>Device status change on {}.</p>\
                    <ul><li>Device: <strong>{entity}</strong></li>\
                    <li>Owner: {owner}</li>\
                    <li>Status: {old_status} &rarr; <strong>{new_status}</strong></li></ul>\
                    <p><a href=\"{admin_url}\">View the device</a></p>",
                    config.app_name
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::AdminNewIssueRequest => {
            let email = vars.user_email.as_deref().unwrap_or("unknown");
            let subject = format!("New Issue Request from {email}");
            let text = format!(
                "A new certificate issue request was created on {}.\n\n\
                Device: {entity}\nRequester: {email}\n\n\
                Review the request: {admin_url}",
                config.app_name
            );
            let html = wrap_html(
                &format!(
                    "<p>A new certificate issue request was created on {}.</p>\
                    <ul><li>Device: <strong>{entity}</strong></li>\
                    <li>Requester: {email}</li></ul>\
                    <p><a href=\"{admin_url}\">Review the request</a></p>",
                    config.app_name
                ),
                config,
            );
            (subject, text, html)
        }

        EmailTemplate::AdminIssueRequestStatusChange => {
            let old_status = vars.old_status.as_deref().unwrap_or("unknown");
            let new_status = vars.new_status.as_deref().unwrap_or("unknown");
            let subject = format!("Issue Request Status Changed: {entity}");
            let owner = vars.user_email.as_deref().unwrap_or("unknown");
            let text = format!(
                "Issue request status change on {}.\n\n\
                Device: {entity}\nRequester: {owner}\n\
                Status: {old_status} -> {new_status}\n\n\
                View the request: {admin_url}",
                config.app_name
            );
            let html = wrap_html(
                &format!(
                    "<p>Issue request status change on {}.</p>\
                    <ul><li>Device: <strong>{entity}</strong></li>\
                    <li>Requester: {owner}</li>\
                    <li>Status: {old_status} &rarr; <strong>{new_status}</strong></li></ul>\
                    <p><a href=\"{admin_url}\">View the request</a></p>",
                    config.app_name
                ),
                config,
            );
            (subject, text, html)
        }
    }
}

/// Wrap HTML content in a basic email template.
fn wrap_html(content: &str, config: &EmailConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #007bff; }}
        ul {{ margin: 10px 0; padding-left: 20px; }}
    </style>
</head>
<body>
    {}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        This email was sent from <a href="{}">{}</a>.
    </p>
</body>
</html>"#,
        content, config.app_url, config.app_name
    )
}

/// Guess the MIME type of an attachment from its file name.
#[must_use]
pub fn attachment_content_type(filename: &str) -> &'static str {
    let extension = filename.rsplit('.').next().unwrap_or("");
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            provider: EmailProvider::Smtp(SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                starttls: true,
                username: None,
                password: None,
            }),
            from_address: "info@africarecs.example".to_string(),
            from_name: "Africa RECs".to_string(),
            reply_to: None,
            app_name: "Africa RECs International".to_string(),
            app_url: "https://africarecs.example".to_string(),
        }
    }

    #[test]
    fn welcome_template_includes_brand() {
        let vars = EmailTemplateVars {
            user_name: Some("kuda".to_string()),
            brand_name: Some("Zamrec".to_string()),
            ..EmailTemplateVars::default()
        };
        let (subject, text, html) = render_template(EmailTemplate::Welcome, &vars, &test_config());
        assert_eq!(subject, "Welcome to Africa RECs International!");
        assert!(text.contains("Zamrec"));
        assert!(html.contains("Zamrec"));
        assert!(html.contains("<!DOCTYPE html>"));
    }

    #[test]
    fn device_status_template_uses_status() {
        let vars = EmailTemplateVars {
            user_name: Some("kuda".to_string()),
            status: Some("Approved".to_string()),
            ..EmailTemplateVars::default()
        };
        let (subject, text, _) =
            render_template(EmailTemplate::DeviceStatusUpdate, &vars, &test_config());
        assert_eq!(subject, "Device Status Update");
        assert!(text.contains("Approved"));
    }

    #[test]
    fn admin_status_change_template_shows_transition() {
        let vars = EmailTemplateVars {
            entity_name: Some("Lusaka Solar One".to_string()),
            old_status: Some("Submitted".to_string()),
            new_status: Some("Approved".to_string()),
            ..EmailTemplateVars::default()
        };
        let (subject, text, _) =
            render_template(EmailTemplate::AdminDeviceStatusChange, &vars, &test_config());
        assert_eq!(subject, "Device Status Changed: Lusaka Solar One");
        assert!(text.contains("Submitted -> Approved"));
    }

    #[test]
    fn password_reset_template_embeds_link() {
        let vars = EmailTemplateVars {
            action_url: Some("https://app.example/reset-password?token=abc".to_string()),
            ..EmailTemplateVars::default()
        };
        let (subject, text, html) =
            render_template(EmailTemplate::PasswordReset, &vars, &test_config());
        assert!(subject.contains("Password Reset"));
        assert!(text.contains("token=abc"));
        assert!(html.contains("token=abc"));
    }

    #[test]
    fn disabled_service_reports_not_enabled() {
        let service = EmailService::new(None);
        assert!(!service.is_enabled());
    }

    #[test]
    fn attachment_content_type_known_extensions() {
        assert_eq!(attachment_content_type("guide.pdf"), "application/pdf");
        assert_eq!(
            attachment_content_type("agreement.DOCX"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(attachment_content_type("noext"), "application/octet-stream");
    }
}
