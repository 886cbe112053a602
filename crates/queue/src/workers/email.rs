//! Email delivery worker.

use apalis::prelude::*;
use afrec_core::{EmailMessage, EmailService};
use tracing::{error, info};

use crate::jobs::EmailJob;

/// Context for the email worker.
#[derive(Clone)]
pub struct EmailWorkerContext {
    pub email_service: EmailService,
}

impl EmailWorkerContext {
    /// Create a new email worker context.
    #[must_use]
    pub const fn new(email_service: EmailService) -> Self {
        Self { email_service }
    }
}

/// Worker function for delivering queued emails.
///
/// # Errors
/// Returns an error if delivery fails, letting Apalis retry the job.
pub async fn email_worker(job: EmailJob, ctx: Data<EmailWorkerContext>) -> Result<(), Error> {
    info!(
        recipients = job.to.len(),
        subject = %job.subject,
        "Delivering queued email"
    );

    let message = EmailMessage {
        to: job.to.clone(),
        subject: job.subject.clone(),
        text_body: job.text_body,
        html_body: job.html_body,
        reply_to: None,
        attachments: Vec::new(),
    };

    match ctx.email_service.send(message).await {
        Ok(()) => {
            info!(subject = %job.subject, "Queued email delivered");
            Ok(())
        }
        Err(e) => {
            error!(subject = %job.subject, error = %e, "Failed to deliver queued email");
            let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e);
            Err(Error::Failed(boxed.into()))
        }
    }
}
