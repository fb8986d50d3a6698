//! Outgoing notifications.
//!
//! Reset links leave the system through a [`Notifier`]. With an SMTP relay
//! configured mail goes out through lettre; without one the message is
//! written to the log, which is what local development wants.

mod mailer;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

pub use mailer::{LogNotifier, SmtpNotifier};

use crate::config::MailConfig;
use crate::errors::AppResult;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Delivery channel for out-of-band messages.
///
/// A failed delivery must come back as `AppError::DeliveryFailed`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// Pick the notifier matching the mail configuration.
pub fn from_config(config: &MailConfig) -> AppResult<Arc<dyn Notifier>> {
    if config.is_configured() {
        Ok(Arc::new(SmtpNotifier::new(config)?))
    } else {
        tracing::warn!("SMTP not configured - emails will be logged instead of sent");
        Ok(Arc::new(LogNotifier::new(config.from.clone())))
    }
}
