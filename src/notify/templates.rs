//! Email bodies.

use chrono::{DateTime, Utc};
use url::Url;

use super::EmailMessage;
use crate::config::RESET_EMAIL_SUBJECT;

/// Password recovery email carrying the redemption link.
pub fn reset_password_email(to: &str, link: &Url, requested_at: DateTime<Utc>) -> EmailMessage {
    let body = format!(
        r#"<html>
  <body>
    <p>Hello,</p>
    <p>A password reset was requested for your account on {date}.</p>
    <p>To choose a new password, follow this link:</p>
    <p><a href="{link}">{link}</a></p>
    <p>If you did not make this request you can ignore this email.</p>
  </body>
</html>
"#,
        date = requested_at.format("%Y-%m-%d %H:%M UTC"),
        link = link,
    );

    EmailMessage::new(to, RESET_EMAIL_SUBJECT, body)
}
