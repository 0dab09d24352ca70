//! Email delivery abstraction and the account lifecycle templates.
//!
//! Registration, resend-verification, and password-reset flows hand a fully
//! rendered message to an `EmailSender`. Delivery happens inline so the
//! triggering handler can report `email_sent` to the caller; where the flow
//! must stay opaque (password reset), the handler swallows the error after
//! logging it. The default sender for local dev is `LogEmailSender`, which
//! logs and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Email delivery abstraction used by the account lifecycle flows.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the caller can flag the miss.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body_text,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the account verification message with its `{base}/verify?token=` link.
#[must_use]
pub fn verification_email(base_url: &str, to_email: &str, token: &str) -> EmailMessage {
    let verify_url = build_link(base_url, "verify", token);
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verify your AquaLeaf account".to_string(),
        body_text: format!(
            "Welcome to AquaLeaf!\n\nPlease verify by visiting: {verify_url}"
        ),
        body_html: format!(
            "<p>Welcome to <strong>AquaLeaf</strong>!</p>\
             <p><a href=\"{verify_url}\">Click here to verify</a> your email.</p>"
        ),
    }
}

/// Build the password reset message with its `{base}/reset-password?token=` link.
#[must_use]
pub fn reset_email(base_url: &str, to_email: &str, token: &str) -> EmailMessage {
    let reset_url = build_link(base_url, "reset-password", token);
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "AquaLeaf Password Reset".to_string(),
        body_text: format!(
            "You requested a password reset for your AquaLeaf account. \
             Click the link below to reset your password:\n\n{reset_url}\n\n\
             If you did not request this, you can safely ignore this email."
        ),
        body_html: format!(
            "<p>You requested a password reset for your AquaLeaf account.</p>\
             <p><a href=\"{reset_url}\">Click here to reset your password</a></p>\
             <p>If you did not request this, you can safely ignore this email.</p>"
        ),
    }
}

fn build_link(base_url: &str, path: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/{path}?token={token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_email_contains_link() {
        let message = verification_email("https://farm.aqualeaf.dev/", "a@x.com", "tok123");
        assert_eq!(message.to_email, "a@x.com");
        assert!(
            message
                .body_text
                .contains("https://farm.aqualeaf.dev/verify?token=tok123")
        );
        assert!(
            message
                .body_html
                .contains("https://farm.aqualeaf.dev/verify?token=tok123")
        );
    }

    #[test]
    fn reset_email_contains_link() {
        let message = reset_email("http://localhost:3000", "a@x.com", "tok456");
        assert_eq!(message.subject, "AquaLeaf Password Reset");
        assert!(
            message
                .body_text
                .contains("http://localhost:3000/reset-password?token=tok456")
        );
    }

    #[test]
    fn log_sender_always_succeeds() {
        let message = verification_email("http://localhost:3000", "a@x.com", "tok");
        assert!(LogEmailSender.send(&message).is_ok());
    }
}
