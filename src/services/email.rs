// src/services/email.rs
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::Region;
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::common::helpers::safe_token_log;
use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SES operation failed: {0}")]
    Ses(String),
}

/// Outgoing mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// Sends through AWS SES v2 using the default credential chain
pub struct SesMailer {
    client: SesClient,
    from_email: String,
}

impl SesMailer {
    pub async fn new(from_email: String, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let aws_config = loader.load().await;

        Self {
            client: SesClient::new(&aws_config),
            from_email,
        }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let destination = Destination::builder().to_addresses(to).build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::Build(format!("subject: {}", e)))?;

        let body_content = Content::builder()
            .data(html)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::Build(format!("body: {}", e)))?;

        let message = Message::builder()
            .subject(subject_content)
            .body(SesBody::builder().html(body_content).build())
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&self.from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = %safe_email_log(to), "Failed to send email via SES");
                MailError::Ses(e.to_string())
            })?;

        info!(
            to = %safe_email_log(to),
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );
        Ok(())
    }
}

/// Development transport: logs the message instead of delivering it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        info!(
            to = %safe_email_log(to),
            subject = %subject,
            "Email delivery not configured, message not sent"
        );
        debug!(body = %redact_link_tokens(html), "Undelivered email body");
        Ok(())
    }
}

fn link_token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"token=([A-Za-z0-9]+)")
            .unwrap_or_else(|e| panic!("token pattern must compile: {e}"))
    })
}

/// Masks every `token=` query value so logged mail bodies hold no usable links
pub fn redact_link_tokens(html: &str) -> String {
    link_token_regex()
        .replace_all(html, |caps: &Captures| {
            format!("token={}", safe_token_log(&caps[1]))
        })
        .into_owned()
}

pub const EMAIL_VERIFICATION_SUBJECT: &str = "Confirm your ViraCard email";

pub fn generate_email_verification_email(verify_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #4F46E5; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Confirm your email</h1>
        </div>
        <div class="content">
            <p>Someone signed up for ViraCard with this email address and a password.</p>

            <p><a class="button" href="{link}">Confirm and sign in</a></p>

            <p>If the button does not work, copy this link into your browser:<br>{link}</p>

            <p>The link expires in 24 hours. If you did not sign up, ignore this email and the password will never be activated.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        link = verify_link
    )
}

pub const PASSWORD_RESET_SUBJECT: &str = "Reset your ViraCard password";

pub fn generate_password_reset_email(reset_link: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #4F46E5; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: #4F46E5; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Reset your password</h1>
        </div>
        <div class="content">
            <p>We received a request to reset the password for your ViraCard account.</p>

            <p><a class="button" href="{link}">Choose a new password</a></p>

            <p>If the button does not work, copy this link into your browser:<br>{link}</p>

            <p>The link expires in one hour. If you did not ask for a reset, you can ignore this email.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        link = reset_link
    )
}
