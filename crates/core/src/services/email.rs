//! Email notification service.
//!
//! Donors, requesters and assigned residents are told about officer
//! decisions. A failed send never fails the decision itself; callers only
//! look at [`EmailDeliveryResult::success`].

use chrono::{NaiveDate, NaiveTime};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};

use foodify_common::{
    config::{EmailProviderSettings, EmailSettings},
    AppError, AppResult,
};

/// Email provider configuration.
#[derive(Debug, Clone)]
pub enum EmailProvider {
    /// SMTP relay
    Smtp(SmtpConfig),
    /// SendGrid
    SendGrid(SendGridConfig),
    /// Mailgun
    Mailgun(MailgunConfig),
}

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// Use STARTTLS
    pub use_tls: bool,
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
    /// Site name (for templates)
    pub site_name: String,
    /// Site URL (for templates)
    pub site_url: String,
}

impl From<EmailSettings> for EmailConfig {
    fn from(settings: EmailSettings) -> Self {
        let provider = match settings.provider {
            EmailProviderSettings::Smtp {
                host,
                port,
                use_tls,
                username,
                password,
            } => EmailProvider::Smtp(SmtpConfig {
                host,
                port,
                use_tls,
                username,
                password,
            }),
            EmailProviderSettings::SendGrid { api_key } => {
                EmailProvider::SendGrid(SendGridConfig { api_key })
            }
            EmailProviderSettings::Mailgun {
                api_key,
                domain,
                eu_region,
            } => EmailProvider::Mailgun(MailgunConfig {
                api_key,
                domain,
                eu_region,
            }),
        };

        Self {
            provider,
            from_address: settings.from_address,
            from_name: settings.from_name,
            reply_to: settings.reply_to,
            site_name: settings.site_name,
            site_url: settings.site_url,
        }
    }
}

/// Email notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailNotificationType {
    /// Donation went live
    DonationApproved,
    /// Donation was turned down
    DonationRejected,
    /// Donation was removed by an officer
    DonationDeleted,
    /// Donation was handed to a resident
    DonationAssigned,
    /// Request was approved
    RequestApproved,
    /// Request was rejected
    RequestRejected,
    /// Request was completed
    RequestCompleted,
}

impl std::fmt::Display for EmailNotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DonationApproved => "donation_approved",
            Self::DonationRejected => "donation_rejected",
            Self::DonationDeleted => "donation_deleted",
            Self::DonationAssigned => "donation_assigned",
            Self::RequestApproved => "request_approved",
            Self::RequestRejected => "request_rejected",
            Self::RequestCompleted => "request_completed",
        };
        write!(f, "{s}")
    }
}

/// Email message to be sent.
#[derive(Debug)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Recipient display name
    pub to_name: Option<String>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body (optional)
    pub html_body: Option<String>,
}

/// Template variables for emails.
#[derive(Debug, Default, Clone)]
pub struct EmailTemplateVars {
    /// Recipient's full name
    pub recipient_name: String,
    /// Donation title
    pub title: String,
    pub description: Option<String>,
    pub food_type: Option<String>,
    pub quantity: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub pickup_start: Option<NaiveTime>,
    pub pickup_end: Option<NaiveTime>,
    /// Rejection or deletion reason, or officer notes on a request
    pub reason: Option<String>,
    /// Assignment notes
    pub notes: Option<String>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
}

impl EmailTemplateVars {
    /// Expiration date as `Mon DD, YYYY`, or "Not specified".
    #[must_use]
    pub fn expiration_label(&self) -> String {
        self.expiration_date.map_or_else(
            || "Not specified".to_string(),
            |d| d.format("%b %d, %Y").to_string(),
        )
    }

    /// Pickup window, when both ends are known.
    #[must_use]
    pub fn pickup_label(&self) -> Option<String> {
        match (self.pickup_start, self.pickup_end) {
            (Some(start), Some(end)) => Some(format!(
                "Available for pickup: {} - {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )),
            _ => None,
        }
    }
}

/// Email delivery result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    /// Whether the email was sent successfully
    pub success: bool,
    /// Message ID from provider (if available)
    pub message_id: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl EmailDeliveryResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Suffix appended to an action message once the notification was attempted.
#[must_use]
pub fn email_suffix(sent: bool, recipient: &str) -> String {
    if sent {
        format!(" Email notification sent to {recipient}.")
    } else {
        " Note: Email notification could not be sent.".to_string()
    }
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

    /// Create a service from the `email` configuration section.
    #[must_use]
    pub fn from_settings(settings: Option<EmailSettings>) -> Self {
        Self::new(settings.map(EmailConfig::from))
    }

    /// Check if email service is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send an email.
    pub async fn send(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Config("Email service not configured".to_string()))?;

        match &config.provider {
            EmailProvider::Smtp(smtp) => self.send_smtp(smtp, config, message).await,
            EmailProvider::SendGrid(sg) => self.send_sendgrid(sg, config, message).await,
            EmailProvider::Mailgun(mg) => self.send_mailgun(mg, config, message).await,
        }
    }

    /// Render and send a notification. Failures are logged and reported in
    /// the result, never returned as errors.
    pub async fn send_notification(
        &self,
        notification_type: EmailNotificationType,
        to: &str,
        vars: &EmailTemplateVars,
    ) -> EmailDeliveryResult {
        let Some(config) = self.config.as_ref() else {
            tracing::debug!(kind = %notification_type, "Email disabled, skipping notification");
            return EmailDeliveryResult::failed("Email service not configured");
        };

        let (subject, text_body, html_body) = render_template(notification_type, vars, config);

        let message = EmailMessage {
            to: to.to_string(),
            to_name: Some(vars.recipient_name.clone()),
            subject,
            text_body,
            html_body: Some(html_body),
        };

        match self.send(message).await {
            Ok(result) => {
                if !result.success {
                    tracing::warn!(
                        kind = %notification_type,
                        error = ?result.error,
                        "Email notification rejected by provider"
                    );
                }
                result
            }
            Err(e) => {
                tracing::warn!(kind = %notification_type, error = %e, "Email notification failed");
                EmailDeliveryResult::failed(e.message())
            }
        }
    }

    // Provider-specific implementations

    async fn send_smtp(
        &self,
        smtp: &SmtpConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;
        let to = Mailbox::new(
            message.to_name.clone(),
            message
                .to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?,
        );

        let mut builder = Message::builder().from(from).to(to).subject(&message.subject);
        if let Some(reply_to) = &config.reply_to {
            if let Ok(mailbox) = reply_to.parse::<Mailbox>() {
                builder = builder.reply_to(mailbox);
            }
        }

        let text = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body);
        let email = match message.html_body {
            Some(html) => builder.multipart(
                MultiPart::alternative().singlepart(text).singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html),
                ),
            ),
            None => builder.singlepart(text),
        }
        .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        let mut transport = if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        }
        .port(smtp.port);

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            transport = transport.credentials(Credentials::new(username.clone(), password.clone()));
        }

        match transport.build().send(email).await {
            Ok(response) => Ok(EmailDeliveryResult {
                success: response.is_positive(),
                message_id: response.first_line().map(String::from),
                error: None,
            }),
            Err(e) => Ok(EmailDeliveryResult::failed(e.to_string())),
        }
    }

    async fn send_sendgrid(
        &self,
        sg: &SendGridConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        let mut content = vec![serde_json::json!({"type": "text/plain", "value": message.text_body})];
        if let Some(html) = message.html_body {
            content.push(serde_json::json!({"type": "text/html", "value": html}));
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": [{"email": message.to, "name": message.to_name}]
            }],
            "from": {
                "email": config.from_address,
                "name": config.from_name
            },
            "subject": message.subject,
            "content": content
        });

        let response = self
            .http_client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header("Authorization", format!("Bearer {}", sg.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("SendGrid request failed: {e}")))?;

        if response.status().is_success() {
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(EmailDeliveryResult {
                success: true,
                message_id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult::failed(error_text))
        }
    }

    async fn send_mailgun(
        &self,
        mg: &MailgunConfig,
        config: &EmailConfig,
        message: EmailMessage,
    ) -> AppResult<EmailDeliveryResult> {
        #[derive(Deserialize)]
        struct MailgunResponse {
            id: Option<String>,
        }

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
            ("to", message.to),
            ("subject", message.subject),
            ("text", message.text_body),
        ];

        if let Some(html) = message.html_body {
            form_params.push(("html", html));
        }

        let response = self
            .http_client
            .post(format!("{base_url}/v3/{}/messages", mg.domain))
            .basic_auth("api", Some(&mg.api_key))
            .form(&form_params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Mailgun request failed: {e}")))?;

        if response.status().is_success() {
            let result: MailgunResponse = response
                .json()
                .await
                .unwrap_or(MailgunResponse { id: None });
            Ok(EmailDeliveryResult {
                success: true,
                message_id: result.id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult::failed(error_text))
        }
    }
}

/// Render subject, plain text and HTML for a notification.
#[must_use]
pub fn render_template(
    notification_type: EmailNotificationType,
    vars: &EmailTemplateVars,
    config: &EmailConfig,
) -> (String, String, String) {
    let name = vars.recipient_name.as_str();
    let title = vars.title.as_str();

    let (subject, heading, intro, mut details, closing) = match notification_type {
        EmailNotificationType::DonationApproved => (
            "🎉 Your Food Donation Has Been Approved!",
            "🎉 Donation Approved!",
            "Great news! Your food donation has been reviewed and approved by our team. \
             It's now live and available for community members to view and request.",
            donation_details(vars),
            "Please respond promptly to pickup requests. Thank you for helping reduce food waste! 🌱",
        ),
        EmailNotificationType::DonationRejected => (
            "❌ Food Donation Update - Requires Attention",
            "Donation Needs Attention",
            "Thank you for your donation. After review, our team could not approve it in its current form.",
            with_reason("Reason", vars.reason.as_deref(), donation_details(vars)),
            "You are welcome to update the details and submit it again.",
        ),
        EmailNotificationType::DonationDeleted => (
            "🗑️ Your Food Donation Has Been Removed",
            "Donation Removed",
            "Your food donation has been removed from the platform by a team officer.",
            with_reason("Reason", vars.reason.as_deref(), donation_details(vars)),
            "If you believe this was a mistake, please contact our support team.",
        ),
        EmailNotificationType::DonationAssigned => (
            "🎁 Food Donation Assigned to You!",
            "🎁 A Donation Is Waiting for You",
            "A team officer has assigned a food donation to you. Please contact the donor to arrange pickup.",
            {
                let mut rows = donation_details(vars);
                rows.push(("Donor", vars.donor_name.clone().unwrap_or_default()));
                rows.push(("Donor email", vars.donor_email.clone().unwrap_or_default()));
                if let Some(phone) = vars.donor_phone.as_deref().filter(|p| !p.is_empty()) {
                    rows.push(("Donor phone", phone.to_string()));
                }
                with_reason("Notes", vars.notes.as_deref(), rows)
            },
            "Please pick up the donation as soon as possible.",
        ),
        EmailNotificationType::RequestApproved => (
            "✅ Your Food Request Has Been Approved!",
            "✅ Request Approved",
            "Your request has been approved. Please coordinate pickup with the donor.",
            request_details(vars),
            "Thank you for being part of the community.",
        ),
        EmailNotificationType::RequestRejected => (
            "❌ Your Food Request Has Been Rejected",
            "Request Rejected",
            "Unfortunately your request could not be approved this time.",
            with_reason("Notes", vars.reason.as_deref(), request_details(vars)),
            "Other donations may still be available, so keep browsing.",
        ),
        EmailNotificationType::RequestCompleted => (
            "🎉 Your Food Request Has Been Completed!",
            "🎉 Request Completed",
            "Your request has been marked as completed. We hope you enjoy the food!",
            request_details(vars),
            "Thank you for helping reduce food waste. 🌱",
        ),
    };

    details.retain(|(_, value)| !value.is_empty());

    let mut text = format!("Dear {name},\n\n{intro}\n\n");
    for (label, value) in &details {
        text.push_str(&format!("{label}: {value}\n"));
    }
    text.push_str(&format!("\n{closing}\n\n{}: {}", config.site_name, config.site_url));

    let rows: String = details
        .iter()
        .map(|(label, value)| {
            format!(
                "<p><strong>{}:</strong> {}</p>",
                escape_html(label),
                escape_html(value)
            )
        })
        .collect();
    let html = wrap_html(
        &format!(
            "<h1>{}</h1><p>Dear <strong>{}</strong>,</p><p>{}</p>\
             <blockquote><h3>{}</h3>{rows}</blockquote><p>{}</p>",
            escape_html(heading),
            escape_html(name),
            escape_html(intro),
            escape_html(title),
            escape_html(closing)
        ),
        config,
    );

    (subject.to_string(), text, html)
}

fn donation_details(vars: &EmailTemplateVars) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Title", vars.title.clone()),
        ("Description", vars.description.clone().unwrap_or_default()),
        ("Food Type", vars.food_type.clone().unwrap_or_default()),
        ("Quantity", vars.quantity.clone().unwrap_or_default()),
        ("Expiration Date", vars.expiration_label()),
        ("Location", vars.location.clone().unwrap_or_default()),
    ];
    if let Some(pickup) = vars.pickup_label() {
        rows.push(("Pickup", pickup));
    }
    rows
}

fn request_details(vars: &EmailTemplateVars) -> Vec<(&'static str, String)> {
    vec![
        ("Donation", vars.title.clone()),
        ("Donor", vars.donor_name.clone().unwrap_or_default()),
        ("Donor email", vars.donor_email.clone().unwrap_or_default()),
    ]
}

fn with_reason(
    label: &'static str,
    reason: Option<&str>,
    mut rows: Vec<(&'static str, String)>,
) -> Vec<(&'static str, String)> {
    if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
        rows.push((label, reason.to_string()));
    }
    rows
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
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
        a {{ color: #28a745; }}
        blockquote {{ margin: 10px 0; padding: 10px 20px; border-left: 4px solid #28a745; background: #f8f9fa; }}
    </style>
</head>
<body>
    {}
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        This is an automated message from <a href="{}">{}</a>. Please do not reply to this email.
    </p>
</body>
</html>"#,
        content,
        config.site_url,
        escape_html(&config.site_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            provider: EmailProvider::Mailgun(MailgunConfig {
                api_key: "key".to_string(),
                domain: "mg.example.org".to_string(),
                eu_region: false,
            }),
            from_address: "noreply@example.org".to_string(),
            from_name: "Foodify Team".to_string(),
            reply_to: None,
            site_name: "Foodify".to_string(),
            site_url: "https://foodify.example.org".to_string(),
        }
    }

    fn vars() -> EmailTemplateVars {
        EmailTemplateVars {
            recipient_name: "Dana <Donor>".to_string(),
            title: "Fresh bread".to_string(),
            food_type: Some("bakery".to_string()),
            quantity: Some("4 loaves".to_string()),
            expiration_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            pickup_start: NaiveTime::from_hms_opt(9, 0, 0),
            pickup_end: NaiveTime::from_hms_opt(12, 30, 0),
            ..Default::default()
        }
    }

    #[test]
    fn test_subjects() {
        let config = test_config();
        let cases = [
            (EmailNotificationType::DonationApproved, "🎉 Your Food Donation Has Been Approved!"),
            (EmailNotificationType::DonationRejected, "❌ Food Donation Update - Requires Attention"),
            (EmailNotificationType::DonationDeleted, "🗑️ Your Food Donation Has Been Removed"),
            (EmailNotificationType::DonationAssigned, "🎁 Food Donation Assigned to You!"),
            (EmailNotificationType::RequestApproved, "✅ Your Food Request Has Been Approved!"),
            (EmailNotificationType::RequestRejected, "❌ Your Food Request Has Been Rejected"),
            (EmailNotificationType::RequestCompleted, "🎉 Your Food Request Has Been Completed!"),
        ];

        for (kind, expected) in cases {
            let (subject, _, _) = render_template(kind, &vars(), &config);
            assert_eq!(subject, expected);
        }
    }

    #[test]
    fn test_approved_body_has_dates_and_pickup() {
        let (_, text, html) =
            render_template(EmailNotificationType::DonationApproved, &vars(), &test_config());

        assert!(text.contains("Expiration Date: Mar 07, 2025"));
        assert!(text.contains("Available for pickup: 09:00 - 12:30"));
        assert!(html.contains("Dana &lt;Donor&gt;"));
        assert!(!html.contains("<Donor>"));
    }

    #[test]
    fn test_expiration_not_specified() {
        let vars = EmailTemplateVars::default();
        assert_eq!(vars.expiration_label(), "Not specified");
        assert!(vars.pickup_label().is_none());
    }

    #[test]
    fn test_rejection_reason_in_body() {
        let mut vars = vars();
        vars.reason = Some("Photos are missing".to_string());

        let (_, text, _) =
            render_template(EmailNotificationType::DonationRejected, &vars, &test_config());

        assert!(text.contains("Reason: Photos are missing"));
    }

    #[test]
    fn test_email_suffix() {
        assert_eq!(email_suffix(true, "donor"), " Email notification sent to donor.");
        assert_eq!(
            email_suffix(false, "donor"),
            " Note: Email notification could not be sent."
        );
    }

    #[tokio::test]
    async fn test_disabled_service_reports_failure() {
        let service = EmailService::new(None);
        assert!(!service.is_enabled());

        let result = service
            .send_notification(EmailNotificationType::DonationApproved, "a@example.org", &vars())
            .await;

        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
