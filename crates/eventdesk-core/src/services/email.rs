/// Outgoing email: composition with lettre, delivery through SES
use crate::error::EventDeskError;
use crate::models::{EventSpot, User};
use crate::utils::redact_email;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct OutgoingEmail {
    #[builder(setter(into))]
    pub to: String,
    #[builder(setter(into))]
    pub subject: String,
    #[builder(setter(into))]
    pub text: String,
    #[builder(default, setter(strip_option, into))]
    pub html: Option<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends the email, returning the provider's message id
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EventDeskError>;
}

pub struct SesEmailSender {
    client: aws_sdk_ses::Client,
    from: String,
}

impl SesEmailSender {
    pub fn new(client: aws_sdk_ses::Client, from: impl Into<String>) -> Self {
        Self {
            client,
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, EventDeskError> {
        use aws_sdk_ses::primitives::Blob;

        let raw_email = compose(&self.from, email)?;
        let raw_message = aws_sdk_ses::types::RawMessage::builder()
            .data(Blob::new(raw_email))
            .build()
            .map_err(|e| EventDeskError::Email(format!("Failed to build raw message: {}", e)))?;

        let response = self
            .client
            .send_raw_email()
            .raw_message(raw_message)
            .source(&self.from)
            .destinations(&email.to)
            .send()
            .await
            .map_err(|e| EventDeskError::Email(format!("SES send_raw_email failed: {}", e)))?;

        let message_id = response.message_id;
        tracing::info!(
            message_id = %message_id,
            to = %redact_email(&email.to),
            "Sent email via SES"
        );
        Ok(message_id)
    }
}

/// Builds the raw MIME message; multipart alternative when an HTML body is present
pub fn compose(from: &str, email: &OutgoingEmail) -> Result<Vec<u8>, EventDeskError> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| EventDeskError::Email(format!("Invalid from address: {}", e)))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| EventDeskError::Email(format!("Invalid to address: {}", e)))?;

    let builder = lettre::Message::builder()
        .from(from)
        .to(to)
        .subject(&email.subject);

    let message = match &email.html {
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        ),
        None => builder.body(email.text.clone()),
    }
    .map_err(|e| EventDeskError::Email(format!("Failed to build email: {}", e)))?;

    Ok(message.formatted())
}

/// Notification sent to the user a spot was just assigned to
pub fn spot_assigned(user: &User, spot: &EventSpot, app_url: Option<&str>) -> OutgoingEmail {
    let mut text = format!(
        "Hello {},\n\nA spot of type \"{}\" has been assigned to you.\n",
        user.first_name, spot.spot_type
    );
    if !spot.is_paid() {
        text.push_str("Please upload your proof of payment to complete your registration.\n");
    }
    push_app_link(&mut text, app_url);

    OutgoingEmail::builder()
        .to(user.email.clone())
        .subject("A spot has been assigned to you")
        .text(text)
        .build()
}

/// Notification sent to a spot holder once their payment is confirmed
pub fn payment_confirmed(user: &User, spot: &EventSpot, app_url: Option<&str>) -> OutgoingEmail {
    let mut text = format!(
        "Hello {},\n\nYour payment for the spot of type \"{}\" has been confirmed. See you at the event!\n",
        user.first_name, spot.spot_type
    );
    push_app_link(&mut text, app_url);

    OutgoingEmail::builder()
        .to(user.email.clone())
        .subject("Your payment has been confirmed")
        .text(text)
        .build()
}

fn push_app_link(text: &mut String, app_url: Option<&str>) {
    if let Some(url) = app_url {
        text.push_str(&format!("\nOpen the app: {}\n", url));
    }
}
