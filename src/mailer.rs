use crate::config::SmtpConfig;
use crate::helper::input_helpers::ContactMessage;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("send failed: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
}

/// Outbound mail relay for the contact form. Built once at startup and
/// shared via `web::Data`; each submission is a single fire-and-forget
/// send with a boolean outcome, no queue and no retry.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipient: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailerError::Config(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|_| MailerError::Address(config.from_address.clone()))?;
        let recipient: Mailbox = config
            .contact_recipient
            .parse()
            .map_err(|_| MailerError::Address(config.contact_recipient.clone()))?;

        Ok(Mailer {
            transport: builder.build(),
            from,
            recipient,
        })
    }

    /// Relays one contact-form submission to the configured recipient as a
    /// multipart plain+HTML message. The caller validates required fields
    /// before this is ever reached.
    pub async fn send_contact_message(&self, form: &ContactMessage) -> Result<(), MailerError> {
        let phone = form.phone.as_deref().unwrap_or("Non renseigné");

        let text_body = format!(
            "Nom: {}\nEmail: {}\nTéléphone: {}\n\nMessage:\n{}",
            form.name, form.email, phone, form.message
        );
        let html_body = format!(
            "<h2>Nouveau message depuis le site</h2>\
             <p><strong>Nom complet :</strong> {}</p>\
             <p><strong>Email :</strong> {}</p>\
             <p><strong>Téléphone :</strong> {}</p>\
             <p><strong>Message :</strong><br/>{}</p>",
            escape_html(&form.name),
            escape_html(&form.email),
            escape_html(phone),
            escape_html(&form.message).replace('\n', "<br/>")
        );

        let message = Message::builder()
            .from(self.from.clone())
            .reply_to(
                form.email
                    .parse()
                    .map_err(|_| MailerError::Address(form.email.clone()))?,
            )
            .to(self.recipient.clone())
            .subject("Nouveau message depuis le site")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.transport.send(message).await?;
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
