use crate::config::{ConfigError, EmailConfig};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, instrument};

/// Email service errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SMTP error: {0}")]
    SmtpError(String),

    #[error("Message building error: {0}")]
    MessageError(String),

    #[error("Address error: {0}")]
    AddressError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

/// Plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text_body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text_body: text_body.into(),
        }
    }

    /// The password reset notice sent by the forgot-password flow.
    pub fn password_reset(to: &str, reset_url: &str, valid_minutes: u64) -> Self {
        let body = format!(
            "We have received a password reset request. Please use the link below to reset your password\n\n\
             {reset_url}\n\n\
             This link will be valid for {valid_minutes} minutes.\n\n\
             If you did not request a password reset, you can ignore this email."
        );
        Self::new(to, "Password change request received", body)
    }
}

/// Outbound mail transport
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// SMTP email service implementation
pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    #[instrument(skip(config), fields(host = %config.smtp_host, port = config.smtp_port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        info!("Initializing SMTP email service");

        config.validate()?;

        let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(config.connection_timeout_secs)));

        if config.use_tls {
            let tls_parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;

            if config.use_starttls {
                transport_builder = transport_builder.tls(Tls::Required(tls_parameters));
            } else {
                transport_builder = transport_builder.tls(Tls::Wrapper(tls_parameters));
            }
        } else {
            transport_builder = transport_builder.tls(Tls::None);
        }

        if !config.smtp_username.is_empty() && !config.smtp_password.is_empty() {
            transport_builder = transport_builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let transport = transport_builder.build();

        info!("SMTP email service initialized successfully");
        Ok(Self { config, transport })
    }

    fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox = self
            .config
            .from_mailbox()
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email_message
            .to
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email_message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email_message.text_body)
            .map_err(|e| EmailError::MessageError(format!("Failed to build text message: {}", e)))
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email_message = self.build_message(message)?;

        self.transport.send(email_message).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            EmailError::SmtpError(format!("Failed to send email: {}", e))
        })?;

        info!("Email sent successfully");
        Ok(())
    }
}
