pub mod postmark;
pub mod resend;
pub mod smtp;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::EmailConfig;

/// A message submitted through the public contact form.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// One outgoing email, as handed to a provider.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Forward a contact-form message to the site's contact address.
pub fn send_contact_message(
    cfg: &EmailConfig,
    site_name: &str,
    to: &str,
    msg: &ContactMessage,
) -> Result<(), String> {
    if to.trim().is_empty() {
        return Err("No contact address configured".into());
    }
    let from = if cfg.from_address.is_empty() {
        to.to_string()
    } else {
        cfg.from_address.clone()
    };

    let mail = Outgoing {
        from,
        to: to.to_string(),
        reply_to: Some(msg.email.clone()),
        subject: contact_subject(site_name, &msg.subject),
        body: contact_body(site_name, msg),
    };

    match send_via_configured_provider(cfg, &mail) {
        Ok(provider) => {
            log::info!("[email] Contact message from {} sent via {}", msg.email, provider);
            Ok(())
        }
        Err(e) => {
            log::error!("[email] Failed to send contact message from {}: {}", msg.email, e);
            Err(e)
        }
    }
}

fn contact_subject(site_name: &str, subject: &str) -> String {
    format!("[{}] {}", site_name, subject)
}

fn contact_body(site_name: &str, msg: &ContactMessage) -> String {
    format!(
        "New message from the {} contact form\n\n\
         Name: {}\n\
         Email: {}\n\
         Subject: {}\n\n\
         {}\n",
        site_name, msg.name, msg.email, msg.subject, msg.message
    )
}

/// Send via the configured provider chain. Returns the provider that delivered.
fn send_via_configured_provider(cfg: &EmailConfig, mail: &Outgoing) -> Result<&'static str, String> {
    let chain = cfg.enabled_providers();
    let mut last_error = String::new();

    for provider_name in chain {
        let (name, result) = match provider_name {
            "resend" => ("resend", resend::send(cfg, mail)),
            "postmark" => ("postmark", postmark::send(cfg, mail)),
            "smtp" => ("smtp", smtp::send(cfg, mail)),
            other => {
                log::warn!("[email] Unknown email provider: {}", other);
                continue;
            }
        };

        match result {
            Ok(()) => return Ok(name),
            Err(e) => {
                log::warn!("[email] Provider {} failed: {}", name, e);
                last_error = e;
                if !cfg.failover {
                    return Err(last_error);
                }
            }
        }
    }

    if last_error.is_empty() {
        Err("No email provider configured or enabled".into())
    } else {
        Err(format!("All email providers failed. Last error: {}", last_error))
    }
}

/// SMTP delivery through lettre, STARTTLS on the given port.
pub fn send_smtp(
    host: &str,
    port: u16,
    username: &str,
    password: &str,
    mail: &Outgoing,
) -> Result<(), String> {
    let email = build_message(mail)?;
    let creds = Credentials::new(username.to_string(), password.to_string());

    let mailer = SmtpTransport::starttls_relay(host)
        .map_err(|e| format!("SMTP relay error: {}", e))?
        .port(port)
        .credentials(creds)
        .build();

    mailer.send(&email).map_err(|e| format!("SMTP send error: {}", e))?;
    Ok(())
}

fn build_message(mail: &Outgoing) -> Result<Message, String> {
    let mut builder = Message::builder()
        .from(mail.from.parse().map_err(|e| format!("Invalid from address: {}", e))?)
        .to(mail.to.parse().map_err(|e| format!("Invalid to address: {}", e))?)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    if let Some(reply_to) = &mail.reply_to {
        builder = builder.reply_to(
            reply_to
                .parse()
                .map_err(|e| format!("Invalid reply-to address: {}", e))?,
        );
    }
    builder
        .body(mail.body.clone())
        .map_err(|e| format!("Failed to build email: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContactMessage {
        ContactMessage {
            name: "Maja".into(),
            email: "maja@example.com".into(),
            subject: "Wedding Inquiry".into(),
            message: "Är ni lediga i juni?".into(),
        }
    }

    #[test]
    fn subject_and_body_layout() {
        let msg = sample();
        assert_eq!(contact_subject("ANO Fotografi", &msg.subject), "[ANO Fotografi] Wedding Inquiry");
        let body = contact_body("ANO Fotografi", &msg);
        assert!(body.contains("Name: Maja"));
        assert!(body.contains("Email: maja@example.com"));
        assert!(body.ends_with("Är ni lediga i juni?\n"));
    }

    #[test]
    fn no_provider_configured_is_an_error() {
        let cfg = EmailConfig::default();
        let err = send_contact_message(&cfg, "ANO", "elena@photography.com", &sample()).unwrap_err();
        assert!(err.contains("No email provider"));
    }

    #[test]
    fn empty_recipient_is_rejected() {
        let cfg = EmailConfig::default();
        assert!(send_contact_message(&cfg, "ANO", "  ", &sample()).is_err());
    }

    #[test]
    fn message_carries_reply_to() {
        let mail = Outgoing {
            from: "site@example.com".into(),
            to: "elena@photography.com".into(),
            reply_to: Some("maja@example.com".into()),
            subject: "[ANO] Other".into(),
            body: "hej".into(),
        };
        let formatted = String::from_utf8(build_message(&mail).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Reply-To: maja@example.com"));

        let bad = Outgoing {
            reply_to: Some("not an address".into()),
            ..mail
        };
        assert!(build_message(&bad).is_err());
    }
}
