use super::{send_smtp, Outgoing};
use crate::config::EmailConfig;

pub fn send(cfg: &EmailConfig, mail: &Outgoing) -> Result<(), String> {
    if cfg.smtp_host.is_empty() || cfg.smtp_username.is_empty() {
        return Err("SMTP host or username not configured".into());
    }

    send_smtp(
        &cfg.smtp_host,
        cfg.smtp_port,
        &cfg.smtp_username,
        &cfg.smtp_password,
        mail,
    )
}
