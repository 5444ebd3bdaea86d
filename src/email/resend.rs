use serde_json::json;

use super::Outgoing;
use crate::config::EmailConfig;

/// Send email via Resend API (https://resend.com/docs/api-reference/emails/send-email)
pub fn send(cfg: &EmailConfig, mail: &Outgoing) -> Result<(), String> {
    if cfg.resend_api_key.is_empty() {
        return Err("Resend API key not configured".into());
    }

    let mut payload = json!({
        "from": mail.from,
        "to": [mail.to],
        "subject": mail.subject,
        "text": mail.body
    });
    if let Some(reply_to) = &mail.reply_to {
        payload["reply_to"] = json!(reply_to);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| format!("HTTP client error: {}", e))?;

    let resp = client
        .post("https://api.resend.com/emails")
        .header("Authorization", format!("Bearer {}", cfg.resend_api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .map_err(|e| format!("Resend request failed: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        return Err(format!("Resend returned {}: {}", status, text));
    }

    Ok(())
}
