use serde_json::json;

use super::Outgoing;
use crate::config::EmailConfig;

/// Send email via Postmark API (https://postmarkapp.com/developer/api/email-api)
pub fn send(cfg: &EmailConfig, mail: &Outgoing) -> Result<(), String> {
    if cfg.postmark_server_token.is_empty() {
        return Err("Postmark server token not configured".into());
    }

    let mut payload = json!({
        "From": mail.from,
        "To": mail.to,
        "Subject": mail.subject,
        "TextBody": mail.body,
        "MessageStream": "outbound"
    });
    if let Some(reply_to) = &mail.reply_to {
        payload["ReplyTo"] = json!(reply_to);
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| format!("HTTP client error: {}", e))?;

    let resp = client
        .post("https://api.postmarkapp.com/email")
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .header("X-Postmark-Server-Token", &cfg.postmark_server_token)
        .json(&payload)
        .send()
        .map_err(|e| format!("Postmark request failed: {}", e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        return Err(format!("Postmark returned {}: {}", status, text));
    }

    Ok(())
}
