/// Email template functions
///
/// This module provides functions to generate common email templates.
use super::{send_email, EmailResult};
use crate::config::EmailConfig;

/// Send a confirmation code email
pub async fn send_confirmation_code_email(
    config: &EmailConfig,
    to: &str,
    username: &str,
    code: &str,
) -> EmailResult<()> {
    let body_text = format!(
        r#"Hello {},

Your confirmation code:

{}

Submit it together with your email address to obtain an API token.

If you did not request a code, please ignore this email.

---
Scorebook
"#,
        username, code
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Confirmation Code</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2>Your confirmation code</h2>
        <p>Hello <strong>{}</strong>,</p>
        <p>Submit this code together with your email address to obtain an API token:</p>
        <p style="font-family: monospace; font-size: 1.2em; word-break: break-all;">{}</p>
        <hr style="margin: 30px 0; border: none; border-top: 1px solid #ddd;">
        <p style="color: #666; font-size: 0.9em;">
            If you did not request a code, please ignore this email.
        </p>
    </div>
</body>
</html>"#,
        username, code
    );

    send_email(config, to, "Confirmation code", &body_text, Some(&body_html)).await
}
