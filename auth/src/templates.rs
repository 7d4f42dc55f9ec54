//! Verification email templates.

use crate::config::VerificationConfig;
use crate::state::Operation;

/// Callback link embedded in a verification email.
///
/// # Examples
///
/// ```
/// use orchid_auth::config::VerificationConfig;
/// use orchid_auth::state::Operation;
/// use orchid_auth::templates::callback_link;
///
/// let config = VerificationConfig::new("https://app.example.com/m/callback");
/// assert_eq!(
///     callback_link(&config, "AbCdEfGhIjKl", Operation::Login),
///     "https://app.example.com/m/callback?token=AbCdEfGhIjKl&operation=login&state=orchid"
/// );
/// ```
#[must_use]
pub fn callback_link(config: &VerificationConfig, code: &str, operation: Operation) -> String {
    format!(
        "{}?token={}&operation={}&state={}",
        config.callback_url,
        urlencoding::encode(code),
        operation.as_str(),
        urlencoding::encode(&config.state),
    )
}

/// Subject and HTML body for a verification email.
#[must_use]
pub fn compose_email(
    config: &VerificationConfig,
    code: &str,
    operation: Operation,
) -> (&'static str, String) {
    let link = callback_link(config, code, operation);
    let expiry = expiry_note(config.code_ttl);

    match operation {
        Operation::Register => (
            "Finish creating your account",
            format!(
                r#"<!DOCTYPE html>
<html>
<body style="font-family: sans-serif;">
  <h2>Welcome!</h2>
  <p>Click the link below to finish creating your account.</p>
  <p><a href="{link}">Create my account</a></p>
  <p>{expiry}</p>
  <p>If you did not request this, you can ignore this email.</p>
</body>
</html>"#
            ),
        ),
        Operation::Login => (
            "Sign in",
            format!(
                r#"<!DOCTYPE html>
<html>
<body style="font-family: sans-serif;">
  <h2>Sign in</h2>
  <p>Click the link below to sign in.</p>
  <p><a href="{link}">Sign in</a></p>
  <p>{expiry}</p>
  <p>If you did not request this, you can ignore this email.</p>
</body>
</html>"#
            ),
        ),
    }
}

fn expiry_note(ttl: chrono::Duration) -> String {
    let hours = ttl.num_hours();
    if hours >= 1 && ttl.num_minutes() % 60 == 0 {
        let unit = if hours == 1 { "hour" } else { "hours" };
        format!("This link expires in {hours} {unit}.")
    } else {
        let minutes = ttl.num_minutes().max(1);
        let unit = if minutes == 1 { "minute" } else { "minutes" };
        format!("This link expires in {minutes} {unit}.")
    }
}
