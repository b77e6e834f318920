use url::Url;

const BRAND_NAME: &str = "Dojo";

fn origin_label(app_origin: &str) -> String {
    Url::parse(app_origin)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| app_origin.to_string())
}

fn code_block(code: &str) -> String {
    format!(
        r#"<div style="display:inline-block;padding:12px 18px;background-color:#111827;color:#ffffff;border-radius:8px;font-size:24px;letter-spacing:0.3em;font-weight:700;">{code}</div>"#
    )
}

pub fn password_reset_code_email(app_origin: &str, code: &str, ttl_minutes: i64) -> (String, String) {
    let subject = "Your password reset code".to_string();
    let headline = "Reset your password";
    let lead = "Use the code below to reset the password on your academy account.";
    let body = format!(
        r#"{}<p style="margin:12px 0 0;color:#374151;">The code expires in {} minutes and can only be used once.</p>"#,
        code_block(code),
        ttl_minutes
    );
    let reason = "someone asked to reset the password for this email address";

    let html = wrap_email(app_origin, headline, lead, &body, reason);
    (subject, html)
}

pub fn password_changed_email(app_origin: &str, name: &str) -> (String, String) {
    let subject = "Your password was changed".to_string();
    let headline = "Password changed";
    let lead = format!("Hi {name}, the password on your academy account was just changed.");
    let body = "<p style=\"margin:12px 0 0;color:#374151;\">If this wasn't you, contact the front desk right away.</p>";
    let reason = "the password on your account changed";

    let html = wrap_email(app_origin, headline, &lead, body, reason);
    (subject, html)
}

pub fn wrap_email(
    app_origin: &str,
    headline: &str,
    lead: &str,
    body_html: &str,
    reason: &str,
) -> String {
    let origin = origin_label(app_origin);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="background:#f8fafc;margin:0;padding:24px;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:560px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;padding:24px;">
      <div style="font-size:12px;letter-spacing:0.08em;text-transform:uppercase;color:#6b7280;">{brand} - {origin}</div>
      <h1 style="margin:12px 0 8px;font-size:22px;color:#111827;">{headline}</h1>
      <p style="margin:0 0 12px;font-size:15px;color:#111827;line-height:1.6;">{lead}</p>
      {body_html}
      <div style="margin-top:20px;padding-top:16px;border-top:1px solid #e5e7eb;">
        <p style="margin:0 0 6px;font-size:13px;color:#4b5563;">Why you got this email: {reason}.</p>
        <p style="margin:0;font-size:13px;color:#4b5563;">If you didn't request this, you can safely ignore it.</p>
      </div>
    </div>
  </body>
</html>
"#,
        brand = BRAND_NAME,
    )
}
