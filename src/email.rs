use serde::Serialize;
use tracing::{error, warn};

use crate::models::ContactForm;

/// Transactional email API client used for contact notifications.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: String,
    html: String,
}

impl Mailer {
    pub fn new(
        client: reqwest::Client,
        url: String,
        api_key: Option<String>,
        from: String,
        to: String,
    ) -> Self {
        Self {
            client,
            url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            from,
            to,
        }
    }

    /// Returns whether the notification was accepted. Failures are logged
    /// and swallowed: the stored row is the record of the submission.
    pub async fn notify(&self, form: &ContactForm) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("EMAIL_API_KEY not set, skipping contact notification");
            return false;
        };

        let subject = match form.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => format!("[ติดต่อเรา] {subject}"),
            _ => format!("[ติดต่อเรา] ข้อความจาก {}", form.name),
        };

        let email = OutgoingEmail {
            from: &self.from,
            to: [&self.to],
            reply_to: &form.email,
            subject,
            html: render_html(form),
        };

        let result = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&email)
            .send()
            .await;

        match result {
            Ok(res) if res.status().is_success() => true,
            Ok(res) => {
                let status = res.status().as_u16();
                let body = res.text().await.unwrap_or_default();
                error!(status, %body, "email api rejected contact notification");
                false
            }
            Err(e) => {
                error!(error = %e, "email api unreachable");
                false
            }
        }
    }
}

fn render_html(form: &ContactForm) -> String {
    let optional = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(escape_html)
            .unwrap_or_else(|| "-".to_string())
    };

    format!(
        "<h2>ข้อความใหม่จากแบบฟอร์มติดต่อ</h2>\
         <p><strong>ชื่อ:</strong> {}</p>\
         <p><strong>อีเมล:</strong> {}</p>\
         <p><strong>โทรศัพท์:</strong> {}</p>\
         <p><strong>หัวข้อ:</strong> {}</p>\
         <p><strong>ข้อความ:</strong></p><p>{}</p>",
        escape_html(&form.name),
        escape_html(&form.email),
        optional(&form.phone),
        optional(&form.subject),
        escape_html(&form.message).replace('\n', "<br>"),
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_is_escaped() {
        let form = ContactForm {
            name: "<script>alert(1)</script>".into(),
            email: "a@b.co".into(),
            phone: None,
            subject: Some("Tom & Jerry".into()),
            message: "line one\nline \"two\"".into(),
        };

        let html = render_html(&form);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("line one<br>line &quot;two&quot;"));
        assert!(html.contains("<strong>โทรศัพท์:</strong> -"));
    }
}
