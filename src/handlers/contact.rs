use axum::{Json, body::Bytes, extract::State};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{error, info};

use crate::error::AppError;
use crate::metrics::{CONTACT_EMAILS_SENT, CONTACT_SUBMISSIONS};
use crate::models::{ContactForm, ContactResponse};
use crate::state::AppState;

const MAX_NAME: usize = 100;
const MAX_EMAIL: usize = 255;
const MAX_PHONE: usize = 20;
const MAX_SUBJECT: usize = 200;
const MAX_MESSAGE: usize = 5000;

/// Trims every field and checks it, returning the cleaned form.
pub fn validate(form: ContactForm) -> Result<ContactForm, AppError> {
    let trimmed = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let form = ContactForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: trimmed(form.phone),
        subject: trimmed(form.subject),
        message: form.message.trim().to_string(),
    };

    if form.name.is_empty() || form.email.is_empty() || form.message.is_empty() {
        return Err(AppError::Validation("กรุณากรอกชื่อ อีเมล และข้อความให้ครบถ้วน"));
    }

    if !is_email(&form.email) {
        return Err(AppError::Validation("รูปแบบอีเมลไม่ถูกต้อง"));
    }

    let too_long = form.name.chars().count() > MAX_NAME
        || form.email.chars().count() > MAX_EMAIL
        || form.phone.as_ref().is_some_and(|p| p.chars().count() > MAX_PHONE)
        || form.subject.as_ref().is_some_and(|s| s.chars().count() > MAX_SUBJECT)
        || form.message.chars().count() > MAX_MESSAGE;
    if too_long {
        return Err(AppError::Validation("ข้อมูลที่กรอกยาวเกินกำหนด"));
    }

    Ok(form)
}

// local@domain.tld, no whitespace, exactly one '@'
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ContactResponse>, AppError> {
    let form: ContactForm =
        serde_json::from_slice(&body).map_err(|_| AppError::MalformedPayload)?;
    let form = validate(form)?;

    if let Err(e) = state.store.insert_contact_submission(&form).await {
        error!(error = %e, "failed to store contact submission");
        return Err(e);
    }
    CONTACT_SUBMISSIONS.inc();

    let email_sent = state.mailer.notify(&form).await;
    if email_sent {
        CONTACT_EMAILS_SENT.inc();
    }

    info!(email_sent, "contact submission stored");

    Ok(Json(ContactResponse {
        success: true,
        email_sent,
    }))
}
