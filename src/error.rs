use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;

pub const MSG_RATE_LIMITED: &str = "คุณส่งข้อความบ่อยเกินไป กรุณารอสักครู่แล้วลองใหม่อีกครั้ง";
pub const MSG_UPSTREAM_BUSY: &str = "ขณะนี้ระบบมีผู้ใช้งานจำนวนมาก กรุณาลองใหม่อีกครั้งในภายหลัง";
pub const MSG_UPSTREAM_QUOTA: &str = "บริการแชทไม่พร้อมใช้งานชั่วคราว กรุณาติดต่อเจ้าหน้าที่";
pub const MSG_RETRY: &str = "เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง";
pub const MSG_MALFORMED: &str = "รูปแบบข้อมูลไม่ถูกต้อง";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("client exceeded the local rate limit")]
    RateLimited,

    #[error("completion service is overloaded")]
    UpstreamOverloaded,

    #[error("completion service quota exhausted")]
    UpstreamQuotaExceeded,

    #[error("completion service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed payload")]
    MalformedPayload,

    // Carries the caller-facing message
    #[error("{0}")]
    Validation(&'static str),

    #[error("data store error: {0}")]
    Store(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RateLimited | AppError::UpstreamOverloaded => StatusCode::TOO_MANY_REQUESTS,
            AppError::UpstreamQuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            AppError::MalformedPayload | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. }
            | AppError::Configuration(_)
            | AppError::Transport(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Localized text shown to the caller. Never carries upstream details.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::RateLimited => MSG_RATE_LIMITED,
            AppError::UpstreamOverloaded => MSG_UPSTREAM_BUSY,
            AppError::UpstreamQuotaExceeded => MSG_UPSTREAM_QUOTA,
            AppError::MalformedPayload => MSG_MALFORMED,
            AppError::Validation(message) => *message,
            AppError::Upstream { .. }
            | AppError::Configuration(_)
            | AppError::Transport(_)
            | AppError::Store(_) => MSG_RETRY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_429s_differ_in_message() {
        assert_eq!(AppError::RateLimited.status(), AppError::UpstreamOverloaded.status());
        assert_ne!(
            AppError::RateLimited.public_message(),
            AppError::UpstreamOverloaded.public_message()
        );
    }

    #[test]
    fn upstream_details_stay_server_side() {
        let err = AppError::Upstream {
            status: 503,
            body: "backend pool exhausted".into(),
        };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), MSG_RETRY);
        assert!(err.to_string().contains("backend pool exhausted"));
    }
}
