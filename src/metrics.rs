use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref CHAT_REQUESTS: Counter =
        register_counter!("faq_chat_requests_total", "Total number of chat requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("faq_chat_rate_limited_total", "Chat requests rejected by the local rate limit").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("faq_chat_upstream_failures_total", "Non-success responses from the completion service").unwrap();
    pub static ref CHAT_LATENCY: Histogram = register_histogram!(
        "faq_chat_response_seconds",
        "Time until the chat response (stream start or error) is ready"
    )
    .unwrap();
    pub static ref RATE_LIMIT_ENTRIES: Gauge =
        register_gauge!("faq_rate_limit_entries", "Client identifiers currently tracked").unwrap();
    pub static ref CONTACT_SUBMISSIONS: Counter =
        register_counter!("contact_submissions_total", "Contact form submissions stored").unwrap();
    pub static ref CONTACT_EMAILS_SENT: Counter =
        register_counter!("contact_emails_sent_total", "Contact notifications delivered").unwrap();
}
