mod chat;
mod contact;
mod health;
mod metrics;

pub use chat::{chat_handler, client_id};
pub use contact::{contact_handler, validate};
pub use health::health_handler;
pub use metrics::metrics_handler;
