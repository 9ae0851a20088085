//! Webhook ingestion path

pub mod handler;

pub use handler::{calendar_id_from_uri, WebhookHandler, CHANNEL_ID_PREFIX};
