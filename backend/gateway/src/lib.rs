//! ChequeForge Gateway HTTP API Server
//!
//! Upload-and-process, the review queue, health, static image hosting, and
//! the review-needed webhook.

pub mod cheques_api;
pub mod error;
pub mod health_api;
pub mod server;
pub mod uploads;
pub mod webhook;

pub use error::ApiError;
pub use server::{GatewayState, build_router, start_server};
pub use uploads::{SavedUpload, UploadDir};
pub use webhook::WebhookNotifier;
