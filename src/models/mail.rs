//! Request/response bodies for the mail endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST /send-email`.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Successful send: the provider's message id.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EmailSent {
    pub status: String,
    pub message_id: String,
}
