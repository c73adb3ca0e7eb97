use crate::{
    errors::AppError,
    models::mail::{EmailRequest, EmailSent},
    state::AppState,
};
use axum::{Json, extract::State};

/// `POST /send-email`
pub async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<EmailSent>, AppError> {
    let message_id = state
        .mailer
        .send(&req.to, &req.subject, &req.body)
        .await
        .map_err(|err| {
            tracing::error!("failed to send email: {}", err);
            AppError::from(err)
        })?;

    Ok(Json(EmailSent {
        status: "success".into(),
        message_id,
    }))
}
