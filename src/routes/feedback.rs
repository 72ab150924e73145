use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, AppResult};
use crate::telemetry::metrics::FEEDBACK_RATING;

#[derive(Debug, Deserialize)]
pub struct UserFeedback {
    pub rating: i64,
    #[serde(default)]
    pub comments: String,
}

/// Feedback is not stored anywhere. It is emitted as a structured log
/// event and a rating metric, then acknowledged.
pub async fn submit_feedback(
    payload: Result<Json<UserFeedback>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(feedback) = payload?;
    if !(1..=5).contains(&feedback.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".into(),
        ));
    }

    tracing::info!(
        feedback.rating = feedback.rating,
        feedback.comments = %feedback.comments,
        "Feedback received"
    );

    FEEDBACK_RATING.record(feedback.rating.unsigned_abs(), &[]);

    Ok(Json(json!({
        "status": "received",
        "message": "Thank you for your feedback!"
    })))
}
