use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::{RelocationRequest, RelocationResult, generate_insights};

#[derive(Debug, Deserialize)]
pub struct CreateInsightsBody {
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_city() -> String {
    "Berlin".to_string()
}

fn default_country_code() -> String {
    "DE".to_string()
}

pub async fn create_insights(
    State(state): State<AppState>,
    payload: Result<Json<CreateInsightsBody>, JsonRejection>,
) -> AppResult<Json<RelocationResult>> {
    let Json(body) = payload?;
    let city = body.city.trim();
    if city.is_empty() {
        return Err(AppError::Validation("city must not be empty".into()));
    }

    let country_code = body.country_code.trim();
    if country_code.is_empty() {
        return Err(AppError::Validation("country_code must not be empty".into()));
    }

    let request = RelocationRequest {
        city: city.to_string(),
        country_code: country_code.to_string(),
    };

    let result = generate_insights(
        state.weather.as_ref(),
        state.economy.as_ref(),
        &state.llm_client,
        &state.synthesis,
        &request,
    )
    .await;

    Ok(Json(result))
}
