//! AI advisor handlers: insights, categorization and Q&A
//!
//! These endpoints never fail because of the AI service. A degraded answer
//! comes back with status 200 and a description in `error`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, AppState};
use ledgerlens_core::{Advised, Category, ExpenseRecord, Insight};

/// Request body for insight generation
#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub expenses: Vec<ExpenseRecord>,
}

/// Response for insight generation
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
    pub error: Option<String>,
}

/// Request body for categorization
#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

/// Response for categorization
#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: Category,
    pub error: Option<String>,
}

/// Request body for a question
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
}

/// Response for a question
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub error: Option<String>,
}

/// Unwrap a JSON body, turning rejections into 400s
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(&rejection.body_text()))
}

/// Split an advised value into payload and `error` description
fn split<T>(advised: Advised<T>) -> (T, Option<String>) {
    let error = advised.degraded.map(|kind| kind.describe().to_string());
    (advised.value, error)
}

/// POST /api/insights - Generate spending insights
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InsightsRequest>, JsonRejection>,
) -> Result<Json<InsightsResponse>, AppError> {
    let req = body(payload)?;
    debug!(count = req.expenses.len(), "Generating insights");

    let (insights, error) = split(state.advisor.generate_insights(&req.expenses).await);
    Ok(Json(InsightsResponse { insights, error }))
}

/// POST /api/categorize - Suggest a category for a description
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CategorizeRequest>, JsonRejection>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let req = body(payload)?;

    let (category, error) = split(state.advisor.categorize(&req.description).await);
    Ok(Json(CategorizeResponse { category, error }))
}

/// POST /api/answer - Answer a question about the supplied expenses
pub async fn answer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let req = body(payload)?;

    let (answer, error) = split(
        state
            .advisor
            .answer_question(&req.question, &req.expenses)
            .await,
    );
    Ok(Json(AnswerResponse { answer, error }))
}
