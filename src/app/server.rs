//! HTTP surface over the recommendation engine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::app::Engine;
use crate::domain::model::{CardRecommendation, RecommendationRequest};
use crate::utils::error::{AppError, Result};

pub const PROCESS_PATH: &str = "/api/credit-cards/process";

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "creditScore")]
    pub score: Option<i64>,
    #[serde(default, alias = "annualSalary")]
    pub salary: Option<i64>,
}

impl ProcessRequest {
    fn into_request(self) -> Result<RecommendationRequest> {
        let name = self.name.unwrap_or_default();
        let score = self
            .score
            .ok_or_else(|| AppError::validation("score", "Score is required"))?;
        let salary = self
            .salary
            .ok_or_else(|| AppError::validation("salary", "Salary is required"))?;
        RecommendationRequest::new(name, score, salary)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditCardResponse {
    pub message: String,
    pub cards: Vec<CardRecommendation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route(PROCESS_PATH, post(process))
        .route("/health", get(health))
        .with_state(engine)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
    State(engine): State<Arc<Engine>>,
    payload: std::result::Result<Json<ProcessRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let request = match payload.into_request() {
        Ok(request) => request,
        Err(error) if error.is_validation() => {
            return error_response(StatusCode::BAD_REQUEST, error.to_string())
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to build request");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match engine.get_recommendations(&request).await {
        Ok(result) if result.provider_outage() => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
        }
        Ok(result) if result.cards.is_empty() => {
            error_response(StatusCode::BAD_REQUEST, "No credit card recommendations found")
        }
        Ok(result) => {
            let message = if result.from_cache {
                "Retrieved from cache"
            } else {
                "Fetched from APIs"
            };
            (
                StatusCode::OK,
                Json(CreditCardResponse {
                    message: message.to_string(),
                    cards: result.cards,
                }),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "error processing credit card request");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Bind `bind` and serve until Ctrl-C.
pub async fn serve(engine: Arc<Engine>, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind.parse().map_err(|_| AppError::InvalidConfigValueError {
        field: "server.bind".to_string(),
        value: bind.to_string(),
        reason: "Expected a socket address such as 127.0.0.1:5000".to_string(),
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
            }
        })
        .await?;
    Ok(())
}
