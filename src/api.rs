use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use crate::error::AppError;
use crate::handlers::{CreateOrderInput, OrderService, SendBookInput, VerifyPaymentInput};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health_check))
        .route("/api/orders/create", post(create_order))
        .route("/api/payments/verify", post(verify_payment))
        .route("/api/orders/:order_id", get(get_order))
        .route("/api/send-book", post(send_book))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::SignatureMismatch => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Order already exists".to_string()),
            AppError::Gateway(_) => {
                error!("gateway failure: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order".to_string(),
                )
            }
            AppError::Persistence(_) | AppError::Notifier(_) => {
                error!("internal failure: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        error_body(status, &message)
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

fn rejected(rejection: JsonRejection) -> Response {
    let status = match &rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    error_body(status, &rejection.body_text())
}

async fn home() -> Response {
    Json(json!({
        "status": "success",
        "message": "Bookpay backend API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

async fn health_check() -> Response {
    Json(json!({
        "status": "success",
        "message": "API is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}

async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(json) => json,
        Err(rejection) => return rejected(rejection),
    };

    match state.service.create_order(input).await {
        Ok(created) => {
            let message = if created.is_free {
                "Free book access created. Email sent!"
            } else {
                "Order created successfully"
            };
            let mut body = json!({
                "status": "success",
                "message": message,
                "order_id": created.order_id,
                "amount": created.amount,
                "is_free": created.is_free,
            });
            if let Some(checkout) = created.checkout {
                body["razorpay_order_id"] = json!(checkout.razorpay_order_id);
                body["razorpay_key_id"] = json!(checkout.razorpay_key_id);
            }
            Json(body).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn verify_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPaymentInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(json) => json,
        Err(rejection) => return rejected(rejection),
    };

    match state.service.verify_payment(input).await {
        Ok(verified) => Json(json!({
            "status": "success",
            "message": "Payment verified successfully",
            "payment_id": verified.payment_id,
            "order_id": verified.order_id,
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_order(State(state): State<AppState>, Path(order_id): Path<String>) -> Response {
    match state.service.get_order(&order_id).await {
        Ok(order) => Json(json!({"status": "success", "order": order})).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn send_book(
    State(state): State<AppState>,
    payload: Result<Json<SendBookInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(json) => json,
        Err(rejection) => return rejected(rejection),
    };

    match state.service.send_book(input).await {
        Ok(order_id) => Json(json!({
            "status": "success",
            "message": "Book sent successfully",
            "order_id": order_id,
        }))
        .into_response(),
        Err(err) => err.into_response(),
    }
}
