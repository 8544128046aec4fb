use axum::extract::{Path, State};
use axum::Json;
use common_http_errors::{ApiError, ApiResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bank::BankClientError;
use crate::processor::PaymentOutcome;
use crate::repo::PaymentRecord;
use crate::validation::{last_four, PaymentRequest};
use crate::AppState;

pub async fn post_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<PaymentRecord>> {
    info!(card_last_four = %last_four(&request.card_number), "payment request received");

    let outcome = state
        .processor
        .authorize(&request)
        .await
        .map_err(|err| ApiError::internal(err, None))?;

    match outcome {
        PaymentOutcome::Rejected(violations) => Err(ApiError::validation(
            violations.iter().map(ToString::to_string).collect(),
        )),
        PaymentOutcome::ProviderError(err) => {
            warn!(error = %err, "payment failed upstream");
            // Generic upstream message; the status code is the only provider
            // detail allowed out.
            Err(match err {
                BankClientError::BadStatus(status) => {
                    ApiError::bad_gateway("provider_error", format!("payment provider returned status {status}"))
                }
                BankClientError::Unreachable(_) | BankClientError::Malformed(_) => {
                    ApiError::bad_gateway("provider_error", "payment provider unavailable")
                }
            })
        }
        PaymentOutcome::Persisted(record) => Ok(Json(record)),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentRecord>> {
    match state.processor.retrieve(id) {
        Some(record) => {
            info!(payment_id = %id, status = ?record.status, "payment found");
            Ok(Json(record))
        }
        None => {
            info!(payment_id = %id, "payment not found");
            Err(ApiError::NotFound { code: "payment_not_found", trace_id: None })
        }
    }
}
