use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")] pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub errors: Option<Vec<String>>,
}

#[derive(Debug)]
pub enum ApiError {
    /// One or more request fields violated a validation rule. Carries every
    /// violation message so the caller can fix the request in one round trip.
    Validation { errors: Vec<String>, trace_id: Option<Uuid> },
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    /// An upstream dependency failed or answered unusably.
    BadGateway { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::BadRequest { code, trace_id, message: None } }
    pub fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadGateway { code, trace_id: None, message: Some(message.into()) }
    }
    pub fn validation(errors: Vec<String>) -> Self { Self::Validation { errors, trace_id: None } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::Validation { errors, trace_id } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: "validation_failed".into(), trace_id, message: None, errors: Some(errors) },
                "validation_failed"
            ),
            ApiError::BadRequest { code, trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: code.into(), trace_id, message, errors: None },
                code
            ),
            ApiError::NotFound { code, trace_id } => (
                StatusCode::NOT_FOUND,
                ErrorBody { code: code.into(), trace_id, message: None, errors: None },
                code
            ),
            ApiError::BadGateway { code, trace_id, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody { code: code.into(), trace_id, message, errors: None },
                code
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "internal_error".into(), trace_id, message, errors: None },
                "internal_error"
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// --- Error metrics ---------------------------------------------------------
//
// Counts HTTP error responses by (service, code, status), keyed on the
// X-Error-Code header set above. Distinct code labels are capped; once the
// cap is hit further codes collapse into the "overflow" label so a buggy
// caller cannot blow up metric cardinality.

pub static METRICS_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

const MAX_ERROR_CODES: usize = 40;

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    ).unwrap();
    METRICS_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static DISTINCT_ERROR_CODES: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::new("http_error_codes_distinct", "Distinct error code labels observed").unwrap();
    METRICS_REGISTRY.register(Box::new(g.clone())).ok();
    g
});

static ERROR_CODE_OVERFLOW_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("http_error_code_overflow_total", "Errors collapsed into the overflow label").unwrap();
    METRICS_REGISTRY.register(Box::new(c.clone())).ok();
    c
});

static SEEN_ERROR_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn code_label(code: &str) -> String {
    let mut seen = SEEN_ERROR_CODES.lock().unwrap();
    if seen.contains(code) {
        return code.to_string();
    }
    if seen.len() < MAX_ERROR_CODES {
        seen.insert(code.to_string());
        DISTINCT_ERROR_CODES.set(seen.len() as i64);
        return code.to_string();
    }
    ERROR_CODE_OVERFLOW_TOTAL.inc();
    "overflow".to_string()
}

/// Middleware for `axum::middleware::from_fn` recording error responses for
/// the named service.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send {
    move |req, next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status();
            if status.as_u16() >= 400 {
                let code = resp
                    .headers()
                    .get("X-Error-Code")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                HTTP_ERRORS_TOTAL
                    .with_label_values(&[service, &code_label(code), status.as_str()])
                    .inc();
            }
            resp
        })
    }
}

/// Test support: drive the cardinality guard without an HTTP stack.
pub mod test_helpers {
    pub fn simulate_error_code(code: &str) {
        super::HTTP_ERRORS_TOTAL
            .with_label_values(&["test", &super::code_label(code), "400"])
            .inc();
    }

    pub fn distinct_gauge() -> i64 {
        super::DISTINCT_ERROR_CODES.get()
    }

    pub fn overflow_count() -> u64 {
        super::ERROR_CODE_OVERFLOW_TOTAL.get()
    }
}
