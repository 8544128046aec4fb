use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::validation::{last_four, PaymentRequest};

/// Wire request for the acquiring bank's `POST /payments` endpoint.
#[derive(Serialize, Clone)]
pub struct BankPaymentRequest {
    pub card_number: String,
    pub expiry_date: String,
    pub currency: String,
    pub amount: i64,
    pub cvv: String,
}

impl BankPaymentRequest {
    pub fn from_payment(req: &PaymentRequest) -> Self {
        Self {
            card_number: req.card_number.clone(),
            expiry_date: format!("{:02}/{}", req.expiry_month, req.expiry_year),
            currency: req.currency.clone(),
            amount: req.amount,
            cvv: req.cvv.clone(),
        }
    }

    pub fn card_last_four(&self) -> &str {
        last_four(&self.card_number)
    }
}

impl fmt::Debug for BankPaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankPaymentRequest")
            .field("card_number", &format_args!("****{}", self.card_last_four()))
            .field("expiry_date", &self.expiry_date)
            .field("currency", &self.currency)
            .field("amount", &self.amount)
            .field("cvv", &"***")
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct BankPaymentResponse {
    pub authorized: bool,
    #[serde(default)]
    pub authorization_code: String,
}

#[derive(Debug, Error)]
pub enum BankClientError {
    #[error("failed to reach provider: {0}")]
    Unreachable(String),
    #[error("provider returned non-success status {0}")]
    BadStatus(u16),
    #[error("provider response could not be parsed: {0}")]
    Malformed(String),
}

#[async_trait::async_trait]
pub trait BankClient: Send + Sync {
    async fn authorize(&self, request: &BankPaymentRequest) -> Result<BankPaymentResponse, BankClientError>;
}

/// HTTP client for the external bank/payment provider. One outbound request
/// per call, no retries; the timeout elapsing is classified the same as any
/// other transport failure.
pub struct HttpBankClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBankClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl BankClient for HttpBankClient {
    async fn authorize(&self, request: &BankPaymentRequest) -> Result<BankPaymentResponse, BankClientError> {
        let url = format!("{}/payments", self.base_url);
        debug!(card_last_four = %request.card_last_four(), "sending authorization request to provider");

        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "provider request failed");
                BankClientError::Unreachable(err.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "provider returned non-success status");
            return Err(BankClientError::BadStatus(status.as_u16()));
        }

        let verdict = resp
            .json::<BankPaymentResponse>()
            .await
            .map_err(|err| BankClientError::Malformed(err.to_string()))?;
        debug!(authorized = verdict.authorized, "provider answered");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn wire_request() -> BankPaymentRequest {
        BankPaymentRequest {
            card_number: "4111111111111111".into(),
            expiry_date: "12/2030".into(),
            currency: "GBP".into(),
            amount: 100,
            cvv: "123".into(),
        }
    }

    fn client(base_url: String) -> HttpBankClient {
        HttpBankClient::new(base_url, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn authorized_response_is_decoded() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/payments")
                .json_body(json!({
                    "card_number": "4111111111111111",
                    "expiry_date": "12/2030",
                    "currency": "GBP",
                    "amount": 100,
                    "cvv": "123"
                }));
            then.status(200)
                .json_body(json!({"authorized": true, "authorization_code": "AUTH-1"}));
        });

        let resp = client(server.base_url()).authorize(&wire_request()).await.unwrap();
        assert!(resp.authorized);
        assert_eq!(resp.authorization_code, "AUTH-1");
        mock.assert();
    }

    #[tokio::test]
    async fn missing_authorization_code_defaults_to_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/payments");
            then.status(200).json_body(json!({"authorized": false}));
        });

        let resp = client(server.base_url()).authorize(&wire_request()).await.unwrap();
        assert!(!resp.authorized);
        assert_eq!(resp.authorization_code, "");
    }

    #[tokio::test]
    async fn non_success_status_is_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/payments");
            then.status(503);
        });

        let err = client(server.base_url()).authorize(&wire_request()).await.unwrap_err();
        assert!(matches!(err, BankClientError::BadStatus(503)));
    }

    #[tokio::test]
    async fn undecodable_body_is_classified_as_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/payments");
            then.status(200).body("not json");
        });

        let err = client(server.base_url()).authorize(&wire_request()).await.unwrap_err();
        assert!(matches!(err, BankClientError::Malformed(_)));
    }

    #[tokio::test]
    async fn timeout_is_classified_as_unreachable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/payments");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"authorized": true, "authorization_code": "AUTH-1"}));
        });

        let slow = HttpBankClient::new(server.base_url(), Duration::from_millis(50));
        let err = slow.authorize(&wire_request()).await.unwrap_err();
        assert!(matches!(err, BankClientError::Unreachable(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_classified_as_unreachable() {
        // Nothing listens on this port.
        let err = client("http://127.0.0.1:9".into()).authorize(&wire_request()).await.unwrap_err();
        assert!(matches!(err, BankClientError::Unreachable(_)));
    }

    #[test]
    fn wire_request_zero_pads_expiry_month() {
        let req = crate::validation::PaymentRequest {
            card_number: "4111111111111111".into(),
            expiry_month: 3,
            expiry_year: 2031,
            currency: "USD".into(),
            amount: 250,
            cvv: "9876".into(),
        };
        let wire = BankPaymentRequest::from_payment(&req);
        assert_eq!(wire.expiry_date, "03/2031");
    }

    #[test]
    fn debug_never_shows_card_number_or_cvv() {
        let rendered = format!("{:?}", wire_request());
        assert!(!rendered.contains("4111111111111111"));
        assert!(rendered.contains("****1111"));
        assert!(rendered.contains("***"));
    }
}
