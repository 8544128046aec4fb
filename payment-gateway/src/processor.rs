use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bank::{BankClient, BankClientError, BankPaymentRequest};
use crate::repo::{PaymentRecord, PaymentStatus, PaymentsRepository, StoreError};
use crate::validation::{last_four, validate, PaymentRequest, Violation};

/// Terminal result of one authorization attempt. Rejected and Persisted are
/// disjoint branches: a rejected request never gets an id and never touches
/// the store.
#[derive(Debug)]
pub enum PaymentOutcome {
    Rejected(Vec<Violation>),
    ProviderError(BankClientError),
    Persisted(PaymentRecord),
}

/// Sequences validation, the single provider call, status derivation and
/// persistence. The store and the bank client know nothing about each other.
#[derive(Clone)]
pub struct PaymentProcessor {
    repo: Arc<PaymentsRepository>,
    bank: Arc<dyn BankClient>,
}

impl PaymentProcessor {
    pub fn new(repo: Arc<PaymentsRepository>, bank: Arc<dyn BankClient>) -> Self {
        Self { repo, bank }
    }

    /// The only error is the defensive duplicate-id check; every classified
    /// business failure comes back as a `PaymentOutcome` variant.
    pub async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentOutcome, StoreError> {
        if let Err(violations) = validate(request, Utc::now().date_naive()) {
            info!(count = violations.len(), "payment request rejected by validation");
            return Ok(PaymentOutcome::Rejected(violations));
        }

        let wire = BankPaymentRequest::from_payment(request);
        let verdict = match self.bank.authorize(&wire).await {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(error = %err, "provider call failed; nothing persisted");
                return Ok(PaymentOutcome::ProviderError(err));
            }
        };

        // A decline is a legitimate business result, persisted like an
        // authorization.
        let status = if verdict.authorized {
            PaymentStatus::Authorized
        } else {
            PaymentStatus::Declined
        };

        let record = PaymentRecord {
            id: Uuid::new_v4(),
            status,
            card_number_last_four: last_four(&request.card_number).to_string(),
            expiry_month: request.expiry_month,
            expiry_year: request.expiry_year,
            currency: request.currency.to_ascii_uppercase(),
            amount: request.amount,
            authorization_code: verdict.authorization_code,
        };
        self.repo.add(record.clone())?;
        info!(
            payment_id = %record.id,
            status = ?record.status,
            card_last_four = %record.card_number_last_four,
            "payment persisted"
        );
        Ok(PaymentOutcome::Persisted(record))
    }

    pub fn retrieve(&self, id: Uuid) -> Option<PaymentRecord> {
        self.repo.get(id)
    }
}
