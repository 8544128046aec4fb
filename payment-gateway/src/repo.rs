use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Authorized,
    Declined,
}

/// Redacted outcome of an authorization attempt. Write-once: built by the
/// processor after the provider has answered and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub status: PaymentStatus,
    pub card_number_last_four: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub currency: String,
    pub amount: i64,
    /// Provider reference, kept for reconciliation but never serialized out.
    #[serde(skip_serializing)]
    pub authorization_code: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("payment {0} is already stored")]
    DuplicateId(Uuid),
}

/// In-memory payment store keyed by id. Lives for the process lifetime and is
/// shared across request tasks; the lock is held only for the map operation
/// itself, never across an await point.
#[derive(Default)]
pub struct PaymentsRepository {
    inner: RwLock<HashMap<Uuid, PaymentRecord>>,
}

impl PaymentsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Ids are generated fresh per payment, so a collision
    /// signals an internal consistency bug; it is checked rather than assumed.
    pub fn add(&self, record: PaymentRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap();
        match map.entry(record.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateId(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Absence is a valid result here; the boundary turns it into a 404.
    pub fn get(&self, id: Uuid) -> Option<PaymentRecord> {
        self.inner.read().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
