//! Inventory ledger: per-blood-type unit counts of a blood bank.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::blood_bank::BloodBank;
use crate::models::BloodType;
use crate::ports::BloodBankStore;

#[derive(Clone)]
pub struct InventoryLedger {
    banks: Arc<dyn BloodBankStore>,
}

impl InventoryLedger {
    pub fn new(banks: Arc<dyn BloodBankStore>) -> Self {
        Self { banks }
    }

    /// True when the bank holds at least `quantity` units of `blood_type`.
    pub fn has_available(bank: &BloodBank, blood_type: BloodType, quantity: i32) -> bool {
        bank.inventory.has_available(blood_type, quantity)
    }

    /// Adds a signed `delta` to the bank's count and returns the new count.
    ///
    /// Adjustments that would leave a negative count are rejected.
    pub async fn adjust(
        &self,
        blood_bank_id: Uuid,
        blood_type: BloodType,
        delta: i32,
    ) -> DomainResult<i32> {
        let bank = self
            .banks
            .find_by_id(blood_bank_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Blood bank not found"))?;

        if bank.inventory.adjusted(blood_type, delta).is_none() {
            return Err(insufficient_stock(&bank, blood_type, delta));
        }

        // The store repeats the floor check atomically; a concurrent
        // withdrawal can still make it fail here.
        let units = self
            .banks
            .adjust_inventory(blood_bank_id, blood_type, delta)
            .await?
            .ok_or_else(|| insufficient_stock(&bank, blood_type, delta))?;

        tracing::info!(
            blood_bank_id = %blood_bank_id,
            blood_type = %blood_type,
            delta = delta,
            units = units,
            "Inventory adjusted"
        );

        Ok(units)
    }
}

fn insufficient_stock(bank: &BloodBank, blood_type: BloodType, delta: i32) -> DomainError {
    DomainError::invalid_state(format!(
        "Insufficient {} stock: {} units available, adjustment of {} would go below zero",
        blood_type,
        bank.inventory.units(blood_type),
        delta
    ))
}
