use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::EngineError,
    services::lot_store::{DecrementOutcome, LotStore, ProductKey},
};

/// One caller-directed pick: take `quantity` from `lot_id`. Order in the
/// selection list is the display order recorded on the deal sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSelection {
    pub lot_id: Uuid,
    pub quantity: Decimal,
}

/// The consumed side of one selection, captured at deduction time. Becomes
/// the deal-source payload.
#[derive(Debug, Clone)]
pub struct AllocationLine {
    pub lot_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub supplier_name: String,
    pub depleted: bool,
}

/// Validates a whole selection set against live lots and, only when every
/// check passes, deducts each lot. The engine never adjusts or partially
/// fulfills a selection: the caller owns lot choice, the engine owns safety.
#[derive(Clone)]
pub struct AllocationEngine {
    lots: LotStore,
}

impl AllocationEngine {
    pub fn new(lots: LotStore) -> Self {
        Self { lots }
    }

    /// Runs the check-then-deduct sequence inside the caller's transaction.
    ///
    /// Preconditions are checked in order over the whole set before any row
    /// is touched, so a failure on the last selection leaves the first
    /// untouched. Deductions use guarded writes; a lost race surfaces as
    /// `ConcurrencyConflict` for the coordinator to retry.
    #[instrument(skip(self, conn, selections), fields(selections = selections.len()))]
    pub async fn allocate<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: &ProductKey,
        total_requested: Decimal,
        selections: &[LotSelection],
    ) -> Result<Vec<AllocationLine>, EngineError> {
        if selections.is_empty() {
            return Err(EngineError::invalid_input(
                "at least one lot selection is required",
            ));
        }

        for selection in selections {
            if selection.quantity <= Decimal::ZERO {
                return Err(EngineError::InvalidInput(format!(
                    "selection for lot {} must be a positive quantity, got {}",
                    selection.lot_id, selection.quantity
                )));
            }
        }

        for (i, selection) in selections.iter().enumerate() {
            if selections[..i].iter().any(|s| s.lot_id == selection.lot_id) {
                return Err(EngineError::InvalidInput(format!(
                    "lot {} is selected more than once",
                    selection.lot_id
                )));
            }
        }

        // Read and validate every lot before touching any row: existence
        // first across the whole set, then sufficiency.
        let mut picked = Vec::with_capacity(selections.len());
        for selection in selections {
            let lot = self
                .lots
                .get(conn, selection.lot_id)
                .await?
                .filter(|lot| key.matches(lot))
                .ok_or(EngineError::LotNotFound(selection.lot_id))?;
            picked.push((lot, selection.quantity));
        }

        for (lot, quantity) in &picked {
            if lot.quantity < *quantity {
                return Err(EngineError::InsufficientQuantity {
                    lot_id: lot.lot_id,
                    available: lot.quantity,
                    requested: *quantity,
                });
            }
        }

        let selected: Decimal = selections.iter().map(|s| s.quantity).sum();
        if selected != total_requested {
            return Err(EngineError::InvalidInput(format!(
                "selected quantities sum to {}, sale quantity is {}",
                selected, total_requested
            )));
        }

        // Every precondition holds for the whole set; deduct.
        let mut lines = Vec::with_capacity(picked.len());
        for (lot, quantity) in picked {
            let outcome = self.lots.decrement(conn, &lot, quantity).await?;
            lines.push(AllocationLine {
                lot_id: lot.lot_id,
                quantity,
                unit_cost: lot.unit_cost,
                supplier_name: lot.supplier_name,
                depleted: matches!(outcome, DecrementOutcome::Depleted),
            });
        }

        Ok(lines)
    }
}
