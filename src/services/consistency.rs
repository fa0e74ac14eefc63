use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        deal::{self, Entity as DealEntity, SourceMode},
        deal_source::{self, Entity as DealSourceEntity},
        inventory_lot::{self, Entity as InventoryLotEntity},
    },
    errors::EngineError,
    services::{
        lot_store::{LotStore, ProductKey},
        replenishment::{leftover_quantity, ReplenishmentService},
    },
};

/// Outcome of reconciling one product key. Reports, never repairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reconciliation {
    pub product_key: ProductKey,
    /// Live total recomputed from recorded history: original quantities of
    /// live lots minus the deal-source consumption booked against them.
    pub expected_total: Decimal,
    /// Sum of `quantity` over live lots.
    pub live_total: Decimal,
    /// New-material deals with a positive leftover and no lot carrying their
    /// id. Over-reports when a replenished lot was later fully consumed.
    pub missing_replenishments: Vec<Uuid>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.expected_total == self.live_total && self.missing_replenishments.is_empty()
    }

    /// Signed drift of the live total from the expected total.
    pub fn discrepancy(&self) -> Decimal {
        self.live_total - self.expected_total
    }
}

/// Result of a replenishment backfill run.
#[derive(Debug, Clone, Default)]
pub struct BackfillSummary {
    pub created: Vec<Uuid>,
    pub skipped: usize,
}

/// Invariant checks for tests and operational backfills. Never on the
/// request hot path, and never given write access to deals.
#[derive(Clone)]
pub struct ConsistencySupervisor {
    db: Arc<DatabaseConnection>,
    lots: LotStore,
    replenishment: ReplenishmentService,
}

impl ConsistencySupervisor {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let lots = LotStore::new(db.clone());
        Self {
            replenishment: ReplenishmentService::new(lots.clone()),
            lots,
            db,
        }
    }

    /// Recomputes the expected live total for a product key from recorded
    /// deal history and compares it to the live lot quantities.
    ///
    /// Fully consumed lots are deleted by design; their original quantity
    /// and their booked consumption cancel exactly, so both sides exclude
    /// them and the check stays exact even with manual lot adds.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, key: &ProductKey) -> Result<Reconciliation, EngineError> {
        let db = &*self.db;

        let live_lots = InventoryLotEntity::find()
            .filter(inventory_lot::Column::ProductCode.eq(key.product_code.as_str()))
            .filter(inventory_lot::Column::Grade.eq(key.grade.as_str()))
            .filter(inventory_lot::Column::Company.eq(key.company.as_str()))
            .filter(inventory_lot::Column::SpecificGrade.eq(key.specific_grade.as_str()))
            .all(db)
            .await?;

        let live_total: Decimal = live_lots.iter().map(|lot| lot.quantity).sum();
        let original_total: Decimal = live_lots.iter().map(|lot| lot.original_quantity).sum();

        let lot_ids: Vec<Uuid> = live_lots.iter().map(|lot| lot.lot_id).collect();
        let consumed_total: Decimal = if lot_ids.is_empty() {
            Decimal::ZERO
        } else {
            DealSourceEntity::find()
                .filter(deal_source::Column::LotId.is_in(lot_ids))
                .all(db)
                .await?
                .iter()
                .map(|source| source.quantity_used)
                .sum()
        };

        let new_material_deals = DealEntity::find()
            .filter(deal::Column::SourceMode.eq(SourceMode::NewMaterial.as_str()))
            .filter(deal::Column::ProductCode.eq(key.product_code.as_str()))
            .filter(deal::Column::Grade.eq(key.grade.as_str()))
            .filter(deal::Column::Company.eq(key.company.as_str()))
            .filter(deal::Column::SpecificGrade.eq(key.specific_grade.as_str()))
            .all(db)
            .await?;

        let mut missing_replenishments = Vec::new();
        for d in new_material_deals {
            let purchased = d.purchase_quantity.unwrap_or_default();
            if leftover_quantity(purchased, d.quantity_sold).is_none() {
                continue;
            }
            if self.lots.find_by_source_deal(db, d.deal_id).await?.is_none() {
                missing_replenishments.push(d.deal_id);
            }
        }

        let report = Reconciliation {
            product_key: key.clone(),
            expected_total: original_total - consumed_total,
            live_total,
            missing_replenishments,
        };

        if report.is_consistent() {
            info!(live_total = %report.live_total, "product key reconciles");
        } else {
            warn!(
                expected = %report.expected_total,
                live = %report.live_total,
                missing = report.missing_replenishments.len(),
                "product key does not reconcile"
            );
        }

        Ok(report)
    }

    /// Reapplies replenishment for historical new-material deals whose
    /// leftover never landed in a lot. Used to recover from a period where
    /// replenishment was not wired up; safe to re-run.
    #[instrument(skip(self, deals), fields(deals = deals.len()))]
    pub async fn backfill_replenishment(
        &self,
        deals: &[deal::Model],
    ) -> Result<BackfillSummary, EngineError> {
        let db = &*self.db;
        let mut summary = BackfillSummary::default();

        for d in deals {
            if d.source_mode() != Some(SourceMode::NewMaterial) {
                summary.skipped += 1;
                continue;
            }

            let (Some(purchased), Some(rate), Some(supplier)) = (
                d.purchase_quantity,
                d.purchase_rate,
                d.purchase_party.as_deref(),
            ) else {
                warn!(deal_id = %d.deal_id, "new-material deal is missing purchase fields, skipping");
                summary.skipped += 1;
                continue;
            };

            if leftover_quantity(purchased, d.quantity_sold).is_none() {
                summary.skipped += 1;
                continue;
            }

            if self.lots.find_by_source_deal(db, d.deal_id).await?.is_some() {
                summary.skipped += 1;
                continue;
            }

            let created = self
                .replenishment
                .replenish(
                    db,
                    &ProductKey::from(d),
                    d.deal_id,
                    purchased,
                    d.quantity_sold,
                    rate,
                    supplier,
                    d.deal_date,
                )
                .await?;

            if let Some(lot) = created {
                summary.created.push(lot.lot_id);
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            created = summary.created.len(),
            skipped = summary.skipped,
            "replenishment backfill finished"
        );
        Ok(summary)
    }
}
