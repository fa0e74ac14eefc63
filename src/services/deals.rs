use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::{
        deal::{self, Entity as DealEntity, SourceMode},
        deal_source::{self, Entity as DealSourceEntity},
        inventory_lot,
    },
    errors::EngineError,
    events::{Event, EventSender},
    services::{
        allocation::{AllocationEngine, LotSelection},
        lot_store::{LotStore, ProductKey},
        replenishment::ReplenishmentService,
    },
};

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

/// How the sale is supplied: by deducting selected lots, or by a fresh
/// purchase whose leftover replenishes inventory after commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DealSourcing {
    FromInventory {
        selections: Vec<LotSelection>,
    },
    NewMaterial {
        purchase_party: String,
        purchase_quantity: Decimal,
        purchase_rate: Decimal,
    },
}

impl DealSourcing {
    pub fn mode(&self) -> SourceMode {
        match self {
            DealSourcing::FromInventory { .. } => SourceMode::FromInventory,
            DealSourcing::NewMaterial { .. } => SourceMode::NewMaterial,
        }
    }
}

/// Typed deal-submission payload. Validated once at the coordinator's entry
/// point; the allocation and replenishment services never see raw input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewDealRequest {
    #[validate]
    pub product: ProductKey,
    #[validate(length(min = 1, message = "sale party is required"))]
    pub sale_party: String,
    #[validate(custom = "validate_positive")]
    pub quantity_sold: Decimal,
    #[validate(custom = "validate_positive")]
    pub sale_rate: Decimal,
    pub delivery_terms: Option<String>,
    pub deal_date: NaiveDate,
    pub sourcing: DealSourcing,
}

impl NewDealRequest {
    fn check(&self) -> Result<(), EngineError> {
        self.validate()?;
        if let DealSourcing::NewMaterial {
            purchase_party,
            purchase_quantity,
            purchase_rate,
        } = &self.sourcing
        {
            if purchase_party.is_empty() {
                return Err(EngineError::invalid_input("purchase party is required"));
            }
            if *purchase_quantity <= Decimal::ZERO {
                return Err(EngineError::invalid_input(
                    "purchase quantity must be positive",
                ));
            }
            if *purchase_rate <= Decimal::ZERO {
                return Err(EngineError::invalid_input("purchase rate must be positive"));
            }
        }
        Ok(())
    }
}

/// A deal as persisted, with its per-lot source rows in selection order.
/// The only shape outbound collaborators see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedDeal {
    pub deal: deal::Model,
    pub sources: Vec<deal_source::Model>,
}

/// The transaction coordinator: the one component with commit/rollback
/// authority over deals, deal sources and lot mutations.
#[derive(Clone)]
pub struct DealService {
    db: Arc<DatabaseConnection>,
    lots: LotStore,
    allocation: AllocationEngine,
    replenishment: ReplenishmentService,
    event_sender: Option<EventSender>,
    max_retries: u32,
}

impl DealService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
        max_retries: u32,
    ) -> Self {
        let lots = LotStore::new(db.clone());
        Self {
            allocation: AllocationEngine::new(lots.clone()),
            replenishment: ReplenishmentService::new(lots.clone()),
            lots,
            db,
            event_sender,
            max_retries: max_retries.max(1),
        }
    }

    pub fn lot_store(&self) -> &LotStore {
        &self.lots
    }

    /// Registers a sale. Deal row, source rows and lot decrements commit or
    /// roll back as one unit; a lost lot race is retried with fresh reads up
    /// to the configured bound. Post-commit side effects (replenishment,
    /// events) run after and never unwind the deal.
    #[instrument(skip(self, request), fields(sale_party = %request.sale_party, mode = ?request.sourcing.mode()))]
    pub async fn create_deal(&self, request: NewDealRequest) -> Result<CommittedDeal, EngineError> {
        request.check()?;

        let mut attempt = 0u32;
        let (committed, depleted) = loop {
            attempt += 1;
            match self.try_commit(&request).await {
                Ok(result) => break result,
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    warn!(attempt, error = %err, "allocation lost a lot race, retrying with fresh reads");
                    continue;
                }
                Err(err) => return Err(err),
            }
        };

        info!(deal_id = %committed.deal.deal_id, "deal committed");
        self.post_commit(&committed, &depleted).await;
        Ok(committed)
    }

    /// Reads back a committed deal with its sources in selection order.
    pub async fn get_deal(&self, deal_id: Uuid) -> Result<Option<CommittedDeal>, EngineError> {
        let Some(deal) = DealEntity::find_by_id(deal_id).one(&*self.db).await? else {
            return Ok(None);
        };
        let sources = DealSourceEntity::find()
            .filter(deal_source::Column::DealId.eq(deal_id))
            .order_by_asc(deal_source::Column::SelectionOrder)
            .all(&*self.db)
            .await?;
        Ok(Some(CommittedDeal { deal, sources }))
    }

    /// Applies replenishment for an already-committed new-material deal.
    /// Idempotent per deal: a lot carrying this deal's id short-circuits to
    /// `Ok(None)`, so replays (coordinator retry, out-of-band backfill)
    /// cannot double-create stock.
    pub async fn replenish_committed(
        &self,
        deal: &deal::Model,
    ) -> Result<Option<inventory_lot::Model>, EngineError> {
        if deal.source_mode() != Some(SourceMode::NewMaterial) {
            return Err(EngineError::Replenishment(format!(
                "deal {} was not sourced from new material",
                deal.deal_id
            )));
        }

        let db = &*self.db;
        if self.lots.find_by_source_deal(db, deal.deal_id).await?.is_some() {
            return Ok(None);
        }

        let purchased = deal.purchase_quantity.ok_or_else(|| {
            EngineError::Replenishment(format!("deal {} has no purchase quantity", deal.deal_id))
        })?;
        let rate = deal.purchase_rate.ok_or_else(|| {
            EngineError::Replenishment(format!("deal {} has no purchase rate", deal.deal_id))
        })?;
        let supplier = deal.purchase_party.clone().ok_or_else(|| {
            EngineError::Replenishment(format!("deal {} has no purchase party", deal.deal_id))
        })?;

        self.replenishment
            .replenish(
                db,
                &ProductKey::from(deal),
                deal.deal_id,
                purchased,
                deal.quantity_sold,
                rate,
                &supplier,
                deal.deal_date,
            )
            .await
    }

    /// One transactional attempt. Any error rolls the whole unit back.
    async fn try_commit(
        &self,
        request: &NewDealRequest,
    ) -> Result<(CommittedDeal, Vec<Uuid>), EngineError> {
        let txn = self.db.begin().await?;
        match self.persist_deal(&txn, request).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(err) => {
                let _ = txn.rollback().await;
                Err(err)
            }
        }
    }

    async fn persist_deal(
        &self,
        txn: &DatabaseTransaction,
        request: &NewDealRequest,
    ) -> Result<(CommittedDeal, Vec<Uuid>), EngineError> {
        let now = Utc::now();
        let deal_id = Uuid::new_v4();

        let (purchase_party, purchase_quantity, purchase_rate) = match &request.sourcing {
            DealSourcing::NewMaterial {
                purchase_party,
                purchase_quantity,
                purchase_rate,
            } => (
                Some(purchase_party.clone()),
                Some(*purchase_quantity),
                Some(*purchase_rate),
            ),
            DealSourcing::FromInventory { .. } => (None, None, None),
        };

        let deal = deal::ActiveModel {
            deal_id: Set(deal_id),
            sale_party: Set(request.sale_party.clone()),
            quantity_sold: Set(request.quantity_sold),
            sale_rate: Set(request.sale_rate),
            product_code: Set(request.product.product_code.clone()),
            grade: Set(request.product.grade.clone()),
            company: Set(request.product.company.clone()),
            specific_grade: Set(request.product.specific_grade.clone()),
            delivery_terms: Set(request.delivery_terms.clone()),
            deal_date: Set(request.deal_date),
            source_mode: Set(request.sourcing.mode().as_str().to_string()),
            purchase_party: Set(purchase_party),
            purchase_quantity: Set(purchase_quantity),
            purchase_rate: Set(purchase_rate),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;

        let mut sources = Vec::new();
        let mut depleted = Vec::new();

        if let DealSourcing::FromInventory { selections } = &request.sourcing {
            let lines = self
                .allocation
                .allocate(txn, &request.product, request.quantity_sold, selections)
                .await?;

            for (idx, line) in lines.iter().enumerate() {
                let row = deal_source::ActiveModel {
                    source_id: Set(Uuid::new_v4()),
                    deal_id: Set(deal_id),
                    lot_id: Set(line.lot_id),
                    quantity_used: Set(line.quantity),
                    cost_per_unit: Set(line.unit_cost),
                    supplier_name: Set(line.supplier_name.clone()),
                    selection_order: Set((idx + 1) as i32),
                    created_at: Set(now),
                }
                .insert(txn)
                .await?;
                sources.push(row);

                if line.depleted {
                    depleted.push(line.lot_id);
                }
            }
        }

        Ok((CommittedDeal { deal, sources }, depleted))
    }

    /// Best-effort work after the transaction boundary. Failures here are
    /// logged and reported on the event channel; the deal stays committed.
    async fn post_commit(&self, committed: &CommittedDeal, depleted: &[Uuid]) {
        let deal = &committed.deal;

        if deal.source_mode() == Some(SourceMode::NewMaterial) {
            match self.replenish_committed(deal).await {
                Ok(Some(lot)) => {
                    self.emit(Event::LotCreated {
                        lot_id: lot.lot_id,
                        quantity: lot.quantity,
                        source_deal_id: lot.source_deal_id,
                    })
                    .await;
                }
                Ok(None) => {}
                Err(err) => {
                    error!(
                        deal_id = %deal.deal_id,
                        error = %err,
                        "post-commit replenishment failed; deal remains committed"
                    );
                    self.emit(Event::ReplenishmentFailed {
                        deal_id: deal.deal_id,
                        reason: err.to_string(),
                    })
                    .await;
                }
            }
        }

        for lot_id in depleted {
            self.emit(Event::LotDepleted {
                lot_id: *lot_id,
                deal_id: deal.deal_id,
            })
            .await;
        }

        self.emit(Event::DealCommitted {
            deal_id: deal.deal_id,
            source_mode: deal.source_mode.clone(),
            quantity_sold: deal.quantity_sold,
            committed_at: deal.created_at,
        })
        .await;
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "event dispatch failed");
            }
        }
    }
}
