use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        deal,
        inventory_lot::{self, Entity as InventoryLotEntity},
    },
    errors::EngineError,
};

/// Composite identity defining fungibility: two lots are interchangeable
/// only if all four fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct ProductKey {
    #[validate(length(min = 1, message = "product code is required"))]
    pub product_code: String,
    pub grade: String,
    #[validate(length(min = 1, message = "company is required"))]
    pub company: String,
    pub specific_grade: String,
}

impl ProductKey {
    pub fn matches(&self, lot: &inventory_lot::Model) -> bool {
        self.product_code == lot.product_code
            && self.grade == lot.grade
            && self.company == lot.company
            && self.specific_grade == lot.specific_grade
    }

    fn select_lots(&self) -> Select<InventoryLotEntity> {
        InventoryLotEntity::find()
            .filter(inventory_lot::Column::ProductCode.eq(self.product_code.as_str()))
            .filter(inventory_lot::Column::Grade.eq(self.grade.as_str()))
            .filter(inventory_lot::Column::Company.eq(self.company.as_str()))
            .filter(inventory_lot::Column::SpecificGrade.eq(self.specific_grade.as_str()))
    }
}

impl From<&deal::Model> for ProductKey {
    fn from(deal: &deal::Model) -> Self {
        Self {
            product_code: deal.product_code.clone(),
            grade: deal.grade.clone(),
            company: deal.company.clone(),
            specific_grade: deal.specific_grade.clone(),
        }
    }
}

/// Parameters for creating a lot, either manually or from replenishment.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub product: ProductKey,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub supplier_name: String,
    pub date_added: NaiveDate,
    pub source_deal_id: Option<Uuid>,
}

/// Result of a successful decrement.
#[derive(Debug, Clone)]
pub enum DecrementOutcome {
    /// The lot still holds stock after the deduction.
    Remaining(inventory_lot::Model),
    /// The deduction landed on exactly zero and the row was removed.
    Depleted,
}

/// Persistent collection of inventory lots. Pure persistence: business
/// validation lives in the allocation engine and the deal coordinator.
#[derive(Clone)]
pub struct LotStore {
    db: Arc<DatabaseConnection>,
}

impl LotStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists lots with stock for a product key, newest first. Read path for
    /// the manual-selection UI.
    #[instrument(skip(self))]
    pub async fn list_available(
        &self,
        key: &ProductKey,
    ) -> Result<Vec<inventory_lot::Model>, EngineError> {
        let lots = key
            .select_lots()
            .filter(inventory_lot::Column::Quantity.gt(Decimal::ZERO))
            .order_by_desc(inventory_lot::Column::DateAdded)
            .order_by_desc(inventory_lot::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(lots)
    }

    pub async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_id: Uuid,
    ) -> Result<Option<inventory_lot::Model>, EngineError> {
        let lot = InventoryLotEntity::find_by_id(lot_id).one(conn).await?;
        Ok(lot)
    }

    /// Finds the lot created by replenishing a given deal, if any. At most
    /// one such lot exists per deal.
    pub async fn find_by_source_deal<C: ConnectionTrait>(
        &self,
        conn: &C,
        deal_id: Uuid,
    ) -> Result<Option<inventory_lot::Model>, EngineError> {
        let lot = InventoryLotEntity::find()
            .filter(inventory_lot::Column::SourceDealId.eq(deal_id))
            .one(conn)
            .await?;
        Ok(lot)
    }

    /// Persists a new lot, assigning its id and recording the creation
    /// quantity as `original_quantity`.
    #[instrument(skip(self, conn, new_lot), fields(product_code = %new_lot.product.product_code))]
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_lot: NewLot,
    ) -> Result<inventory_lot::Model, EngineError> {
        let now = Utc::now();
        let lot = inventory_lot::ActiveModel {
            lot_id: Set(Uuid::new_v4()),
            product_code: Set(new_lot.product.product_code),
            grade: Set(new_lot.product.grade),
            company: Set(new_lot.product.company),
            specific_grade: Set(new_lot.product.specific_grade),
            quantity: Set(new_lot.quantity),
            original_quantity: Set(new_lot.quantity),
            unit_cost: Set(new_lot.unit_cost),
            supplier_name: Set(new_lot.supplier_name),
            date_added: Set(new_lot.date_added),
            source_deal_id: Set(new_lot.source_deal_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;
        Ok(lot)
    }

    /// Deducts `amount` from a lot using the caller's read as an optimistic
    /// guard: the write is predicated on both the lot id and the quantity the
    /// caller saw, so a raced decrement affects zero rows and is reported as
    /// `ConcurrencyConflict` rather than silently overselling.
    ///
    /// A deduction landing on exactly zero removes the row.
    #[instrument(skip(self, conn, lot), fields(lot_id = %lot.lot_id))]
    pub async fn decrement<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot: &inventory_lot::Model,
        amount: Decimal,
    ) -> Result<DecrementOutcome, EngineError> {
        if amount > lot.quantity {
            return Err(EngineError::InsufficientQuantity {
                lot_id: lot.lot_id,
                available: lot.quantity,
                requested: amount,
            });
        }

        let rows_affected = if amount == lot.quantity {
            InventoryLotEntity::delete_many()
                .filter(inventory_lot::Column::LotId.eq(lot.lot_id))
                .filter(inventory_lot::Column::Quantity.eq(lot.quantity))
                .exec(conn)
                .await?
                .rows_affected
        } else {
            InventoryLotEntity::update_many()
                .col_expr(
                    inventory_lot::Column::Quantity,
                    Expr::value(lot.quantity - amount),
                )
                .col_expr(inventory_lot::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(inventory_lot::Column::LotId.eq(lot.lot_id))
                .filter(inventory_lot::Column::Quantity.eq(lot.quantity))
                .exec(conn)
                .await?
                .rows_affected
        };

        if rows_affected == 0 {
            // The guarded write lost a race; classify from a fresh read.
            return Err(match self.get(conn, lot.lot_id).await? {
                None => EngineError::LotNotFound(lot.lot_id),
                Some(current) if current.quantity < amount => EngineError::InsufficientQuantity {
                    lot_id: lot.lot_id,
                    available: current.quantity,
                    requested: amount,
                },
                Some(_) => EngineError::ConcurrencyConflict(lot.lot_id),
            });
        }

        if amount == lot.quantity {
            Ok(DecrementOutcome::Depleted)
        } else {
            Ok(DecrementOutcome::Remaining(inventory_lot::Model {
                quantity: lot.quantity - amount,
                updated_at: Utc::now(),
                ..lot.clone()
            }))
        }
    }
}
