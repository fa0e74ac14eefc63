use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One discrete quantity of stock at a fixed unit cost and supplier.
///
/// Rows are deleted, not zeroed, when a deduction lands on exactly zero, so
/// exhausted lots disappear from availability listings without operator
/// cleanup.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub lot_id: Uuid,
    pub product_code: String,
    pub grade: String,
    pub company: String,
    pub specific_grade: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: rust_decimal::Decimal,
    /// Quantity at creation; immutable, used by reconciliation.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub original_quantity: rust_decimal::Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_cost: rust_decimal::Decimal,
    pub supplier_name: String,
    pub date_added: NaiveDate,
    /// Set when the lot is the leftover of a new-material deal; at most one
    /// lot exists per source deal.
    pub source_deal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
