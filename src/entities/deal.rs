use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sale event. Immutable after creation; the purchase-side columns are
/// populated only for new-material deals.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub deal_id: Uuid,
    pub sale_party: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_sold: rust_decimal::Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub sale_rate: rust_decimal::Decimal,
    pub product_code: String,
    pub grade: String,
    pub company: String,
    pub specific_grade: String,
    pub delivery_terms: Option<String>,
    pub deal_date: NaiveDate,
    pub source_mode: String,
    pub purchase_party: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub purchase_quantity: Option<rust_decimal::Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub purchase_rate: Option<rust_decimal::Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deal_source::Entity")]
    DealSources,
}

impl Related<super::deal_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DealSources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Whether a sale's supply came from existing inventory or a fresh purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMode {
    NewMaterial,
    FromInventory,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::NewMaterial => "NEW_MATERIAL",
            SourceMode::FromInventory => "FROM_INVENTORY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW_MATERIAL" => Some(SourceMode::NewMaterial),
            "FROM_INVENTORY" => Some(SourceMode::FromInventory),
            _ => None,
        }
    }
}

impl Model {
    pub fn source_mode(&self) -> Option<SourceMode> {
        SourceMode::parse(&self.source_mode)
    }
}
