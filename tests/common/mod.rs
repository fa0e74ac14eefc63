#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::mpsc;

use lotledger::{
    config::AppConfig,
    db,
    entities::inventory_lot,
    events::{process_events, EventSender},
    services::{
        consistency::ConsistencySupervisor,
        deals::{DealService, DealSourcing, NewDealRequest},
        lot_store::{LotStore, NewLot, ProductKey},
    },
};

/// Harness around an in-memory SQLite database with migrations applied.
///
/// The pool is pinned to a single connection so every task sees the same
/// in-memory database and guarded writes serialize deterministically.
pub struct TestContext {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub deals: DealService,
    pub lots: LotStore,
    pub supervisor: ConsistencySupervisor,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.auto_migrate = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        let db = Arc::new(pool);

        let (tx, rx) = mpsc::channel(100);
        let sender = EventSender::new(tx);
        let event_task = tokio::spawn(process_events(rx));

        Self {
            deals: DealService::new(db.clone(), Some(sender), 3),
            lots: LotStore::new(db.clone()),
            supervisor: ConsistencySupervisor::new(db.clone()),
            db,
            _event_task: event_task,
        }
    }
}

pub fn key() -> ProductKey {
    ProductKey {
        product_code: "HDPE".to_string(),
        grade: "FILM".to_string(),
        company: "Borealis".to_string(),
        specific_grade: "FB1350".to_string(),
    }
}

pub fn other_key() -> ProductKey {
    ProductKey {
        product_code: "LLDPE".to_string(),
        grade: "INJ".to_string(),
        company: "Sabic".to_string(),
        specific_grade: "M200024".to_string(),
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date")
}

pub async fn seed_lot(
    ctx: &TestContext,
    product: &ProductKey,
    quantity: Decimal,
    unit_cost: Decimal,
    supplier: &str,
    date_added: NaiveDate,
) -> inventory_lot::Model {
    ctx.lots
        .create(
            &*ctx.db,
            NewLot {
                product: product.clone(),
                quantity,
                unit_cost,
                supplier_name: supplier.to_string(),
                date_added,
                source_deal_id: None,
            },
        )
        .await
        .expect("seed lot")
}

pub fn inventory_request(
    product: &ProductKey,
    quantity_sold: Decimal,
    selections: Vec<lotledger::services::allocation::LotSelection>,
) -> NewDealRequest {
    NewDealRequest {
        product: product.clone(),
        sale_party: "Acme Polymers".to_string(),
        quantity_sold,
        sale_rate: Decimal::new(1200, 0),
        delivery_terms: Some("CIF Hamburg".to_string()),
        deal_date: day(15),
        sourcing: DealSourcing::FromInventory { selections },
    }
}

pub fn new_material_request(
    product: &ProductKey,
    quantity_sold: Decimal,
    purchase_quantity: Decimal,
) -> NewDealRequest {
    NewDealRequest {
        product: product.clone(),
        sale_party: "Acme Polymers".to_string(),
        quantity_sold,
        sale_rate: Decimal::new(1200, 0),
        delivery_terms: None,
        deal_date: day(15),
        sourcing: DealSourcing::NewMaterial {
            purchase_party: "Gulf Resins".to_string(),
            purchase_quantity,
            purchase_rate: Decimal::new(1100, 0),
        },
    }
}
