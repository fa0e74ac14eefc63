pub mod deal;
pub mod deal_source;
pub mod inventory_lot;
