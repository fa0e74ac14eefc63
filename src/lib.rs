//! lotledger
//!
//! Inventory allocation and replenishment engine for a commodity-trading back
//! office. The crate owns the inventory lot data model, atomic multi-lot
//! deduction for sales fulfilled from stock, leftover replenishment for sales
//! fulfilled by fresh purchases, and the deal transaction that ties them
//! together. HTTP handlers, auth, analytics and outbound messaging are
//! external collaborators that construct these services and call them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::services::allocation::*;
    pub use crate::services::consistency::*;
    pub use crate::services::deals::*;
    pub use crate::services::lot_store::*;
    pub use crate::services::replenishment::*;
}
