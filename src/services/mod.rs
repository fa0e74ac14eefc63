// Lot persistence and the allocation/replenishment engines built on it
pub mod allocation;
pub mod lot_store;
pub mod replenishment;

// Transaction coordination over deals
pub mod deals;

// Out-of-band invariant checking and backfill
pub mod consistency;
