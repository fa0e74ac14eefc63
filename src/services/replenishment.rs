use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    entities::inventory_lot,
    errors::EngineError,
    services::lot_store::{LotStore, NewLot, ProductKey},
};

/// Unsold remainder of a purchase, or `None` when the purchase was fully
/// sold (or oversold — a non-positive remainder is the same no-op).
pub fn leftover_quantity(purchased: Decimal, sold: Decimal) -> Option<Decimal> {
    let remaining = purchased - sold;
    (remaining > Decimal::ZERO).then_some(remaining)
}

/// Creates inventory lots from the leftover of new-material deals.
///
/// Stateless: run-once-per-deal is the coordinator's job (it checks
/// `find_by_source_deal` before calling), as does the supervisor's backfill.
#[derive(Clone)]
pub struct ReplenishmentService {
    lots: LotStore,
}

impl ReplenishmentService {
    pub fn new(lots: LotStore) -> Self {
        Self { lots }
    }

    /// Adds the unsold remainder of a purchase as a new lot. Returns `None`
    /// when there is nothing left over, which is the common case.
    #[instrument(skip(self, conn, key), fields(source_deal_id = %source_deal_id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn replenish<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: &ProductKey,
        source_deal_id: Uuid,
        purchased: Decimal,
        sold: Decimal,
        unit_cost: Decimal,
        supplier_name: &str,
        date: NaiveDate,
    ) -> Result<Option<inventory_lot::Model>, EngineError> {
        let Some(remaining) = leftover_quantity(purchased, sold) else {
            debug!(%purchased, %sold, "purchase fully sold, no lot to create");
            return Ok(None);
        };

        let lot = self
            .lots
            .create(
                conn,
                NewLot {
                    product: key.clone(),
                    quantity: remaining,
                    unit_cost,
                    supplier_name: supplier_name.to_string(),
                    date_added: date,
                    source_deal_id: Some(source_deal_id),
                },
            )
            .await?;

        info!(lot_id = %lot.lot_id, %remaining, "leftover stock added to inventory");
        Ok(Some(lot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_remainder_is_the_leftover() {
        assert_eq!(leftover_quantity(dec!(30), dec!(20)), Some(dec!(10)));
    }

    #[test]
    fn fully_sold_purchase_leaves_nothing() {
        assert_eq!(leftover_quantity(dec!(30), dec!(30)), None);
    }

    #[test]
    fn oversold_purchase_is_treated_like_zero() {
        assert_eq!(leftover_quantity(dec!(30), dec!(35)), None);
    }

    #[test]
    fn fractional_remainders_survive() {
        assert_eq!(leftover_quantity(dec!(10.5), dec!(10.25)), Some(dec!(0.25)));
    }
}
