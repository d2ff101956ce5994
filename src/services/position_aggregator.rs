use std::collections::BTreeMap;

use bigdecimal::BigDecimal;

use crate::models::{AssetType, Operation, Position, Side};

#[derive(Debug, Clone)]
struct RunningHolding {
    name: String,
    asset_type: Option<AssetType>,
    quantity: BigDecimal,
    average_cost: BigDecimal,
}

impl RunningHolding {
    fn empty() -> Self {
        Self {
            name: String::new(),
            asset_type: None,
            quantity: BigDecimal::from(0),
            average_cost: BigDecimal::from(0),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let zero = BigDecimal::from(0);
        match op.side {
            Side::Buy => {
                let new_qty = &self.quantity + &op.quantity;
                self.average_cost = if new_qty > zero {
                    (&self.average_cost * &self.quantity + &op.price * &op.quantity) / &new_qty
                } else {
                    zero
                };
                self.quantity = new_qty;
            }
            Side::Sell => {
                let new_qty = &self.quantity - &op.quantity;
                self.quantity = if new_qty < zero { zero } else { new_qty };
            }
        }

        if self.name.trim().is_empty() && !op.name.trim().is_empty() {
            self.name = op.name.clone();
        }
        if self.asset_type.is_none() {
            self.asset_type = Some(op.asset_type);
        }
    }
}

/// Folds the operation log into the current holdings, keyed by ticker.
///
/// Operations are replayed by `(date, id)` regardless of the order they are
/// passed in. Sells clamp the quantity at zero and leave the average cost
/// alone. Tickers that end with no quantity are left out of the result.
pub fn aggregate(operations: &[Operation]) -> BTreeMap<String, Position> {
    let mut ordered: Vec<&Operation> = operations.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut running: BTreeMap<String, RunningHolding> = BTreeMap::new();
    for op in ordered {
        running
            .entry(op.ticker.clone())
            .or_insert_with(RunningHolding::empty)
            .apply(op);
    }

    let zero = BigDecimal::from(0);
    running
        .into_iter()
        .filter(|(_, h)| h.quantity > zero)
        .map(|(ticker, h)| {
            let position = Position {
                ticker: ticker.clone(),
                name: h.name,
                asset_type: h.asset_type.unwrap_or(AssetType::Other),
                quantity: h.quantity,
                average_cost: h.average_cost,
            };
            (ticker, position)
        })
        .collect()
}
