// src/model/inventory.rs

use serde::Serialize;

/// Result of serving one day's demand from stock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fulfillment {
    pub demand: f64,
    pub fulfilled: f64,
    pub lost_sales: f64,
}

impl Fulfillment {
    pub fn is_stockout(&self) -> bool {
        self.fulfilled < self.demand
    }
}

/// The single stock position of a trial.
///
/// Stock never goes negative: unmet demand is lost, not backordered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryState {
    stock: f64,
    cumulative_writeoff: f64,
}

impl InventoryState {
    pub fn new(initial_stock: f64) -> Self {
        Self {
            stock: initial_stock.max(0.0),
            cumulative_writeoff: 0.0,
        }
    }

    pub fn stock(&self) -> f64 {
        self.stock
    }

    pub fn cumulative_writeoff(&self) -> f64 {
        self.cumulative_writeoff
    }

    /// Step 1: goods arrive.
    pub fn receive(&mut self, quantity: f64) {
        self.stock += quantity;
    }

    /// Step 2: serve what we can, lose the rest.
    pub fn fulfill(&mut self, demand: u32) -> Fulfillment {
        let demand = demand as f64;
        let fulfilled = demand.min(self.stock);
        self.stock = (self.stock - fulfilled).max(0.0);

        Fulfillment {
            demand,
            fulfilled,
            lost_sales: (demand - fulfilled).max(0.0),
        }
    }

    /// Step 3: spoilage on the stock left after fulfillment.
    ///
    /// Returns the quantity written off today.
    pub fn apply_writeoff(&mut self, rate: f64) -> f64 {
        let writeoff = self.stock * rate;
        self.stock -= writeoff;
        self.cumulative_writeoff += writeoff;
        writeoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfill_partial_demand_loses_the_rest() {
        let mut inv = InventoryState::new(30.0);
        let outcome = inv.fulfill(50);

        assert_eq!(outcome.fulfilled, 30.0);
        assert_eq!(outcome.lost_sales, 20.0);
        assert!(outcome.is_stockout());
        assert_eq!(inv.stock(), 0.0);
    }

    #[test]
    fn test_fulfill_full_demand() {
        let mut inv = InventoryState::new(80.0);
        let outcome = inv.fulfill(50);

        assert_eq!(outcome.fulfilled, 50.0);
        assert_eq!(outcome.lost_sales, 0.0);
        assert!(!outcome.is_stockout());
        assert_eq!(inv.stock(), 30.0);
    }

    #[test]
    fn test_writeoff_accumulates() {
        let mut inv = InventoryState::new(100.0);
        let first = inv.apply_writeoff(0.01);
        let second = inv.apply_writeoff(0.01);

        assert!((first - 1.0).abs() < 1e-12);
        assert!((second - 0.99).abs() < 1e-12);
        assert!((inv.cumulative_writeoff() - 1.99).abs() < 1e-12);
        assert!((inv.stock() - 98.01).abs() < 1e-9);
    }

    #[test]
    fn test_negative_initial_stock_is_clamped() {
        assert_eq!(InventoryState::new(-5.0).stock(), 0.0);
    }
}
