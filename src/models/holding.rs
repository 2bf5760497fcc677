use serde::{Deserialize, Serialize};

// An owned position within an account. Positions that reach zero shares are
// removed from the account rather than kept around with `shares: 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub shares: u32,
    /// Weighted-average purchase price across every buy that built the position.
    pub avg_price: f64,
    /// Most recently observed market price. Starts at `avg_price` until a
    /// quote refresh or a later execution updates it.
    pub current_price: f64,
}

impl Holding {
    pub fn new(symbol: String, name: String, shares: u32, avg_price: f64) -> Self {
        Self {
            symbol,
            name,
            shares,
            avg_price,
            current_price: avg_price,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.avg_price
    }

    pub fn market_value(&self) -> f64 {
        self.shares as f64 * self.current_price
    }
}
