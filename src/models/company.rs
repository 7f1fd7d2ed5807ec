use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub price_change_percent: Option<f64>,
}

impl Company {
    /// Returns a copy with `price_change_percent` recomputed from price and change.
    pub fn with_derived_percent(mut self) -> Self {
        self.price_change_percent = price_change_percent(self.current_price, self.price_change);
        self
    }
}

/// 涨跌幅 = 涨跌额 / (现价 - 涨跌额) * 100
///
/// None when either input is missing or the previous price is zero.
pub fn price_change_percent(current_price: Option<f64>, price_change: Option<f64>) -> Option<f64> {
    let (current, change) = (current_price?, price_change?);
    let past_price = current - change;
    if past_price == 0.0 {
        return None;
    }
    Some(change / past_price * 100.0)
}
