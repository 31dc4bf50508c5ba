//! Open position and closed trade records kept by the paper broker.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub code: String,
    /// Signed: positive long, negative short.
    pub quantity: i64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity.unsigned_abs() as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }

    /// Close the whole position at `exit_price`.
    pub fn close(self, exit_price: f64, exit_date: NaiveDate) -> ClosedTrade {
        let pnl = self.unrealized_pnl(exit_price);
        ClosedTrade {
            code: self.code,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price,
            entry_date: self.entry_date,
            exit_date,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub code: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_long_position() -> Position {
        Position {
            code: "BHP".into(),
            quantity: 100,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn sample_short_position() -> Position {
        Position {
            code: "CBA".into(),
            quantity: -100,
            entry_price: 100.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn is_long_positive_quantity() {
        let pos = sample_long_position();
        assert!(pos.is_long());
        assert!(!pos.is_short());
    }

    #[test]
    fn is_short_negative_quantity() {
        let pos = sample_short_position();
        assert!(pos.is_short());
        assert!(!pos.is_long());
    }

    #[test]
    fn market_value_ignores_direction() {
        assert!((sample_long_position().market_value(55.0) - 5500.0).abs() < f64::EPSILON);
        assert!((sample_short_position().market_value(95.0) - 9500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_long() {
        let pos = sample_long_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) + 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_short() {
        let pos = sample_short_position();
        assert!((pos.unrealized_pnl(90.0) - 1000.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(110.0) + 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn close_long_realises_pnl() {
        let exit = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let trade = sample_long_position().close(55.0, exit);
        assert_eq!(trade.code, "BHP");
        assert_eq!(trade.quantity, 100);
        assert_eq!(trade.exit_date, exit);
        assert!((trade.pnl - 500.0).abs() < f64::EPSILON);
        assert!(trade.is_win());
    }

    #[test]
    fn close_short_at_loss() {
        let exit = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let trade = sample_short_position().close(104.0, exit);
        assert!((trade.pnl + 400.0).abs() < f64::EPSILON);
        assert!(!trade.is_win());
    }
}
