//! Price history access port.

use crate::domain::error::NewsdeskError;
use crate::domain::ohlcv::PriceBar;

pub trait PriceDataPort {
    /// Daily bars for `ticker`, ascending by date.
    fn fetch_bars(&self, ticker: &str) -> Result<Vec<PriceBar>, NewsdeskError>;

    fn list_tickers(&self) -> Result<Vec<String>, NewsdeskError>;
}
