//! Price data supplier port trait.

use crate::domain::error::SamsignalError;
use crate::domain::ohlcv::OhlcvBar;

/// Supplies an ordered bar sequence for one instrument.
///
/// Implementations only read and parse; ordering and bar sanity are checked
/// when the bars are turned into a `Series`.
pub trait DataPort {
    fn fetch_bars(&self) -> Result<Vec<OhlcvBar>, SamsignalError>;
}
