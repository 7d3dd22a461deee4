//! Series data access port trait.

use crate::domain::error::TraderulesError;
use crate::domain::series::SeriesTable;

pub trait SeriesPort {
    /// Load every named series from the backing store.
    fn load_table(&self) -> Result<SeriesTable, TraderulesError>;
}
