pub mod bar;
pub mod loader;
pub mod provider;
pub mod yahoo;

pub use bar::{BarError, PriceBar, PriceSeries};
pub use loader::{filter_by_range, load_csv, CsvProvider};
pub use provider::{DataError, MarketDataProvider, TimeoutProvider};
pub use yahoo::YahooProvider;
