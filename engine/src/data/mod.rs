pub mod csv_parser;
pub mod market_data;

pub use csv_parser::CsvMarketDataSource;
pub use market_data::{fetch_all_timeframes, InMemoryMarketData, MarketDataSource};
