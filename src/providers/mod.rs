pub mod caching;
pub mod csv_file;
pub mod exchange_rate;
pub mod util;
pub mod yahoo_finance;
