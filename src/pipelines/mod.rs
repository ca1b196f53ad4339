pub mod stock_market;

pub use stock_market::stock_market_data_pipeline;
