//! Relay fee maintenance on the home network.
//!
//! - `price`: keeps the per-destination price ratio close to the market
//! - `gas`: pushes base and per-byte relay gas per destination
//! - `price_feed`: market close prices

pub mod gas;
pub mod price;
pub mod price_feed;

pub use gas::{encode_u256_param, GasParameterUpdater, GasUpdateReport};
pub use price::{
    compute_ratio, should_update, ChainPriceReport, OracleConfig, PriceOracleUpdater, PriceUpdate,
};
pub use price_feed::{BinanceClient, PriceFeedClient, StaticPriceFeed, Timeframe, TradingPair};
