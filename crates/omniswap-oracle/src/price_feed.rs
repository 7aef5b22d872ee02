//! Market price sources.
//!
//! `BinanceClient` reads the public klines endpoint:
//! - GET /api/v3/klines?symbol=ETHUSDT&interval=1m&limit=1

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use omniswap_types::{OmniswapError, Result};
use serde_json::Value;

/// A base/quote trading pair, e.g. `ETH/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }

    /// Exchange market symbol without separator (`ETHUSDT`).
    pub fn market_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Candle interval used to sample the latest close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    OneMinute,
    FiveMinutes,
    OneHour,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::OneHour => "1h",
        }
    }
}

/// Source of most-recent close prices.
#[async_trait]
pub trait PriceFeedClient: Send + Sync {
    async fn latest_close(&self, pair: &TradingPair, timeframe: Timeframe) -> Result<f64>;
}

fn unavailable(pair: &TradingPair, reason: impl Into<String>) -> OmniswapError {
    OmniswapError::PriceFeedUnavailable {
        pair: pair.to_string(),
        reason: reason.into(),
    }
}

/// Binance spot market client.
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl BinanceClient {
    pub const DEFAULT_URL: &'static str = "https://api.binance.com";

    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(10_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL, None)
    }
}

#[async_trait]
impl PriceFeedClient for BinanceClient {
    async fn latest_close(&self, pair: &TradingPair, timeframe: Timeframe) -> Result<f64> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit=1",
            self.base_url,
            pair.market_symbol(),
            timeframe.as_str()
        );

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| unavailable(pair, format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(unavailable(pair, format!("status {}", resp.status())));
        }

        let candles: Vec<Vec<Value>> = resp
            .json()
            .await
            .map_err(|e| unavailable(pair, format!("failed to parse klines: {}", e)))?;

        parse_close(pair, &candles)
    }
}

/// Close price of the last candle; Binance sends it as a decimal string at index 4.
fn parse_close(pair: &TradingPair, candles: &[Vec<Value>]) -> Result<f64> {
    let close = candles
        .last()
        .and_then(|c| c.get(4))
        .ok_or_else(|| unavailable(pair, "no candle returned"))?;

    let price = match close {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| unavailable(pair, format!("malformed close price {}", close)))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(unavailable(pair, format!("non-positive close price {}", price)));
    }
    Ok(price)
}

/// Fixed prices (for testing and dry runs).
pub struct StaticPriceFeed {
    prices: Mutex<HashMap<String, f64>>,
    requests: Mutex<Vec<(String, Timeframe)>>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_price(self, pair: &str, price: f64) -> Self {
        self.set_price(pair, price);
        self
    }

    pub fn set_price(&self, pair: &str, price: f64) {
        self.prices.lock().unwrap().insert(pair.to_string(), price);
    }

    /// Pairs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    /// Candle interval of each request, in order.
    pub fn timeframes(&self) -> Vec<Timeframe> {
        self.requests.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

impl Default for StaticPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeedClient for StaticPriceFeed {
    async fn latest_close(&self, pair: &TradingPair, timeframe: Timeframe) -> Result<f64> {
        let key = pair.to_string();
        self.requests.lock().unwrap().push((key.clone(), timeframe));
        self.prices
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .ok_or_else(|| unavailable(pair, "no price configured"))
    }
}
