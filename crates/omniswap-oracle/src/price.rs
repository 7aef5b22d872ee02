//! Relay fee price ratio oracle.
//!
//! For each destination chain the on-chain `PriceManager` holds the price of
//! the chain's native asset in home-asset terms, scaled by `1e8`. Updates
//! follow upward moves immediately and downward moves only past a ~9% band.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use omniswap_ledger::{with_timeout, ContractCall, LedgerClient, TxReceipt};
use omniswap_registry::{DstChain, NetworkRegistry, RelayConfig};
use omniswap_types::{Field, OmniswapError, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::price_feed::{PriceFeedClient, Timeframe, TradingPair};

pub const FEE_MODULE: &str = "so_fee_wormhole";
pub const SET_PRICE_RATIO: &str = "set_price_ratio";
pub const PRICE_MANAGER: &str = "PriceManager";

/// Price oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub ratio_decimal: u64,
    /// Upward bias covering volatility between updates, must exceed 1
    pub safety_multiplier: f64,
    pub quote_symbol: String,
    pub timeframe: Timeframe,
    pub chains: Vec<DstChain>,
    pub request_timeout: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            ratio_decimal: 100_000_000,
            safety_multiplier: 1.2,
            quote_symbol: "USDT".to_string(),
            timeframe: Timeframe::OneMinute,
            chains: DstChain::ALL.to_vec(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// `floor(price_target / price_home * decimal * multiplier)`.
pub fn compute_ratio(
    price_target: f64,
    price_home: f64,
    ratio_decimal: u64,
    safety_multiplier: f64,
) -> Result<u128> {
    if !(price_target > 0.0 && price_home > 0.0) {
        return Err(OmniswapError::Other(format!(
            "cannot price ratio from {} / {}",
            price_target, price_home
        )));
    }
    let ratio = (price_target / price_home * ratio_decimal as f64 * safety_multiplier).floor();
    if !ratio.is_finite() || ratio < 0.0 || ratio > u128::MAX as f64 {
        return Err(OmniswapError::Other(format!("ratio {} out of range", ratio)));
    }
    Ok(ratio as u128)
}

/// Update when the price rose, or fell by more than the 1.1x band.
///
/// Compared exactly as `new * 11 < old * 10`.
pub fn should_update(old_ratio: u128, new_ratio: u128) -> bool {
    new_ratio > old_ratio || new_ratio.saturating_mul(11) < old_ratio.saturating_mul(10)
}

/// What happened to one chain's ratio this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceUpdate {
    Updated {
        old_ratio: u128,
        new_ratio: u128,
        receipt: TxReceipt,
    },
    Skipped {
        old_ratio: u128,
        new_ratio: u128,
    },
}

#[derive(Debug)]
pub struct ChainPriceReport {
    pub chain: DstChain,
    pub outcome: Result<PriceUpdate>,
}

/// Pushes fresh price ratios to the home network's fee module.
pub struct PriceOracleUpdater {
    config: OracleConfig,
    registry: Arc<NetworkRegistry>,
    ledger: Arc<dyn LedgerClient>,
    feed: Arc<dyn PriceFeedClient>,
}

impl PriceOracleUpdater {
    pub fn new(
        config: OracleConfig,
        registry: Arc<NetworkRegistry>,
        ledger: Arc<dyn LedgerClient>,
        feed: Arc<dyn PriceFeedClient>,
    ) -> Self {
        Self {
            config,
            registry,
            ledger,
            feed,
        }
    }

    /// Run one pass over every configured chain.
    ///
    /// Chains are independent: a failure is reported for that chain only.
    pub async fn run_once(&self) -> Result<Vec<ChainPriceReport>> {
        if !(self.config.safety_multiplier > 1.0) {
            return Err(OmniswapError::Config(format!(
                "safety multiplier must exceed 1, got {}",
                self.config.safety_multiplier
            )));
        }
        let relay = self.registry.relay()?;
        let prices = self.fetch_prices(relay).await;

        let mut reports = Vec::with_capacity(self.config.chains.len());
        for &chain in &self.config.chains {
            let outcome = self.update_chain(relay, chain, &prices).await;
            match &outcome {
                Ok(PriceUpdate::Updated { old_ratio, new_ratio, receipt }) => info!(
                    chain = %chain,
                    old_ratio = %old_ratio,
                    new_ratio = %new_ratio,
                    tx_hash = %receipt.tx_hash,
                    "price ratio updated"
                ),
                Ok(PriceUpdate::Skipped { old_ratio, new_ratio }) => debug!(
                    chain = %chain,
                    old_ratio = %old_ratio,
                    new_ratio = %new_ratio,
                    "price ratio within band, skipped"
                ),
                Err(e) => warn!(chain = %chain, error = %e, "price ratio update failed"),
            }
            reports.push(ChainPriceReport { chain, outcome });
        }
        Ok(reports)
    }

    /// Fetch each symbol once; failures are kept per symbol.
    async fn fetch_prices(&self, relay: &RelayConfig) -> BTreeMap<String, Result<f64>> {
        let mut symbols = vec![relay.home_symbol.clone()];
        for chain in &self.config.chains {
            let symbol = chain.native_symbol().to_string();
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }

        let mut prices = BTreeMap::new();
        for symbol in symbols {
            let pair = TradingPair::new(&symbol, &self.config.quote_symbol);
            let price = with_timeout(
                self.config.request_timeout,
                self.feed.latest_close(&pair, self.config.timeframe),
                |reason| OmniswapError::PriceFeedUnavailable {
                    pair: pair.to_string(),
                    reason,
                },
            )
            .await;
            if let Ok(p) = &price {
                debug!(pair = %pair, price = p, "fetched close price");
            }
            prices.insert(symbol, price);
        }
        prices
    }

    async fn update_chain(
        &self,
        relay: &RelayConfig,
        chain: DstChain,
        prices: &BTreeMap<String, Result<f64>>,
    ) -> Result<PriceUpdate> {
        let price_target = lookup_price(prices, chain.native_symbol(), &self.config.quote_symbol)?;
        let price_home = lookup_price(prices, &relay.home_symbol, &self.config.quote_symbol)?;
        let new_ratio = compute_ratio(
            price_target,
            price_home,
            self.config.ratio_decimal,
            self.config.safety_multiplier,
        )?;

        let old_ratio = self.read_ratio(relay, chain).await?;
        if !should_update(old_ratio, new_ratio) {
            return Ok(PriceUpdate::Skipped { old_ratio, new_ratio });
        }

        let call = ContractCall::new(
            format!("{}::{}", relay.package, FEE_MODULE),
            SET_PRICE_RATIO,
            vec![
                Field::uint(chain.wormhole_chain_id() as u64),
                Field::uint(new_ratio),
            ],
        );
        let operation = format!("{} for {}", SET_PRICE_RATIO, chain);
        let receipt = with_timeout(
            self.config.request_timeout,
            self.ledger.call(&relay.network, &call),
            |reason| OmniswapError::TransactionSubmission {
                network: relay.network.clone(),
                operation: operation.clone(),
                reason,
            },
        )
        .await?;

        Ok(PriceUpdate::Updated {
            old_ratio,
            new_ratio,
            receipt,
        })
    }

    /// Current on-chain ratio; never guessed when the read fails.
    async fn read_ratio(&self, relay: &RelayConfig, chain: DstChain) -> Result<u128> {
        let address = relay.price_resources.get(&chain).ok_or_else(|| {
            OmniswapError::Config(format!("no PriceManager resource configured for {}", chain))
        })?;
        let resource_type = relay.module_path(FEE_MODULE, PRICE_MANAGER);
        let chain_read = |reason: String| OmniswapError::ChainRead {
            network: relay.network.clone(),
            operation: format!("read {} for {}", PRICE_MANAGER, chain),
            reason,
        };

        let resource = with_timeout(
            self.config.request_timeout,
            self.ledger.read_resource(&relay.network, address, &resource_type),
            chain_read,
        )
        .await?;

        parse_current_ratio(&resource).ok_or_else(|| {
            chain_read(format!("malformed PriceManager resource: {}", resource))
        })
    }
}

fn lookup_price(prices: &BTreeMap<String, Result<f64>>, symbol: &str, quote: &str) -> Result<f64> {
    match prices.get(symbol) {
        Some(Ok(price)) => Ok(*price),
        Some(Err(e)) => Err(OmniswapError::PriceFeedUnavailable {
            pair: format!("{}/{}", symbol, quote),
            reason: e.to_string(),
        }),
        None => Err(OmniswapError::PriceFeedUnavailable {
            pair: format!("{}/{}", symbol, quote),
            reason: "not fetched".into(),
        }),
    }
}

/// `data.price_data.current_price_ratio`, a u64 rendered as string or number.
fn parse_current_ratio(resource: &Value) -> Option<u128> {
    match &resource["data"]["price_data"]["current_price_ratio"] {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_feed::StaticPriceFeed;
    use omniswap_ledger::MemoryLedger;
    use serde_json::json;

    fn registry() -> Arc<NetworkRegistry> {
        Arc::new(
            NetworkRegistry::from_toml_str(include_str!("../../../tests/fixtures/networks.toml"))
                .unwrap(),
        )
    }

    fn set_old_ratio(ledger: &MemoryLedger, reg: &NetworkRegistry, chain: DstChain, ratio: u128) {
        let relay = reg.relay().unwrap();
        ledger.set_resource(
            &relay.network,
            &relay.price_resources[&chain],
            &relay.module_path(FEE_MODULE, PRICE_MANAGER),
            json!({
                "type": relay.module_path(FEE_MODULE, PRICE_MANAGER),
                "data": { "price_data": { "current_price_ratio": ratio.to_string() } }
            }),
        );
    }

    fn updater(
        reg: Arc<NetworkRegistry>,
        ledger: Arc<MemoryLedger>,
        feed: StaticPriceFeed,
        chains: Vec<DstChain>,
    ) -> PriceOracleUpdater {
        let config = OracleConfig {
            chains,
            ..OracleConfig::default()
        };
        PriceOracleUpdater::new(config, reg, ledger, Arc::new(feed))
    }

    #[test]
    fn test_hysteresis_band() {
        assert!(should_update(100, 101));
        assert!(!should_update(100, 100));
        assert!(!should_update(100, 95));
        assert!(should_update(100, 85));
        // 91 * 1.1 = 100.1, not below 100
        assert!(!should_update(100, 91));
        assert!(should_update(100, 90));
        assert!(should_update(0, 1));
    }

    #[test]
    fn test_compute_ratio() {
        // 1800 / 8 * 1e8 * 1.2
        assert_eq!(compute_ratio(1800.0, 8.0, 100_000_000, 1.2).unwrap(), 27_000_000_000);
        assert_eq!(compute_ratio(1.0, 3.0, 100, 1.0).unwrap(), 33);
        assert!(compute_ratio(0.0, 8.0, 100_000_000, 1.2).is_err());
        assert!(compute_ratio(1.0, 0.0, 100_000_000, 1.2).is_err());
    }

    #[test]
    fn test_parse_current_ratio() {
        let r = json!({"data": {"price_data": {"current_price_ratio": "12345"}}});
        assert_eq!(parse_current_ratio(&r), Some(12345));
        let n = json!({"data": {"price_data": {"current_price_ratio": 77}}});
        assert_eq!(parse_current_ratio(&n), Some(77));
        assert_eq!(parse_current_ratio(&json!({"data": {}})), None);
    }

    #[tokio::test]
    async fn test_upward_move_pushes_update() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 20_000_000_000);
        let feed = StaticPriceFeed::new()
            .with_price("ETH/USDT", 1800.0)
            .with_price("APT/USDT", 8.0);

        let reports = updater(reg.clone(), ledger.clone(), feed, vec![DstChain::Ethereum])
            .run_once()
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        match reports[0].outcome.as_ref().unwrap() {
            PriceUpdate::Updated { old_ratio, new_ratio, .. } => {
                assert_eq!(*old_ratio, 20_000_000_000);
                assert_eq!(*new_ratio, 27_000_000_000);
            }
            other => panic!("expected update, got {:?}", other),
        }

        let calls = ledger.submitted();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].network, "aptos-mainnet");
        assert_eq!(calls[0].call.function, SET_PRICE_RATIO);
        assert!(calls[0].call.contract.ends_with("::so_fee_wormhole"));
        assert_eq!(
            calls[0].call.args,
            vec![Field::uint(2u64), Field::uint(27_000_000_000u128)]
        );
    }

    #[tokio::test]
    async fn test_small_drop_is_skipped() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        // 27e9 is ~4% below 28e9
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 28_000_000_000);
        let feed = StaticPriceFeed::new()
            .with_price("ETH/USDT", 1800.0)
            .with_price("APT/USDT", 8.0);

        let reports = updater(reg, ledger.clone(), feed, vec![DstChain::Ethereum])
            .run_once()
            .await
            .unwrap();

        assert!(matches!(
            reports[0].outcome,
            Ok(PriceUpdate::Skipped { old_ratio: 28_000_000_000, new_ratio: 27_000_000_000 })
        ));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_chains_are_independent() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 1);
        // Bsc has no price, Polygon has no resource, Avalanche dropped sharply.
        set_old_ratio(&ledger, &reg, DstChain::Bsc, 1);
        set_old_ratio(&ledger, &reg, DstChain::Avalanche, 100_000_000_000);
        let feed = StaticPriceFeed::new()
            .with_price("ETH/USDT", 1800.0)
            .with_price("MATIC/USDT", 0.9)
            .with_price("AVAX/USDT", 12.0)
            .with_price("APT/USDT", 8.0);

        let reports = updater(reg, ledger.clone(), feed, DstChain::ALL.to_vec())
            .run_once()
            .await
            .unwrap();

        assert_eq!(reports.len(), 4);
        assert!(matches!(reports[0].outcome, Ok(PriceUpdate::Updated { .. })));
        assert!(matches!(
            reports[1].outcome,
            Err(OmniswapError::PriceFeedUnavailable { ref pair, .. }) if pair == "BNB/USDT"
        ));
        assert!(matches!(reports[2].outcome, Err(OmniswapError::ChainRead { .. })));
        assert!(matches!(
            reports[3].outcome,
            Ok(PriceUpdate::Updated { new_ratio: 180_000_000, .. })
        ));

        let pushed: Vec<Field> = ledger
            .submitted()
            .iter()
            .map(|c| c.call.args[0].clone())
            .collect();
        assert_eq!(pushed, vec![Field::uint(2u64), Field::uint(6u64)]);
    }

    #[tokio::test]
    async fn test_missing_home_price_skips_everything() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 1);
        let feed = StaticPriceFeed::new().with_price("ETH/USDT", 1800.0);

        let reports = updater(reg, ledger.clone(), feed, vec![DstChain::Ethereum])
            .run_once()
            .await
            .unwrap();

        assert!(matches!(
            reports[0].outcome,
            Err(OmniswapError::PriceFeedUnavailable { ref pair, .. }) if pair == "APT/USDT"
        ));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_each_symbol_fetched_once() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        let feed = Arc::new(StaticPriceFeed::new());
        let config = OracleConfig::default();
        let updater = PriceOracleUpdater::new(config, reg, ledger, feed.clone());

        let reports = updater.run_once().await.unwrap();
        assert_eq!(reports.len(), 4);
        assert_eq!(
            feed.requests(),
            vec!["APT/USDT", "ETH/USDT", "BNB/USDT", "MATIC/USDT", "AVAX/USDT"]
        );
    }

    #[tokio::test]
    async fn test_configured_timeframe_is_used() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        set_old_ratio(&ledger, &reg, DstChain::Avalanche, 1);
        let feed = Arc::new(
            StaticPriceFeed::new()
                .with_price("AVAX/USDT", 12.0)
                .with_price("APT/USDT", 8.0),
        );
        let config = OracleConfig {
            chains: vec![DstChain::Avalanche],
            timeframe: Timeframe::FiveMinutes,
            ..OracleConfig::default()
        };

        let reports = PriceOracleUpdater::new(config, reg, ledger, feed.clone())
            .run_once()
            .await
            .unwrap();
        assert!(matches!(reports[0].outcome, Ok(PriceUpdate::Updated { .. })));
        assert_eq!(feed.requests(), vec!["APT/USDT", "AVAX/USDT"]);
        assert_eq!(feed.timeframes(), vec![Timeframe::FiveMinutes; 2]);
    }

    #[tokio::test]
    async fn test_multiplier_must_exceed_one() {
        let config = OracleConfig {
            safety_multiplier: 1.0,
            ..OracleConfig::default()
        };
        let updater = PriceOracleUpdater::new(
            config,
            registry(),
            Arc::new(MemoryLedger::new()),
            Arc::new(StaticPriceFeed::new()),
        );
        assert!(matches!(updater.run_once().await, Err(OmniswapError::Config(_))));
    }

    #[tokio::test]
    async fn test_submission_failure_reported() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        ledger.fail_function(SET_PRICE_RATIO);
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 1);
        let feed = StaticPriceFeed::new()
            .with_price("ETH/USDT", 1800.0)
            .with_price("APT/USDT", 8.0);

        let reports = updater(reg, ledger, feed, vec![DstChain::Ethereum])
            .run_once()
            .await
            .unwrap();
        assert!(matches!(
            reports[0].outcome,
            Err(OmniswapError::TransactionSubmission { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_read_times_out_as_chain_read() {
        let reg = registry();
        let ledger = Arc::new(MemoryLedger::new());
        set_old_ratio(&ledger, &reg, DstChain::Ethereum, 1);
        ledger.set_latency(Duration::from_millis(200));
        let feed = StaticPriceFeed::new()
            .with_price("ETH/USDT", 1800.0)
            .with_price("APT/USDT", 8.0);
        let config = OracleConfig {
            chains: vec![DstChain::Ethereum],
            request_timeout: Duration::from_millis(20),
            ..OracleConfig::default()
        };

        let reports = PriceOracleUpdater::new(config, reg, ledger.clone(), Arc::new(feed))
            .run_once()
            .await
            .unwrap();
        assert!(matches!(reports[0].outcome, Err(OmniswapError::ChainRead { .. })));
        assert!(ledger.submitted().is_empty());
    }
}
