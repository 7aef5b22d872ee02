//! Relay gas parameters charged per destination chain.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use omniswap_ledger::{with_timeout, ContractCall, LedgerClient, TxReceipt};
use omniswap_registry::{NetworkRegistry, WormholeGasEntry};
use omniswap_types::{bytes_to_hex, Field, OmniswapError, Result};
use tracing::{debug, info, warn};

pub const GAS_MODULE: &str = "wormhole_facet";
pub const SET_WORMHOLE_GAS: &str = "set_wormhole_gas";

/// Canonical 256-bit form of a gas parameter.
pub fn normalize_u256(value: u64) -> U256 {
    U256::from(value)
}

/// Encode a decimal unsigned integer as a 32-byte big-endian vector.
pub fn encode_u256_param(decimal: &str) -> Result<Vec<u8>> {
    let value = U256::from_str_radix(decimal.trim(), 10)
        .map_err(|e| OmniswapError::Other(format!("invalid u256 {:?}: {}", decimal, e)))?;
    Ok(value.to_be_bytes::<32>().to_vec())
}

/// Outcome of one destination's gas update.
#[derive(Debug)]
pub struct GasUpdateReport {
    pub network: String,
    pub dst_chain_id: u16,
    pub outcome: Result<TxReceipt>,
}

/// Pushes `(dst_chainid, base_gas, gas_per_byte)` for every configured destination.
pub struct GasParameterUpdater {
    registry: Arc<NetworkRegistry>,
    ledger: Arc<dyn LedgerClient>,
    request_timeout: Duration,
}

impl GasParameterUpdater {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        ledger: Arc<dyn LedgerClient>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            ledger,
            request_timeout,
        }
    }

    /// One transaction per destination; each outcome is independent.
    pub async fn run_once(&self) -> Result<Vec<GasUpdateReport>> {
        let relay = self.registry.relay()?;
        let contract = format!("{}::{}", relay.package, GAS_MODULE);

        let mut reports = Vec::with_capacity(relay.wormhole_gas.len());
        for (network, gas) in &relay.wormhole_gas {
            info!(
                network = %network,
                base_gas = gas.base_gas,
                per_byte_gas = gas.per_byte_gas,
                "setting wormhole gas"
            );
            let outcome = self.push(&relay.network, &contract, network, gas).await;
            if let Err(e) = &outcome {
                warn!(network = %network, error = %e, "wormhole gas update failed");
            }
            reports.push(GasUpdateReport {
                network: network.clone(),
                dst_chain_id: gas.dst_chainid,
                outcome,
            });
        }
        Ok(reports)
    }

    async fn push(
        &self,
        home_network: &str,
        contract: &str,
        dst_network: &str,
        gas: &WormholeGasEntry,
    ) -> Result<TxReceipt> {
        let base_gas = encode_u256_param(&normalize_u256(gas.base_gas).to_string())?;
        let per_byte_gas = encode_u256_param(&normalize_u256(gas.per_byte_gas).to_string())?;
        debug!(
            base_gas = %bytes_to_hex(&base_gas),
            per_byte_gas = %bytes_to_hex(&per_byte_gas),
            "encoded gas parameters"
        );

        let call = ContractCall::new(
            contract,
            SET_WORMHOLE_GAS,
            vec![
                Field::uint(gas.dst_chainid as u64),
                Field::Bytes(base_gas.into()),
                Field::Bytes(per_byte_gas.into()),
            ],
        );
        with_timeout(
            self.request_timeout,
            self.ledger.call(home_network, &call),
            |reason| OmniswapError::TransactionSubmission {
                network: home_network.to_string(),
                operation: format!("{} for {}", SET_WORMHOLE_GAS, dst_network),
                reason,
            },
        )
        .await
    }
}
