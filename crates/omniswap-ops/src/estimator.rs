//! Destination gas budget from a simulated `sgReceive`.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use omniswap_descriptor::{encode_receive_payload, SgReceiveArgs, SoData, SwapData, SG_RECEIVE};
use omniswap_ledger::{with_timeout, ContractCall, LedgerClient};
use omniswap_registry::{NetworkRegistry, TokenName};
use omniswap_types::{OmniswapError, Result};
use tracing::debug;

/// Bridged amount used for the simulated callback (10 USDC).
pub const SIMULATED_AMOUNT_LD: u64 = 10_000_000;

/// Add `headroom_bps` basis points on top of a simulated gas figure.
pub fn with_headroom(gas: u64, headroom_bps: u32) -> u64 {
    let extra = (gas as u128 * headroom_bps as u128).div_ceil(10_000);
    gas.saturating_add(extra.min(u64::MAX as u128) as u64)
}

pub struct GasBudgetEstimator {
    registry: Arc<NetworkRegistry>,
    ledger: Arc<dyn LedgerClient>,
    request_timeout: Duration,
}

impl GasBudgetEstimator {
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

    /// Gas consumed by the destination receive callback for this transfer.
    ///
    /// The figure is observed for one input only; callers add headroom.
    pub async fn estimate_dst_gas(
        &self,
        src_net: &str,
        dst_net: &str,
        so_data: &SoData,
        dst_swaps: &[SwapData],
    ) -> Result<u64> {
        let src = self.registry.network(src_net)?;
        let dst = self.registry.network(dst_net)?;
        let relayer = dst.relayer.ok_or_else(|| {
            OmniswapError::Config(format!("no relayer account configured for {}", dst_net))
        })?;

        let args = SgReceiveArgs {
            src_stargate_chain_id: src.stargate_chain_id,
            src_address: dst.so_diamond,
            nonce: U256::ZERO,
            token: self.registry.resolve_asset(dst_net, TokenName::Usdc)?,
            amount_ld: U256::from(SIMULATED_AMOUNT_LD),
            payload: encode_receive_payload(so_data, dst_swaps),
        };
        let call = ContractCall::new(dst.so_diamond.to_string(), SG_RECEIVE, args.to_ordered_fields());

        let gas = with_timeout(
            self.request_timeout,
            self.ledger.simulate(dst_net, &call, &relayer.to_string()),
            |reason| OmniswapError::TransactionSubmission {
                network: dst_net.to_string(),
                operation: format!("simulate {}", SG_RECEIVE),
                reason,
            },
        )
        .await?;

        debug!(src = src_net, dst = dst_net, gas, "estimated destination gas");
        Ok(gas)
    }
}
