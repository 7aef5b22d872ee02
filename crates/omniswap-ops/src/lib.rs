//! Cross-chain swap orchestration: optional source swap, Stargate bridge,
//! optional destination swap.
//!
//! Each scenario is prepared from the registry (no ledger traffic besides an
//! optional gas simulation), then submitted as an approval plus the bridge
//! call. Scenarios never abort each other.

pub mod estimator;
pub mod scenario;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use omniswap_descriptor::{
    approve_args, so_swap_via_stargate_args, DeadlinePolicy, SoData, StargateData, SwapData,
    SwapFunction, APPROVE, SO_SWAP_VIA_STARGATE,
};
use omniswap_ledger::{with_timeout, ContractCall, LedgerClient, TxReceipt};
use omniswap_registry::{NetworkRegistry, TokenName};
use omniswap_types::{OmniswapError, Result};
use tracing::{error, info, warn};

pub use estimator::{with_headroom, GasBudgetEstimator};
pub use scenario::{default_scenarios, DstGasPolicy, ScenarioSpec};

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Recipient on the destination chain
    pub receiver: Address,
    pub deadline: DeadlinePolicy,
    pub request_timeout: Duration,
}

impl OrchestratorConfig {
    pub fn new(receiver: Address) -> Self {
        Self {
            receiver,
            deadline: DeadlinePolicy::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A scenario turned into ledger calls, ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedSwap {
    pub scenario: String,
    pub so_data: SoData,
    pub src_swaps: Vec<SwapData>,
    pub stargate: StargateData,
    pub dst_swaps: Vec<SwapData>,
    /// Native value attached to the bridge call
    pub value: U256,
    /// Token approval for the source `SoDiamond`, absent for native input
    pub approval: Option<ContractCall>,
    pub bridge_call: ContractCall,
}

/// Receipts of one submitted scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegReceipts {
    pub approval: Option<TxReceipt>,
    pub bridge: TxReceipt,
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct LegReport {
    pub scenario: String,
    pub src_network: String,
    pub dst_network: String,
    pub outcome: Result<LegReceipts>,
}

/// Runs swap scenarios from one source network to one destination network.
pub struct SwapOrchestrator {
    registry: Arc<NetworkRegistry>,
    ledger: Arc<dyn LedgerClient>,
    estimator: GasBudgetEstimator,
    config: OrchestratorConfig,
}

impl SwapOrchestrator {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        ledger: Arc<dyn LedgerClient>,
        config: OrchestratorConfig,
    ) -> Self {
        let estimator =
            GasBudgetEstimator::new(registry.clone(), ledger.clone(), config.request_timeout);
        Self {
            registry,
            ledger,
            estimator,
            config,
        }
    }

    /// Build the descriptors and calls for `scenario`.
    pub async fn prepare(
        &self,
        src_net: &str,
        dst_net: &str,
        scenario: &ScenarioSpec,
    ) -> Result<PreparedSwap> {
        let src = self.registry.network(src_net)?;
        let deadline = self.config.deadline.deadline_now();

        let so_data = SoData::create(
            &self.registry,
            self.config.receiver,
            src_net,
            dst_net,
            scenario.amount,
            scenario.asset_in,
            scenario.asset_out,
        )?;

        let mut src_swaps = Vec::new();
        if scenario.needs_src_swap() {
            src_swaps.push(SwapData::create(
                &self.registry,
                src_net,
                SwapFunction::ExactNativeForTokens,
                scenario.amount,
                TokenName::Eth,
                TokenName::Usdc,
                deadline,
            )?);
        }

        let mut dst_swaps = Vec::new();
        if scenario.needs_dst_swap() {
            dst_swaps.push(SwapData::destination_placeholder(
                &self.registry,
                dst_net,
                SwapFunction::ExactTokensForNative,
                TokenName::Usdc,
                TokenName::Eth,
                deadline,
            )?);
        }

        let dst_gas = match scenario.dst_gas {
            DstGasPolicy::Fixed(gas) => gas,
            DstGasPolicy::Estimated { headroom_bps } => {
                let gas = self
                    .estimator
                    .estimate_dst_gas(src_net, dst_net, &so_data, &dst_swaps)
                    .await?;
                with_headroom(gas, headroom_bps)
            }
        };
        let stargate = StargateData::create(&self.registry, src_net, dst_net, dst_gas)?;

        let value = scenario.call_value();
        let approval = if scenario.asset_in.is_native() {
            None
        } else {
            let token = self.registry.resolve_asset(src_net, scenario.asset_in)?;
            Some(ContractCall::new(
                token.to_string(),
                APPROVE,
                approve_args(src.so_diamond, scenario.amount),
            ))
        };
        let bridge_call = ContractCall::new(
            src.so_diamond.to_string(),
            SO_SWAP_VIA_STARGATE,
            so_swap_via_stargate_args(&so_data, &src_swaps, &stargate, &dst_swaps),
        )
        .with_value(value);

        Ok(PreparedSwap {
            scenario: scenario.name.clone(),
            so_data,
            src_swaps,
            stargate,
            dst_swaps,
            value,
            approval,
            bridge_call,
        })
    }

    /// Submit a prepared scenario: approval first, then the bridge call.
    ///
    /// A failed approval leaves the bridge call unsent.
    pub async fn submit(&self, src_net: &str, prepared: &PreparedSwap) -> Result<LegReceipts> {
        let approval = match &prepared.approval {
            Some(call) => Some(self.send(src_net, &prepared.scenario, call).await?),
            None => None,
        };
        let bridge = self
            .send(src_net, &prepared.scenario, &prepared.bridge_call)
            .await?;
        Ok(LegReceipts { approval, bridge })
    }

    /// Prepare and submit a single scenario.
    pub async fn execute(
        &self,
        src_net: &str,
        dst_net: &str,
        scenario: &ScenarioSpec,
    ) -> Result<LegReceipts> {
        let prepared = self.prepare(src_net, dst_net, scenario).await?;
        info!(
            scenario = %prepared.scenario,
            src = src_net,
            dst = dst_net,
            src_swaps = prepared.src_swaps.len(),
            dst_swaps = prepared.dst_swaps.len(),
            dst_gas = prepared.stargate.dst_gas_for_sg_receive,
            value = %prepared.value,
            "submitting cross-chain swap"
        );
        self.submit(src_net, &prepared).await
    }

    /// Run every scenario in order and report each one.
    pub async fn run(
        &self,
        src_net: &str,
        dst_net: &str,
        scenarios: &[ScenarioSpec],
    ) -> Vec<LegReport> {
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let outcome = self.execute(src_net, dst_net, scenario).await;
            match &outcome {
                Ok(receipts) => info!(
                    scenario = %scenario.name,
                    tx_hash = %receipts.bridge.tx_hash,
                    "cross-chain swap submitted"
                ),
                Err(e) if e.is_validation() => {
                    error!(scenario = %scenario.name, error = %e, "invalid scenario")
                }
                Err(e) => warn!(scenario = %scenario.name, error = %e, "cross-chain swap failed"),
            }
            reports.push(LegReport {
                scenario: scenario.name.clone(),
                src_network: src_net.to_string(),
                dst_network: dst_net.to_string(),
                outcome,
            });
        }
        reports
    }

    async fn send(&self, network: &str, scenario: &str, call: &ContractCall) -> Result<TxReceipt> {
        with_timeout(
            self.config.request_timeout,
            self.ledger.call(network, call),
            |reason| OmniswapError::TransactionSubmission {
                network: network.to_string(),
                operation: format!("{} ({})", call.function, scenario),
                reason,
            },
        )
        .await
    }
}
