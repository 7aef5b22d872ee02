//! Cross-chain swap scenarios.

use alloy::primitives::U256;
use omniswap_registry::TokenName;

/// 100 USDC with 6 decimals.
pub const USDC_AMOUNT: u64 = 100_000_000;
/// Native amount in wei.
pub const NATIVE_AMOUNT: u64 = 200_000_000;
/// 0.01 native in wei.
pub const RELAY_FEE: u64 = 10_000_000_000_000_000;
/// 0.02 native in wei, paid when a source swap precedes the bridge.
pub const RELAY_FEE_WITH_SWAP: u64 = 20_000_000_000_000_000;

/// How the destination gas budget is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstGasPolicy {
    /// A fixed amount of gas.
    Fixed(u64),
    /// Simulate `sgReceive` and add `headroom_bps` basis points.
    Estimated { headroom_bps: u32 },
}

/// One cross-chain transfer to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    pub name: String,
    pub asset_in: TokenName,
    pub asset_out: TokenName,
    /// Input amount in the input asset's smallest unit
    pub amount: U256,
    /// Bridge fee attached as native value
    pub relay_fee: U256,
    pub dst_gas: DstGasPolicy,
}

impl ScenarioSpec {
    pub fn new(
        asset_in: TokenName,
        asset_out: TokenName,
        amount: impl Into<u128>,
        relay_fee: impl Into<u128>,
        dst_gas: DstGasPolicy,
    ) -> Self {
        Self {
            name: format!("{}->{}", asset_in, asset_out),
            asset_in,
            asset_out,
            amount: U256::from(amount.into()),
            relay_fee: U256::from(relay_fee.into()),
            dst_gas,
        }
    }

    /// Native input is swapped to the bridged token on the source chain.
    pub fn needs_src_swap(&self) -> bool {
        self.asset_in.is_native()
    }

    /// The bridged token is swapped to native on the destination chain.
    pub fn needs_dst_swap(&self) -> bool {
        self.asset_out.is_native()
    }

    /// Native value attached to the bridge call.
    pub fn call_value(&self) -> U256 {
        if self.asset_in.is_native() {
            self.relay_fee.saturating_add(self.amount)
        } else {
            self.relay_fee
        }
    }
}

/// The four asset combinations over a USDC pool.
pub fn default_scenarios() -> Vec<ScenarioSpec> {
    use TokenName::{Eth, Usdc};
    vec![
        ScenarioSpec::new(Usdc, Usdc, USDC_AMOUNT, RELAY_FEE, DstGasPolicy::Fixed(100_000)),
        ScenarioSpec::new(
            Eth,
            Usdc,
            NATIVE_AMOUNT,
            RELAY_FEE_WITH_SWAP,
            DstGasPolicy::Fixed(600_000),
        ),
        ScenarioSpec::new(Usdc, Eth, USDC_AMOUNT, RELAY_FEE, DstGasPolicy::Fixed(600_000)),
        ScenarioSpec::new(Eth, Eth, NATIVE_AMOUNT, RELAY_FEE, DstGasPolicy::Fixed(300_000)),
    ]
}
