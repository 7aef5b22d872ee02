//! Ledger client trait and implementations for the OmniSwap relayer.
//!
//! Defines the `LedgerClient` trait that chain backends must implement.
//! Provides a `MemoryLedger` for testing.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use omniswap_types::{Field, Hex, OmniswapError, Result};

pub mod memory;

pub use memory::MemoryLedger;

/// A contract function invocation with positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract address, or module path on Move chains
    pub contract: String,
    pub function: String,
    pub args: Vec<Field>,
    /// Native asset attached to the call
    pub value: U256,
}

impl ContractCall {
    pub fn new(contract: impl Into<String>, function: impl Into<String>, args: Vec<Field>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            args,
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Receipt of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub network: String,
    pub tx_hash: Hex,
}

/// The chain access the relayer core needs.
///
/// Implementations encode `ContractCall` arguments with the target chain's
/// ABI, sign with the relayer account and wait for inclusion.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submit a state-changing call and wait for its receipt.
    async fn call(&self, network: &str, call: &ContractCall) -> Result<TxReceipt>;

    /// Execute `call` without committing it, as `sender`, and return the gas used.
    async fn simulate(&self, network: &str, call: &ContractCall, sender: &str) -> Result<u64>;

    /// Read an on-chain resource stored under `address`.
    async fn read_resource(
        &self,
        network: &str,
        address: &str,
        resource_type: &str,
    ) -> Result<serde_json::Value>;
}

/// Await `fut`, turning expiry of `limit` into the error built by `on_timeout`.
pub async fn with_timeout<T, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(String) -> OmniswapError,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!("timed out after {:?}", limit))),
    }
}
