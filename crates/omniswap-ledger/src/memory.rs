//! In-memory ledger for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::*;

/// A call recorded by [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub network: String,
    pub call: ContractCall,
}

/// In-memory ledger (for testing and dry runs).
///
/// Accepts every call unless its function was marked failing, answers
/// simulations with a fixed gas figure and serves resources from a map.
pub struct MemoryLedger {
    submitted: Mutex<Vec<RecordedCall>>,
    simulated: Mutex<Vec<(RecordedCall, String)>>,
    resources: Mutex<HashMap<(String, String, String), serde_json::Value>>,
    failing: Mutex<HashSet<String>>,
    failing_args: Mutex<Vec<(String, Field)>>,
    simulated_gas: Mutex<u64>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            simulated: Mutex::new(Vec::new()),
            resources: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            failing_args: Mutex::new(Vec::new()),
            simulated_gas: Mutex::new(0),
            latency: Mutex::new(None),
        }
    }

    /// Store a resource returned by `read_resource`.
    pub fn set_resource(
        &self,
        network: &str,
        address: &str,
        resource_type: &str,
        value: serde_json::Value,
    ) {
        let mut resources = self.resources.lock().unwrap();
        resources.insert(
            (network.to_string(), address.to_string(), resource_type.to_string()),
            value,
        );
    }

    /// Make every call and simulation of `function` fail.
    pub fn fail_function(&self, function: &str) {
        self.failing.lock().unwrap().insert(function.to_string());
    }

    /// Make calls of `function` fail when one of their arguments equals `arg`.
    pub fn fail_call_with_arg(&self, function: &str, arg: Field) {
        self.failing_args
            .lock()
            .unwrap()
            .push((function.to_string(), arg));
    }

    pub fn set_simulated_gas(&self, gas: u64) {
        *self.simulated_gas.lock().unwrap() = gas;
    }

    /// Delay every request by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn submitted(&self) -> Vec<RecordedCall> {
        self.submitted.lock().unwrap().clone()
    }

    /// Simulated calls with the sender they ran as.
    pub fn simulated(&self) -> Vec<(RecordedCall, String)> {
        self.simulated.lock().unwrap().clone()
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn is_failing(&self, call: &ContractCall) -> bool {
        if self.failing.lock().unwrap().contains(&call.function) {
            return true;
        }
        self.failing_args
            .lock()
            .unwrap()
            .iter()
            .any(|(function, arg)| *function == call.function && call.args.contains(arg))
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn call(&self, network: &str, call: &ContractCall) -> Result<TxReceipt> {
        self.delay().await;
        if self.is_failing(call) {
            return Err(OmniswapError::TransactionSubmission {
                network: network.to_string(),
                operation: call.function.clone(),
                reason: "execution reverted".into(),
            });
        }

        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(RecordedCall {
            network: network.to_string(),
            call: call.clone(),
        });
        Ok(TxReceipt {
            network: network.to_string(),
            tx_hash: format!("0x{:064x}", submitted.len()),
        })
    }

    async fn simulate(&self, network: &str, call: &ContractCall, sender: &str) -> Result<u64> {
        self.delay().await;
        if self.is_failing(call) {
            return Err(OmniswapError::TransactionSubmission {
                network: network.to_string(),
                operation: format!("simulate {}", call.function),
                reason: "execution reverted".into(),
            });
        }

        self.simulated.lock().unwrap().push((
            RecordedCall {
                network: network.to_string(),
                call: call.clone(),
            },
            sender.to_string(),
        ));
        Ok(*self.simulated_gas.lock().unwrap())
    }

    async fn read_resource(
        &self,
        network: &str,
        address: &str,
        resource_type: &str,
    ) -> Result<serde_json::Value> {
        self.delay().await;
        let resources = self.resources.lock().unwrap();
        resources
            .get(&(network.to_string(), address.to_string(), resource_type.to_string()))
            .cloned()
            .ok_or_else(|| OmniswapError::ChainRead {
                network: network.to_string(),
                operation: format!("read {} at {}", resource_type, address),
                reason: "resource not found".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let ledger = MemoryLedger::new();
        let first = ledger
            .call("rinkeby", &ContractCall::new("0x01", "approve", vec![]))
            .await
            .unwrap();
        let second = ledger
            .call("rinkeby", &ContractCall::new("0x02", "soSwapViaStargate", vec![]))
            .await
            .unwrap();

        assert_ne!(first.tx_hash, second.tx_hash);
        let calls = ledger.submitted();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call.function, "approve");
        assert_eq!(calls[1].call.contract, "0x02");
    }

    #[tokio::test]
    async fn test_failing_function() {
        let ledger = MemoryLedger::new();
        ledger.fail_function("approve");
        let err = ledger
            .call("rinkeby", &ContractCall::new("0x01", "approve", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, OmniswapError::TransactionSubmission { .. }));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_failing_argument() {
        let ledger = MemoryLedger::new();
        ledger.fail_call_with_arg("set_price_ratio", Field::uint(4u64));

        let bsc = ContractCall::new("0x1::fee", "set_price_ratio", vec![Field::uint(4u64)]);
        let eth = ContractCall::new("0x1::fee", "set_price_ratio", vec![Field::uint(2u64)]);
        let other = ContractCall::new("0x1::fee", "set_wormhole_gas", vec![Field::uint(4u64)]);

        assert!(ledger.call("aptos", &bsc).await.is_err());
        assert!(ledger.call("aptos", &eth).await.is_ok());
        assert!(ledger.call("aptos", &other).await.is_ok());
        assert_eq!(ledger.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_resources_and_simulation() {
        let ledger = MemoryLedger::new();
        ledger.set_resource("aptos", "0xaa", "PriceManager", json!({"ratio": "1"}));
        ledger.set_simulated_gas(123_456);

        let value = ledger.read_resource("aptos", "0xaa", "PriceManager").await.unwrap();
        assert_eq!(value["ratio"], "1");
        assert!(matches!(
            ledger.read_resource("aptos", "0xbb", "PriceManager").await,
            Err(OmniswapError::ChainRead { .. })
        ));

        let gas = ledger
            .simulate("fuji", &ContractCall::new("0x03", "sgReceive", vec![]), "0xrelayer")
            .await
            .unwrap();
        assert_eq!(gas, 123_456);
        assert_eq!(ledger.simulated()[0].1, "0xrelayer");
    }
}
