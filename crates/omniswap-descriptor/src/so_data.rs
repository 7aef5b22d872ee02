//! Source-origin transfer record.

use alloy::primitives::{Address, B256, U256};
use omniswap_registry::{NetworkRegistry, TokenName};
use omniswap_types::{generate_random_bytes32, Field, OmniswapError, Result};

use crate::abi;

/// Identifies one logical cross-chain transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoData {
    /// Unique identification id
    pub transaction_id: B256,
    /// Token receiving account on the destination chain
    pub receiver: Address,
    /// Bridge protocol id of the source chain
    pub source_chain_id: u16,
    /// Starting token on the source chain, zero for native
    pub sending_asset_id: Address,
    /// Bridge protocol id of the destination chain
    pub destination_chain_id: u16,
    /// Final token on the destination chain, zero for native
    pub receiving_asset_id: Address,
    /// Amount in the sending asset's base units
    pub amount: U256,
}

impl SoData {
    pub const FIELD_COUNT: usize = 7;

    /// Build a transfer record with a fresh random transaction id.
    pub fn create(
        registry: &NetworkRegistry,
        receiver: Address,
        src_net: &str,
        dst_net: &str,
        amount: U256,
        sending_token: TokenName,
        receiving_token: TokenName,
    ) -> Result<Self> {
        if amount.is_zero() {
            return Err(OmniswapError::InvalidDescriptor(
                "transfer amount must be positive".into(),
            ));
        }

        let source_chain_id = registry.network(src_net)?.chain_id;
        let destination_chain_id = registry.network(dst_net)?.chain_id;
        if source_chain_id == destination_chain_id {
            return Err(OmniswapError::InvalidDescriptor(format!(
                "source and destination share chain id {}",
                source_chain_id
            )));
        }

        Ok(Self {
            transaction_id: generate_random_bytes32(),
            receiver,
            source_chain_id,
            sending_asset_id: registry.resolve_asset(src_net, sending_token)?,
            destination_chain_id,
            receiving_asset_id: registry.resolve_asset(dst_net, receiving_token)?,
            amount,
        })
    }

    /// Fields in the order of the on-chain struct.
    pub fn to_ordered_fields(&self) -> Vec<Field> {
        vec![
            Field::Bytes32(self.transaction_id),
            Field::Address(self.receiver),
            Field::uint(self.source_chain_id as u64),
            Field::Address(self.sending_asset_id),
            Field::uint(self.destination_chain_id as u64),
            Field::Address(self.receiving_asset_id),
            Field::Uint(self.amount),
        ]
    }

    pub(crate) fn to_sol(&self) -> abi::SoData {
        abi::SoData {
            transactionId: self.transaction_id,
            receiver: self.receiver,
            sourceChainId: self.source_chain_id,
            sendingAssetId: self.sending_asset_id,
            destinationChainId: self.destination_chain_id,
            receivingAssetId: self.receiving_asset_id,
            amount: self.amount,
        }
    }
}
