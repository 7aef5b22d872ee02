//! Stargate relay-layer routing parameters.

use alloy::primitives::{Address, U256};
use omniswap_registry::NetworkRegistry;
use omniswap_types::{Field, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StargateData {
    /// Stargate pool id on the source chain
    pub src_stargate_pool_id: u64,
    /// Destination chain id in Stargate's numbering
    pub dst_stargate_chain_id: u16,
    /// Stargate pool id on the destination chain
    pub dst_stargate_pool_id: u64,
    /// Minimum amount received on the destination
    pub min_amount: U256,
    /// Gas allowance for the destination `sgReceive` callback
    pub dst_gas_for_sg_receive: u64,
    /// SoDiamond receiving the relayed call
    pub dst_so_diamond: Address,
}

impl StargateData {
    pub const FIELD_COUNT: usize = 6;

    pub fn create(
        registry: &NetworkRegistry,
        src_net: &str,
        dst_net: &str,
        dst_gas_for_sg_receive: u64,
    ) -> Result<Self> {
        let src = registry.network(src_net)?;
        let dst = registry.network(dst_net)?;
        Ok(Self {
            src_stargate_pool_id: src.stargate_pool_id,
            dst_stargate_chain_id: dst.stargate_chain_id,
            dst_stargate_pool_id: dst.stargate_pool_id,
            min_amount: U256::ZERO,
            dst_gas_for_sg_receive,
            dst_so_diamond: dst.so_diamond,
        })
    }

    pub fn to_ordered_fields(&self) -> Vec<Field> {
        vec![
            Field::uint(self.src_stargate_pool_id),
            Field::uint(self.dst_stargate_chain_id as u64),
            Field::uint(self.dst_stargate_pool_id),
            Field::Uint(self.min_amount),
            Field::uint(self.dst_gas_for_sg_receive),
            Field::Address(self.dst_so_diamond),
        ]
    }
}
