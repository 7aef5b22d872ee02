//! Chain-agnostic descriptors of a cross-chain swap.
//!
//! - `SoData`: the logical transfer
//! - `StargateData`: relay-layer routing
//! - `SwapData`: DEX legs on either side
//!
//! Every descriptor flattens to the exact positional field order of the
//! receiving contract. The receive payload and router calls are ABI-encoded
//! here since they travel as opaque bytes.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;
use omniswap_types::Field;

pub mod abi;
pub mod so_data;
pub mod stargate;
pub mod swap;

pub use so_data::SoData;
pub use stargate::StargateData;
pub use swap::{DeadlinePolicy, SwapData, SwapFunction};

/// Bridge entry point receiving the four descriptor groups.
pub const SO_SWAP_VIA_STARGATE: &str = "soSwapViaStargate";

/// ERC-20 allowance grant issued before a token-funded bridge call.
pub const APPROVE: &str = "approve";

/// Destination-side Stargate callback.
pub const SG_RECEIVE: &str = "sgReceive";

/// Positional arguments of `soSwapViaStargate`:
/// `(SoData, SwapData[] src, StargateData, SwapData[] dst)`.
pub fn so_swap_via_stargate_args(
    so_data: &SoData,
    src_swaps: &[SwapData],
    stargate: &StargateData,
    dst_swaps: &[SwapData],
) -> Vec<Field> {
    vec![
        Field::Tuple(so_data.to_ordered_fields()),
        swap_array(src_swaps),
        Field::Tuple(stargate.to_ordered_fields()),
        swap_array(dst_swaps),
    ]
}

fn swap_array(swaps: &[SwapData]) -> Field {
    Field::Array(
        swaps
            .iter()
            .map(|s| Field::Tuple(s.to_ordered_fields()))
            .collect(),
    )
}

/// Positional arguments of `approve(spender, amount)`.
pub fn approve_args(spender: Address, amount: U256) -> Vec<Field> {
    vec![Field::Address(spender), Field::Uint(amount)]
}

/// Payload delivered to `sgReceive`: `abi.encode(soData, swapDataDst)`.
pub fn encode_receive_payload(so_data: &SoData, dst_swaps: &[SwapData]) -> Bytes {
    let swaps: Vec<abi::SwapData> = dst_swaps.iter().map(SwapData::to_sol).collect();
    (so_data.to_sol(), swaps).abi_encode_params().into()
}

/// Arguments of a simulated `sgReceive` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgReceiveArgs {
    pub src_stargate_chain_id: u16,
    pub src_address: Address,
    pub nonce: U256,
    pub token: Address,
    pub amount_ld: U256,
    pub payload: Bytes,
}

impl SgReceiveArgs {
    pub fn to_ordered_fields(&self) -> Vec<Field> {
        vec![
            Field::uint(self.src_stargate_chain_id as u64),
            Field::Bytes(Bytes::copy_from_slice(self.src_address.as_slice())),
            Field::Uint(self.nonce),
            Field::Address(self.token),
            Field::Uint(self.amount_ld),
            Field::Bytes(self.payload.clone()),
        ]
    }
}
