use alloy::primitives::{Address, Bytes, B256, U256};
use rand::RngCore;
use thiserror::Error;

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// OmniSwap relayer error types.
#[derive(Debug, Error)]
pub enum OmniswapError {
    #[error("unknown asset {token} on network {network}")]
    UnknownAsset { network: String, token: String },

    #[error("unsupported swap function: {0}")]
    UnsupportedSwapFunction(String),

    #[error("unsupported token: {0}")]
    UnsupportedToken(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("price feed unavailable for {pair}: {reason}")]
    PriceFeedUnavailable { pair: String, reason: String },

    #[error("chain read failed on {network} ({operation}): {reason}")]
    ChainRead {
        network: String,
        operation: String,
        reason: String,
    },

    #[error("transaction submission failed on {network} ({operation}): {reason}")]
    TransactionSubmission {
        network: String,
        operation: String,
        reason: String,
    },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl OmniswapError {
    /// True for input validation errors, which are raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OmniswapError::UnknownAsset { .. }
                | OmniswapError::UnsupportedSwapFunction(_)
                | OmniswapError::UnsupportedToken(_)
                | OmniswapError::UnknownNetwork(_)
                | OmniswapError::InvalidDescriptor(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OmniswapError>;

/// One positional argument of a contract call.
///
/// Descriptors flatten into nested `Field`s in exactly the order the
/// receiving contract's function signature declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Address(Address),
    Bytes32(B256),
    Uint(U256),
    Bytes(Bytes),
    /// A struct argument, members in declaration order.
    Tuple(Vec<Field>),
    /// A dynamic array argument.
    Array(Vec<Field>),
}

impl Field {
    pub fn uint(value: impl Into<u128>) -> Self {
        Field::Uint(U256::from(value.into()))
    }

    /// Members of a tuple or array field, empty for scalars.
    pub fn members(&self) -> &[Field] {
        match self {
            Field::Tuple(items) | Field::Array(items) => items,
            _ => &[],
        }
    }
}

/// Generate a random 32-byte identifier.
pub fn generate_random_bytes32() -> B256 {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    B256::from(bytes)
}

/// Parse a hex string to a big-endian byte array.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| OmniswapError::InvalidHex(e.to_string()))
}

/// Convert bytes to a 0x-prefixed hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> Hex {
    format!("0x{}", hex::encode(bytes))
}
