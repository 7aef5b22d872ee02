//! Destination chains served by the relay fee oracle.

use std::fmt;
use std::str::FromStr;

use omniswap_types::OmniswapError;

/// Destination chains whose relay fee is priced against the home asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DstChain {
    Ethereum,
    Bsc,
    Polygon,
    Avalanche,
}

impl DstChain {
    pub const ALL: [DstChain; 4] = [
        DstChain::Ethereum,
        DstChain::Bsc,
        DstChain::Polygon,
        DstChain::Avalanche,
    ];

    /// Chain id in the wormhole messaging protocol's numbering.
    pub fn wormhole_chain_id(&self) -> u16 {
        match self {
            DstChain::Ethereum => 2,
            DstChain::Bsc => 4,
            DstChain::Polygon => 5,
            DstChain::Avalanche => 6,
        }
    }

    /// Exchange symbol of the chain's native asset.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            DstChain::Ethereum => "ETH",
            DstChain::Bsc => "BNB",
            DstChain::Polygon => "MATIC",
            DstChain::Avalanche => "AVAX",
        }
    }

    pub fn network_name(&self) -> &'static str {
        match self {
            DstChain::Ethereum => "mainnet",
            DstChain::Bsc => "bsc-main",
            DstChain::Polygon => "polygon-main",
            DstChain::Avalanche => "avax-main",
        }
    }
}

impl FromStr for DstChain {
    type Err = OmniswapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DstChain::ALL
            .into_iter()
            .find(|c| c.network_name() == s)
            .ok_or_else(|| OmniswapError::UnknownNetwork(s.to_string()))
    }
}

impl fmt::Display for DstChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.network_name())
    }
}
