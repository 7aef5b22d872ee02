//! Supported token names and router dialects.

use std::fmt;
use std::str::FromStr;

use omniswap_types::OmniswapError;
use serde::Deserialize;

/// Tokens the relayer knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenName {
    /// The chain's native asset, always the zero address.
    Eth,
    Usdc,
}

impl TokenName {
    pub fn is_native(&self) -> bool {
        matches!(self, TokenName::Eth)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenName::Eth => "eth",
            TokenName::Usdc => "usdc",
        }
    }
}

impl FromStr for TokenName {
    type Err = OmniswapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eth" => Ok(TokenName::Eth),
            "usdc" => Ok(TokenName::Usdc),
            other => Err(OmniswapError::UnsupportedToken(other.to_string())),
        }
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming used by a network's UniswapV2-style router for native-asset entry points.
///
/// Avalanche forks rename `ETH` to `AVAX` (`swapExactAVAXForTokens`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterDialect {
    #[default]
    Eth,
    Avax,
}

impl RouterDialect {
    pub fn native_symbol(&self) -> &'static str {
        match self {
            RouterDialect::Eth => "ETH",
            RouterDialect::Avax => "AVAX",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_names() {
        assert_eq!("eth".parse::<TokenName>().unwrap(), TokenName::Eth);
        assert_eq!("usdc".parse::<TokenName>().unwrap(), TokenName::Usdc);
        assert!(TokenName::Eth.is_native());
        assert!(!TokenName::Usdc.is_native());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let err = "dai".parse::<TokenName>().unwrap_err();
        assert!(matches!(err, OmniswapError::UnsupportedToken(ref t) if t == "dai"));
    }
}
