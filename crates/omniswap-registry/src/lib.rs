//! Read-only network registry for the OmniSwap relayer.
//!
//! Holds per-network deployment parameters (chain ids, Stargate pools, token
//! and contract addresses) and the home-network relay fee configuration.
//! Built once from a TOML file and injected into every component.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Address;
use omniswap_types::{hex_to_bytes, OmniswapError, Result};
use tracing::debug;

pub mod chain;
pub mod config;
pub mod token;

pub use chain::DstChain;
pub use config::{RegistryFile, WormholeGasEntry};
pub use token::{RouterDialect, TokenName};

/// Contracts the relayer addresses by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractName {
    SoDiamond,
    Router,
    Usdc,
    WrappedNative,
}

/// Typed deployment parameters of one bridge network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u16,
    pub stargate_chain_id: u16,
    pub stargate_pool_id: u64,
    pub usdc: Option<Address>,
    pub weth: Address,
    pub router: Address,
    pub router_dialect: RouterDialect,
    pub so_diamond: Address,
    pub relayer: Option<Address>,
}

/// Home network hosting the fee modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub network: String,
    pub package: String,
    pub home_symbol: String,
    pub wormhole_gas: BTreeMap<String, WormholeGasEntry>,
    pub price_resources: BTreeMap<DstChain, String>,
}

impl RelayConfig {
    /// Fully qualified entry function or resource path inside the fee package.
    pub fn module_path(&self, module: &str, member: &str) -> String {
        format!("{}::{}::{}", self.package, module, member)
    }
}

/// Immutable registry of every configured network.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkConfig>,
    relay: Option<RelayConfig>,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkConfig>, relay: Option<RelayConfig>) -> Self {
        Self {
            networks: networks.into_iter().map(|n| (n.name.clone(), n)).collect(),
            relay,
        }
    }

    /// Parse a registry from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(text).map_err(|e| OmniswapError::Config(e.to_string()))?;
        Self::from_file_config(file)
    }

    /// Load a registry from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            OmniswapError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Convert the raw file format into typed configuration.
    pub fn from_file_config(file: RegistryFile) -> Result<Self> {
        let mut networks = Vec::with_capacity(file.networks.len());
        for (name, entry) in file.networks {
            let field = |key: &str| format!("networks.{}.{}", name, key);
            networks.push(NetworkConfig {
                chain_id: entry.chainid,
                stargate_chain_id: entry.stargate_chainid,
                stargate_pool_id: entry.stargate_poolid,
                usdc: entry
                    .usdc
                    .as_deref()
                    .map(|a| parse_address(a, &field("usdc")))
                    .transpose()?,
                weth: parse_address(&entry.weth, &field("weth"))?,
                router: parse_address(&entry.router, &field("router"))?,
                router_dialect: entry.router_dialect,
                so_diamond: parse_address(&entry.so_diamond, &field("so_diamond"))?,
                relayer: entry
                    .relayer
                    .as_deref()
                    .map(|a| parse_address(a, &field("relayer")))
                    .transpose()?,
                name,
            });
        }

        let relay = file
            .relay
            .map(|entry| -> Result<RelayConfig> {
                check_account(&entry.package, "relay.package")?;
                let mut price_resources = BTreeMap::new();
                for (net, address) in entry.price_resources {
                    check_account(&address, &format!("relay.price_resources.{}", net))?;
                    price_resources.insert(DstChain::from_str(&net)?, address);
                }
                Ok(RelayConfig {
                    network: entry.network,
                    package: entry.package,
                    home_symbol: entry.home_symbol,
                    wormhole_gas: entry.wormhole_gas,
                    price_resources,
                })
            })
            .transpose()?;

        debug!(networks = networks.len(), has_relay = relay.is_some(), "loaded network registry");
        Ok(Self::new(networks, relay))
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks
            .get(name)
            .ok_or_else(|| OmniswapError::UnknownNetwork(name.to_string()))
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values()
    }

    pub fn relay(&self) -> Result<&RelayConfig> {
        self.relay
            .as_ref()
            .ok_or_else(|| OmniswapError::Config("no relay network configured".into()))
    }

    /// Resolve a token name to its address on `network`.
    ///
    /// The native asset is the zero address on every network, configured or not.
    pub fn resolve_asset(&self, network: &str, token: TokenName) -> Result<Address> {
        match token {
            TokenName::Eth => Ok(Address::ZERO),
            TokenName::Usdc => self
                .networks
                .get(network)
                .and_then(|n| n.usdc)
                .ok_or_else(|| OmniswapError::UnknownAsset {
                    network: network.to_string(),
                    token: token.to_string(),
                }),
        }
    }

    pub fn contract_address(&self, network: &str, contract: ContractName) -> Result<Address> {
        let net = self.network(network)?;
        match contract {
            ContractName::SoDiamond => Ok(net.so_diamond),
            ContractName::Router => Ok(net.router),
            ContractName::WrappedNative => Ok(net.weth),
            ContractName::Usdc => self.resolve_asset(network, TokenName::Usdc),
        }
    }
}

/// Home-network accounts are hex of at most 32 bytes; short forms such as
/// `0x1` are left-padded.
fn check_account(value: &str, field: &str) -> Result<()> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    let bytes = hex_to_bytes(&padded)
        .map_err(|e| OmniswapError::InvalidHex(format!("{}: {}", field, e)))?;
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(OmniswapError::Config(format!(
            "{}: account {} must be 1 to 32 bytes",
            field, value
        )));
    }
    Ok(())
}

fn parse_address(value: &str, field: &str) -> Result<Address> {
    Address::from_str(value)
        .map_err(|e| OmniswapError::Config(format!("{}: invalid address {}: {}", field, value, e)))
}
