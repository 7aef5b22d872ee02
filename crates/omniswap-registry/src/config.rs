//! On-disk registry file format.
//!
//! Everything here is deserialized as plain strings and numbers; conversion
//! into typed addresses happens in [`crate::NetworkRegistry::from_file_config`].

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::token::RouterDialect;

/// Top level of the registry TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryFile {
    /// EVM networks the bridge is deployed on, keyed by network name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkEntry>,

    /// Home network hosting the fee modules
    pub relay: Option<RelayEntry>,
}

/// Per-network deployment parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
    /// Bridge protocol chain id
    pub chainid: u16,

    /// Stargate chain id
    pub stargate_chainid: u16,

    /// Stargate pool id of the bridged token
    pub stargate_poolid: u64,

    /// USDC token address, absent where USDC is not deployed
    pub usdc: Option<String>,

    /// Wrapped native token address
    pub weth: String,

    /// UniswapV2-style router address
    pub router: String,

    /// Native-asset naming of the router's entry points
    #[serde(default)]
    pub router_dialect: RouterDialect,

    /// Deployed SoDiamond address
    pub so_diamond: String,

    /// Account holding the relay role, used for simulations
    pub relayer: Option<String>,
}

/// Home network parameters for the fee oracle and gas updater.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayEntry {
    /// Home network name
    pub network: String,

    /// Account that published the fee modules
    pub package: String,

    /// Exchange symbol of the home asset
    #[serde(default = "default_home_symbol")]
    pub home_symbol: String,

    /// Relay gas parameters per destination network
    #[serde(default)]
    pub wormhole_gas: BTreeMap<String, WormholeGasEntry>,

    /// PriceManager resource account per destination network
    #[serde(default)]
    pub price_resources: BTreeMap<String, String>,
}

fn default_home_symbol() -> String {
    "APT".to_string()
}

/// Relay gas charged for one destination network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WormholeGasEntry {
    /// Wormhole chain id of the destination
    pub dst_chainid: u16,

    /// Fixed gas per relayed message
    pub base_gas: u64,

    /// Gas per payload byte
    pub per_byte_gas: u64,
}
