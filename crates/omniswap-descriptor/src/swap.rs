//! DEX swap legs executed by the bridge before sending or after receiving.
//!
//! Router entry points are a closed set resolved once from their name; the
//! network's router dialect decides whether native variants are spelled
//! `ETH` or `AVAX` when the call is encoded.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use omniswap_registry::{NetworkRegistry, RouterDialect, TokenName};
use omniswap_types::{Field, OmniswapError, Result};

use crate::abi::{self, IUniswapV2Router02 as Router};

/// Supported UniswapV2 router entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapFunction {
    ExactNativeForTokens,
    NativeForExactTokens,
    ExactTokensForNative,
    TokensForExactNative,
    ExactTokensForTokens,
    TokensForExactTokens,
}

impl SwapFunction {
    pub fn is_native_in(&self) -> bool {
        matches!(
            self,
            SwapFunction::ExactNativeForTokens | SwapFunction::NativeForExactTokens
        )
    }

    pub fn is_native_out(&self) -> bool {
        matches!(
            self,
            SwapFunction::ExactTokensForNative | SwapFunction::TokensForExactNative
        )
    }

    pub fn is_exact_in(&self) -> bool {
        matches!(
            self,
            SwapFunction::ExactNativeForTokens
                | SwapFunction::ExactTokensForNative
                | SwapFunction::ExactTokensForTokens
        )
    }

    /// Router function name in the given dialect.
    pub fn name(&self, dialect: RouterDialect) -> String {
        let native = dialect.native_symbol();
        match self {
            SwapFunction::ExactNativeForTokens => format!("swapExact{}ForTokens", native),
            SwapFunction::NativeForExactTokens => format!("swap{}ForExactTokens", native),
            SwapFunction::ExactTokensForNative => format!("swapExactTokensFor{}", native),
            SwapFunction::TokensForExactNative => format!("swapTokensForExact{}", native),
            SwapFunction::ExactTokensForTokens => "swapExactTokensForTokens".to_string(),
            SwapFunction::TokensForExactTokens => "swapTokensForExactTokens".to_string(),
        }
    }

    fn check_assets(&self, sending: TokenName, receiving: TokenName) -> Result<()> {
        let ok = if self.is_native_in() {
            sending.is_native() && !receiving.is_native()
        } else if self.is_native_out() {
            !sending.is_native() && receiving.is_native()
        } else {
            !sending.is_native() && !receiving.is_native()
        };
        if ok {
            Ok(())
        } else {
            Err(OmniswapError::InvalidDescriptor(format!(
                "{:?} cannot swap {} for {}",
                self, sending, receiving
            )))
        }
    }
}

impl FromStr for SwapFunction {
    type Err = OmniswapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "swapExactETHForTokens" | "swapExactAVAXForTokens" => {
                Ok(SwapFunction::ExactNativeForTokens)
            }
            "swapETHForExactTokens" | "swapAVAXForExactTokens" => {
                Ok(SwapFunction::NativeForExactTokens)
            }
            "swapExactTokensForETH" | "swapExactTokensForAVAX" => {
                Ok(SwapFunction::ExactTokensForNative)
            }
            "swapTokensForExactETH" | "swapTokensForExactAVAX" => {
                Ok(SwapFunction::TokensForExactNative)
            }
            "swapExactTokensForTokens" => Ok(SwapFunction::ExactTokensForTokens),
            "swapTokensForExactTokens" => Ok(SwapFunction::TokensForExactTokens),
            other => Err(OmniswapError::UnsupportedSwapFunction(other.to_string())),
        }
    }
}

impl fmt::Display for SwapFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name(RouterDialect::Eth))
    }
}

/// Expiry window embedded into router calls.
///
/// Relaying adds latency between building the call and its execution on the
/// source chain, so the window must cover it; a longer window weakens the
/// sender's protection against stale execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub slack: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            slack: Duration::from_secs(3000),
        }
    }
}

impl DeadlinePolicy {
    pub fn new(slack: Duration) -> Self {
        Self { slack }
    }

    /// Deadline for a call submitted at `submitted_at` (unix seconds).
    pub fn deadline_at(&self, submitted_at: u64) -> u64 {
        submitted_at.saturating_add(self.slack.as_secs())
    }

    /// Deadline for a call submitted now.
    pub fn deadline_now(&self) -> u64 {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.deadline_at(now)
    }
}

/// A single on-chain swap leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapData {
    /// Router invoked by the bridge
    pub call_to: Address,
    /// Spender approved for the input token
    pub approve_to: Address,
    /// Input asset, zero for native
    pub sending_asset_id: Address,
    /// Output asset, zero for native
    pub receiving_asset_id: Address,
    /// Input amount
    pub from_amount: U256,
    /// Encoded router call
    pub call_data: Bytes,
}

impl SwapData {
    pub const FIELD_COUNT: usize = 6;

    /// Validate names, then build the swap leg.
    ///
    /// Name validation happens before anything else is looked up.
    pub fn create_by_name(
        registry: &NetworkRegistry,
        net: &str,
        swap_function: &str,
        from_amount: U256,
        sending_token: &str,
        receiving_token: &str,
        deadline: u64,
    ) -> Result<Self> {
        let function = SwapFunction::from_str(swap_function)?;
        let sending = TokenName::from_str(sending_token)?;
        let receiving = TokenName::from_str(receiving_token)?;
        Self::create(registry, net, function, from_amount, sending, receiving, deadline)
    }

    /// Destination leg with `fromAmount = 0`; the receiving contract swaps
    /// whatever amount the bridge delivers.
    pub fn destination_placeholder(
        registry: &NetworkRegistry,
        dst_net: &str,
        function: SwapFunction,
        sending_token: TokenName,
        receiving_token: TokenName,
        deadline: u64,
    ) -> Result<Self> {
        Self::create(
            registry,
            dst_net,
            function,
            U256::ZERO,
            sending_token,
            receiving_token,
            deadline,
        )
    }

    pub fn create(
        registry: &NetworkRegistry,
        net: &str,
        function: SwapFunction,
        from_amount: U256,
        sending_token: TokenName,
        receiving_token: TokenName,
        deadline: u64,
    ) -> Result<Self> {
        function.check_assets(sending_token, receiving_token)?;

        let network = registry.network(net)?;
        let sending_asset_id = registry.resolve_asset(net, sending_token)?;
        let receiving_asset_id = registry.resolve_asset(net, receiving_token)?;

        // The router only knows the wrapped native token.
        let to_path = |asset: Address| {
            if asset == Address::ZERO {
                network.weth
            } else {
                asset
            }
        };
        let path = vec![to_path(sending_asset_id), to_path(receiving_asset_id)];

        let call_data = encode_router_call(
            function,
            network.router_dialect,
            from_amount,
            path,
            network.so_diamond,
            U256::from(deadline),
        );

        Ok(Self {
            call_to: network.router,
            approve_to: network.router,
            sending_asset_id,
            receiving_asset_id,
            from_amount,
            call_data,
        })
    }

    pub fn to_ordered_fields(&self) -> Vec<Field> {
        vec![
            Field::Address(self.call_to),
            Field::Address(self.approve_to),
            Field::Address(self.sending_asset_id),
            Field::Address(self.receiving_asset_id),
            Field::Uint(self.from_amount),
            Field::Bytes(self.call_data.clone()),
        ]
    }

    pub(crate) fn to_sol(&self) -> abi::SwapData {
        abi::SwapData {
            callTo: self.call_to,
            approveTo: self.approve_to,
            sendingAssetId: self.sending_asset_id,
            receivingAssetId: self.receiving_asset_id,
            fromAmount: self.from_amount,
            callData: self.call_data.clone(),
        }
    }
}

fn encode_router_call(
    function: SwapFunction,
    dialect: RouterDialect,
    from_amount: U256,
    path: Vec<Address>,
    to: Address,
    deadline: U256,
) -> Bytes {
    let zero = U256::ZERO;
    let encoded = match (function, dialect) {
        (SwapFunction::ExactNativeForTokens, RouterDialect::Eth) => {
            Router::swapExactETHForTokensCall { amountOutMin: zero, path, to, deadline }.abi_encode()
        }
        (SwapFunction::ExactNativeForTokens, RouterDialect::Avax) => {
            Router::swapExactAVAXForTokensCall { amountOutMin: zero, path, to, deadline }
                .abi_encode()
        }
        (SwapFunction::NativeForExactTokens, RouterDialect::Eth) => {
            Router::swapETHForExactTokensCall { amountOut: zero, path, to, deadline }.abi_encode()
        }
        (SwapFunction::NativeForExactTokens, RouterDialect::Avax) => {
            Router::swapAVAXForExactTokensCall { amountOut: zero, path, to, deadline }.abi_encode()
        }
        (SwapFunction::ExactTokensForNative, RouterDialect::Eth) => {
            Router::swapExactTokensForETHCall {
                amountIn: from_amount,
                amountOutMin: zero,
                path,
                to,
                deadline,
            }
            .abi_encode()
        }
        (SwapFunction::ExactTokensForNative, RouterDialect::Avax) => {
            Router::swapExactTokensForAVAXCall {
                amountIn: from_amount,
                amountOutMin: zero,
                path,
                to,
                deadline,
            }
            .abi_encode()
        }
        (SwapFunction::TokensForExactNative, RouterDialect::Eth) => {
            Router::swapTokensForExactETHCall {
                amountOut: zero,
                amountInMax: from_amount,
                path,
                to,
                deadline,
            }
            .abi_encode()
        }
        (SwapFunction::TokensForExactNative, RouterDialect::Avax) => {
            Router::swapTokensForExactAVAXCall {
                amountOut: zero,
                amountInMax: from_amount,
                path,
                to,
                deadline,
            }
            .abi_encode()
        }
        (SwapFunction::ExactTokensForTokens, _) => Router::swapExactTokensForTokensCall {
            amountIn: from_amount,
            amountOutMin: zero,
            path,
            to,
            deadline,
        }
        .abi_encode(),
        (SwapFunction::TokensForExactTokens, _) => Router::swapTokensForExactTokensCall {
            amountOut: zero,
            amountInMax: from_amount,
            path,
            to,
            deadline,
        }
        .abi_encode(),
    };
    Bytes::from(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NetworkRegistry {
        NetworkRegistry::from_toml_str(include_str!("../../../tests/fixtures/networks.toml"))
            .unwrap()
    }

    fn word(data: &[u8], index: usize) -> &[u8] {
        &data[4 + index * 32..4 + (index + 1) * 32]
    }

    #[test]
    fn test_parse_allow_list() {
        assert_eq!(
            "swapExactAVAXForTokens".parse::<SwapFunction>().unwrap(),
            SwapFunction::ExactNativeForTokens
        );
        assert_eq!(
            "swapTokensForExactETH".parse::<SwapFunction>().unwrap(),
            SwapFunction::TokensForExactNative
        );
        for f in [
            SwapFunction::ExactNativeForTokens,
            SwapFunction::NativeForExactTokens,
            SwapFunction::ExactTokensForNative,
            SwapFunction::TokensForExactNative,
            SwapFunction::ExactTokensForTokens,
            SwapFunction::TokensForExactTokens,
        ] {
            for dialect in [RouterDialect::Eth, RouterDialect::Avax] {
                assert_eq!(f.name(dialect).parse::<SwapFunction>().unwrap(), f);
            }
        }
    }

    #[test]
    fn test_unsupported_function_fails_first() {
        // Network is unknown too; the function name must be rejected before it matters.
        let err = SwapData::create_by_name(
            &NetworkRegistry::default(),
            "nowhere",
            "swapFoo",
            U256::from(1u64),
            "eth",
            "usdc",
            0,
        )
        .unwrap_err();
        assert!(matches!(err, OmniswapError::UnsupportedSwapFunction(ref f) if f == "swapFoo"));
    }

    #[test]
    fn test_unsupported_token() {
        let err = SwapData::create_by_name(
            &registry(),
            "rinkeby",
            "swapExactTokensForTokens",
            U256::from(1u64),
            "usdc",
            "wbtc",
            0,
        )
        .unwrap_err();
        assert!(matches!(err, OmniswapError::UnsupportedToken(ref t) if t == "wbtc"));
    }

    #[test]
    fn test_direction_mismatch() {
        let err = SwapData::create(
            &registry(),
            "rinkeby",
            SwapFunction::ExactNativeForTokens,
            U256::from(1u64),
            TokenName::Usdc,
            TokenName::Eth,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, OmniswapError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_native_in_substitutes_weth_in_path() {
        let reg = registry();
        let net = reg.network("rinkeby").unwrap();
        let deadline = DeadlinePolicy::default().deadline_at(1_700_000_000);
        let swap = SwapData::create(
            &reg,
            "rinkeby",
            SwapFunction::ExactNativeForTokens,
            U256::from(200_000_000u64),
            TokenName::Eth,
            TokenName::Usdc,
            deadline,
        )
        .unwrap();

        assert_eq!(swap.sending_asset_id, Address::ZERO);
        assert_eq!(swap.call_to, net.router);
        assert_eq!(swap.approve_to, net.router);
        assert_eq!(
            &swap.call_data[..4],
            Router::swapExactETHForTokensCall::SELECTOR.as_slice()
        );

        let decoded = Router::swapExactETHForTokensCall::abi_decode(&swap.call_data, true).unwrap();
        assert_eq!(decoded.path, vec![net.weth, net.usdc.unwrap()]);
        assert_eq!(decoded.to, net.so_diamond);
        assert_eq!(decoded.amountOutMin, U256::ZERO);
        assert_eq!(decoded.deadline, U256::from(1_700_003_000u64));
    }

    #[test]
    fn test_avax_dialect_on_fuji() {
        let reg = registry();
        let net = reg.network("avax-test").unwrap();
        let swap = SwapData::create(
            &reg,
            "avax-test",
            SwapFunction::ExactTokensForNative,
            U256::ZERO,
            TokenName::Usdc,
            TokenName::Eth,
            1_000,
        )
        .unwrap();

        assert_eq!(
            &swap.call_data[..4],
            Router::swapExactTokensForAVAXCall::SELECTOR.as_slice()
        );
        assert_eq!(swap.receiving_asset_id, Address::ZERO);
        // amountIn, amountOutMin, path offset, to, deadline
        assert_eq!(word(&swap.call_data, 3), net.so_diamond.into_word().as_slice());
        assert_eq!(word(&swap.call_data, 4), U256::from(1_000u64).to_be_bytes::<32>().as_slice());
    }

    #[test]
    fn test_ordered_fields() {
        let swap = SwapData::create(
            &registry(),
            "rinkeby",
            SwapFunction::ExactTokensForTokens,
            U256::from(9u64),
            TokenName::Usdc,
            TokenName::Usdc,
            0,
        )
        .unwrap();
        let fields = swap.to_ordered_fields();
        assert_eq!(fields.len(), SwapData::FIELD_COUNT);
        assert_eq!(fields[4], Field::uint(9u64));
        assert_eq!(fields[5], Field::Bytes(swap.call_data.clone()));
    }

    #[test]
    fn test_destination_placeholder() {
        let reg = registry();
        let swap = SwapData::destination_placeholder(
            &reg,
            "avax-test",
            SwapFunction::ExactTokensForNative,
            TokenName::Usdc,
            TokenName::Eth,
            0,
        )
        .unwrap();
        assert!(swap.from_amount.is_zero());
        assert_eq!(swap.receiving_asset_id, Address::ZERO);
        assert_eq!(word(&swap.call_data, 0), [0u8; 32].as_slice());
    }

    #[test]
    fn test_deadline_policy() {
        let policy = DeadlinePolicy::new(Duration::from_secs(600));
        assert_eq!(policy.deadline_at(100), 700);
        assert!(policy.deadline_now() > 1_600_000_000);
    }
}
