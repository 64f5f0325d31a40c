//! Stage B: the local selector fallback table.
//!
//! Maps well-known router selectors to canonical signatures without any
//! network round-trip. Three selectors route into specialized sub-decoders
//! (Universal Router, multicall, Safe `execTransaction`); the rest decode
//! as plain calls.

use alloy_json_abi::Function;
use alloy_primitives::Selector;
use std::collections::HashMap;
use std::sync::LazyLock;

/// How the pipeline should treat a matched local selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterKind {
    Plain,
    /// `execute(bytes,bytes[])` and the deadline variant: the first
    /// argument is a command byte stream.
    UniversalRouter,
    /// `multicall(bytes[])` / `multicall(uint256,bytes[])`: recurse into
    /// each inner payload.
    Multicall,
    /// Gnosis Safe `execTransaction`: recurse into the embedded `data`.
    ExecTransaction,
    /// Safe `multiSend(bytes)`: the packed batch wire format.
    MultiSend,
}

pub struct LocalEntry {
    pub signature: &'static str,
    pub arg_names: &'static [&'static str],
    pub kind: RouterKind,
}

static LOCAL_ENTRIES: &[LocalEntry] = &[
    // Uniswap V2 router
    LocalEntry {
        signature: "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
        arg_names: &["amountIn", "amountOutMin", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "swapTokensForExactTokens(uint256,uint256,address[],address,uint256)",
        arg_names: &["amountOut", "amountInMax", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "swapExactETHForTokens(uint256,address[],address,uint256)",
        arg_names: &["amountOutMin", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "swapTokensForExactETH(uint256,uint256,address[],address,uint256)",
        arg_names: &["amountOut", "amountInMax", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "swapExactTokensForETH(uint256,uint256,address[],address,uint256)",
        arg_names: &["amountIn", "amountOutMin", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "swapETHForExactTokens(uint256,address[],address,uint256)",
        arg_names: &["amountOut", "path", "to", "deadline"],
        kind: RouterKind::Plain,
    },
    // Uniswap V3 router-02
    LocalEntry {
        signature: "exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))",
        arg_names: &["params"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "exactInput((bytes,address,uint256,uint256))",
        arg_names: &["params"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "exactOutputSingle((address,address,uint24,address,uint256,uint256,uint160))",
        arg_names: &["params"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "exactOutput((bytes,address,uint256,uint256))",
        arg_names: &["params"],
        kind: RouterKind::Plain,
    },
    // Uniswap Universal Router
    LocalEntry {
        signature: "execute(bytes,bytes[])",
        arg_names: &["commands", "inputs"],
        kind: RouterKind::UniversalRouter,
    },
    LocalEntry {
        signature: "execute(bytes,bytes[],uint256)",
        arg_names: &["commands", "inputs", "deadline"],
        kind: RouterKind::UniversalRouter,
    },
    // Multicall wrappers (NFT position manager, SwapRouter02)
    LocalEntry {
        signature: "multicall(bytes[])",
        arg_names: &["data"],
        kind: RouterKind::Multicall,
    },
    LocalEntry {
        signature: "multicall(uint256,bytes[])",
        arg_names: &["deadline", "data"],
        kind: RouterKind::Multicall,
    },
    // Gnosis Safe
    LocalEntry {
        signature: "execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)",
        arg_names: &[
            "to",
            "value",
            "data",
            "operation",
            "safeTxGas",
            "baseGas",
            "gasPrice",
            "gasToken",
            "refundReceiver",
            "signatures",
        ],
        kind: RouterKind::ExecTransaction,
    },
    LocalEntry {
        signature: "multiSend(bytes)",
        arg_names: &["transactions"],
        kind: RouterKind::MultiSend,
    },
    // 1inch aggregation router v5
    LocalEntry {
        signature: "swap(address,(address,address,address,address,uint256,uint256,uint256),bytes)",
        arg_names: &["executor", "desc", "data"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "unoswap(address,uint256,uint256,uint256[])",
        arg_names: &["srcToken", "amount", "minReturn", "pools"],
        kind: RouterKind::Plain,
    },
    // Permit2
    LocalEntry {
        signature: "permit(address,((address,uint160,uint48,uint48),address,uint256),bytes)",
        arg_names: &["owner", "permitSingle", "signature"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "permitTransferFrom(((address,uint256),uint256,uint256),(address,uint256),address,bytes)",
        arg_names: &["permit", "transferDetails", "owner", "signature"],
        kind: RouterKind::Plain,
    },
    // ERC-721
    LocalEntry {
        signature: "safeTransferFrom(address,address,uint256)",
        arg_names: &["from", "to", "tokenId"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "safeTransferFrom(address,address,uint256,bytes)",
        arg_names: &["from", "to", "tokenId", "data"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "setApprovalForAll(address,bool)",
        arg_names: &["operator", "approved"],
        kind: RouterKind::Plain,
    },
    // Aave v3 pool
    LocalEntry {
        signature: "supply(address,uint256,address,uint16)",
        arg_names: &["asset", "amount", "onBehalfOf", "referralCode"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "borrow(address,uint256,uint256,uint16,address)",
        arg_names: &["asset", "amount", "interestRateMode", "referralCode", "onBehalfOf"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "repay(address,uint256,uint256,address)",
        arg_names: &["asset", "amount", "interestRateMode", "onBehalfOf"],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "withdraw(address,uint256,address)",
        arg_names: &["asset", "amount", "to"],
        kind: RouterKind::Plain,
    },
    // Liquidity management (V2 router)
    LocalEntry {
        signature: "addLiquidity(address,address,uint256,uint256,uint256,uint256,address,uint256)",
        arg_names: &[
            "tokenA",
            "tokenB",
            "amountADesired",
            "amountBDesired",
            "amountAMin",
            "amountBMin",
            "to",
            "deadline",
        ],
        kind: RouterKind::Plain,
    },
    LocalEntry {
        signature: "removeLiquidity(address,address,uint256,uint256,uint256,address,uint256)",
        arg_names: &[
            "tokenA",
            "tokenB",
            "liquidity",
            "amountAMin",
            "amountBMin",
            "to",
            "deadline",
        ],
        kind: RouterKind::Plain,
    },
];

static LOCAL_TABLE: LazyLock<HashMap<Selector, (Function, &'static LocalEntry)>> =
    LazyLock::new(|| {
        LOCAL_ENTRIES
            .iter()
            .filter_map(|entry| {
                let function = Function::parse(entry.signature).ok()?;
                Some((function.selector(), (function, entry)))
            })
            .collect()
    });

/// Looks up a selector in the local table.
pub fn lookup(selector: &Selector) -> Option<(&'static Function, &'static LocalEntry)> {
    LOCAL_TABLE
        .get(selector)
        .map(|(function, entry)| (function, *entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::fixed_bytes;

    #[test]
    fn test_universal_router_selectors() {
        // execute(bytes,bytes[]) and execute(bytes,bytes[],uint256)
        let (_, entry) = lookup(&fixed_bytes!("24856bc3")).unwrap();
        assert_eq!(entry.kind, RouterKind::UniversalRouter);
        let (_, entry) = lookup(&fixed_bytes!("3593564c")).unwrap();
        assert_eq!(entry.kind, RouterKind::UniversalRouter);
    }

    #[test]
    fn test_multicall_selectors() {
        let (_, entry) = lookup(&fixed_bytes!("ac9650d8")).unwrap();
        assert_eq!(entry.kind, RouterKind::Multicall);
        let (_, entry) = lookup(&fixed_bytes!("5ae401dc")).unwrap();
        assert_eq!(entry.kind, RouterKind::Multicall);
    }

    #[test]
    fn test_safe_selectors() {
        let (function, entry) = lookup(&fixed_bytes!("6a761202")).unwrap();
        assert_eq!(entry.kind, RouterKind::ExecTransaction);
        assert_eq!(function.name, "execTransaction");
        let (_, entry) = lookup(&fixed_bytes!("8d80ff0a")).unwrap();
        assert_eq!(entry.kind, RouterKind::MultiSend);
    }

    #[test]
    fn test_table_has_expected_breadth() {
        assert!(LOCAL_ENTRIES.len() >= 25);
        // Every entry's signature must parse, or the table silently shrinks.
        assert_eq!(LOCAL_TABLE.len(), LOCAL_ENTRIES.len());
    }

    #[test]
    fn test_unknown_selector() {
        assert!(lookup(&fixed_bytes!("00000000")).is_none());
    }
}
