//! The protocol registry: canonical addresses first, name keywords second.
//!
//! Tier one is a closed table of (address, chain) pairs for the top
//! protocols; tier two is a keyword scan over whatever names the other
//! providers recovered (contract, proxy, implementation). The registry is
//! fully local and never touches the network, which is why it gets a
//! 250 ms budget even in wallet mode.

use alloy_primitives::{Address, address};
use txshield_types::{Chain, ProtocolMatch};

struct CanonicalEntry {
    address: Address,
    chain: Chain,
    name: &'static str,
    slug: &'static str,
}

static CANONICAL: &[CanonicalEntry] = &[
    // Uniswap
    CanonicalEntry { address: address!("7a250d5630b4cf539739df2c5dacb4c659f2488d"), chain: Chain::Ethereum, name: "Uniswap V2 Router", slug: "uniswap" },
    CanonicalEntry { address: address!("e592427a0aece92de3edee1f18e0157c05861564"), chain: Chain::Ethereum, name: "Uniswap V3 Router", slug: "uniswap" },
    CanonicalEntry { address: address!("68b3465833fb72a70ecdf485e0e4c7bd8665fc45"), chain: Chain::Ethereum, name: "Uniswap V3 Router 02", slug: "uniswap" },
    CanonicalEntry { address: address!("3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad"), chain: Chain::Ethereum, name: "Uniswap Universal Router", slug: "uniswap" },
    CanonicalEntry { address: address!("c36442b4a4522e871399cd717abdd847ab11fe88"), chain: Chain::Ethereum, name: "Uniswap V3 Positions NFT", slug: "uniswap" },
    CanonicalEntry { address: address!("2626664c2603336e57b271c5c0b26f421741e481"), chain: Chain::Base, name: "Uniswap V3 Router 02", slug: "uniswap" },
    // Permit2 is deployed at the same address everywhere.
    CanonicalEntry { address: address!("000000000022d473030f116ddee9f6b43ac78ba3"), chain: Chain::Ethereum, name: "Permit2", slug: "permit2" },
    CanonicalEntry { address: address!("000000000022d473030f116ddee9f6b43ac78ba3"), chain: Chain::Base, name: "Permit2", slug: "permit2" },
    CanonicalEntry { address: address!("000000000022d473030f116ddee9f6b43ac78ba3"), chain: Chain::Arbitrum, name: "Permit2", slug: "permit2" },
    CanonicalEntry { address: address!("000000000022d473030f116ddee9f6b43ac78ba3"), chain: Chain::Optimism, name: "Permit2", slug: "permit2" },
    CanonicalEntry { address: address!("000000000022d473030f116ddee9f6b43ac78ba3"), chain: Chain::Polygon, name: "Permit2", slug: "permit2" },
    // Aave
    CanonicalEntry { address: address!("87870bca3f3fd6335c3f4ce8392d69350b4fa4e2"), chain: Chain::Ethereum, name: "Aave V3 Pool", slug: "aave" },
    CanonicalEntry { address: address!("794a61358d6845594f94dc1db02a252b5b4814ad"), chain: Chain::Polygon, name: "Aave V3 Pool", slug: "aave" },
    CanonicalEntry { address: address!("794a61358d6845594f94dc1db02a252b5b4814ad"), chain: Chain::Arbitrum, name: "Aave V3 Pool", slug: "aave" },
    // 1inch
    CanonicalEntry { address: address!("1111111254eeb25477b68fb85ed929f73a960582"), chain: Chain::Ethereum, name: "1inch Aggregation Router V5", slug: "1inch" },
    CanonicalEntry { address: address!("111111125421ca6dc452d289314280a0f8842a65"), chain: Chain::Ethereum, name: "1inch Aggregation Router V6", slug: "1inch" },
    // OpenSea
    CanonicalEntry { address: address!("00000000000000adc04c56bf30ac9d3c0aaf14dc"), chain: Chain::Ethereum, name: "Seaport 1.5", slug: "opensea" },
    // Safe
    CanonicalEntry { address: address!("40a2accbd92bca938b02010e17a5b8929b49130d"), chain: Chain::Ethereum, name: "Safe MultiSend Call Only", slug: "safe" },
    CanonicalEntry { address: address!("a6b71e26c5e0845f74c812102ca7114b6a896ab2"), chain: Chain::Ethereum, name: "Safe Proxy Factory", slug: "safe" },
    // Stablecoins and wrapped native
    CanonicalEntry { address: address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), chain: Chain::Ethereum, name: "USD Coin", slug: "circle" },
    CanonicalEntry { address: address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"), chain: Chain::Base, name: "USD Coin", slug: "circle" },
    CanonicalEntry { address: address!("dac17f958d2ee523a2206206994597c13d831ec7"), chain: Chain::Ethereum, name: "Tether USD", slug: "tether" },
    CanonicalEntry { address: address!("6b175474e89094c44da98b954eedeac495271d0f"), chain: Chain::Ethereum, name: "Dai Stablecoin", slug: "makerdao" },
    CanonicalEntry { address: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), chain: Chain::Ethereum, name: "Wrapped Ether", slug: "weth" },
    CanonicalEntry { address: address!("4200000000000000000000000000000000000006"), chain: Chain::Base, name: "Wrapped Ether", slug: "weth" },
    CanonicalEntry { address: address!("4200000000000000000000000000000000000006"), chain: Chain::Optimism, name: "Wrapped Ether", slug: "weth" },
    // Lido
    CanonicalEntry { address: address!("ae7ab96520de3a18e5e111b5eaab095312d7fe84"), chain: Chain::Ethereum, name: "Lido stETH", slug: "lido" },
    // Curve
    CanonicalEntry { address: address!("bebc44782c7db0a1a60cb6fe97d0b483032ff1c7"), chain: Chain::Ethereum, name: "Curve 3pool", slug: "curve" },
];

/// Keyword table for the name-based heuristic.
static KEYWORDS: &[(&str, &str, &str)] = &[
    ("uniswap", "Uniswap", "uniswap"),
    ("aave", "Aave", "aave"),
    ("curve", "Curve", "curve"),
    ("gnosis", "Safe", "safe"),
    ("safe", "Safe", "safe"),
    ("1inch", "1inch", "1inch"),
    ("seaport", "OpenSea Seaport", "opensea"),
    ("opensea", "OpenSea", "opensea"),
    ("compound", "Compound", "compound"),
    ("lido", "Lido", "lido"),
    ("maker", "MakerDAO", "makerdao"),
    ("balancer", "Balancer", "balancer"),
    ("sushiswap", "SushiSwap", "sushiswap"),
    ("pancake", "PancakeSwap", "pancakeswap"),
    ("permit2", "Permit2", "permit2"),
    ("blur", "Blur", "blur"),
    ("paraswap", "ParaSwap", "paraswap"),
];

/// Tier one: exact (address, chain) lookup.
pub fn lookup_canonical(address: Address, chain: Chain) -> Option<ProtocolMatch> {
    CANONICAL
        .iter()
        .find(|entry| entry.address == address && entry.chain == chain)
        .map(|entry| ProtocolMatch {
            name: entry.name.to_string(),
            slug: entry.slug.to_string(),
            matched_by: "address".to_string(),
        })
}

/// Tier two: keyword scan over recovered names.
pub fn lookup_by_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<ProtocolMatch> {
    for name in names {
        let lower = name.to_ascii_lowercase();
        for (keyword, display, slug) in KEYWORDS {
            if lower.contains(keyword) {
                return Some(ProtocolMatch {
                    name: display.to_string(),
                    slug: slug.to_string(),
                    matched_by: "name-heuristic".to_string(),
                });
            }
        }
    }
    None
}

/// The protocol keyword vocabulary, used by the typosquat check.
pub fn keyword_vocabulary() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().map(|(keyword, _, _)| *keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_match_is_chain_scoped() {
        let permit2 = address!("000000000022d473030f116ddee9f6b43ac78ba3");
        let matched = lookup_canonical(permit2, Chain::Base).unwrap();
        assert_eq!(matched.slug, "permit2");
        assert_eq!(matched.matched_by, "address");

        let v2_router = address!("7a250d5630b4cf539739df2c5dacb4c659f2488d");
        assert!(lookup_canonical(v2_router, Chain::Ethereum).is_some());
        assert!(lookup_canonical(v2_router, Chain::Polygon).is_none());
    }

    #[test]
    fn test_name_heuristic() {
        let matched = lookup_by_names(["GnosisSafeProxy"].into_iter()).unwrap();
        assert_eq!(matched.slug, "safe");
        assert_eq!(matched.matched_by, "name-heuristic");

        assert!(lookup_by_names(["TotallyNovelContract"].into_iter()).is_none());
    }

    #[test]
    fn test_table_breadth() {
        assert!(CANONICAL.len() >= 25);
    }
}
