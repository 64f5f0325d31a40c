//! Proxy pattern detection via well-known storage slots and bytecode.
//!
//! Checks, in order: the EIP-1967 implementation slot, the EIP-1967 beacon
//! slot, and the EIP-1167 minimal-proxy bytecode prefix. A non-zero
//! implementation with a zero admin slot is reported as UUPS, since the
//! upgrade logic then lives in the implementation itself.

use alloy_primitives::{Address, B256, b256};
use txshield_types::ProxyType;

use crate::providers::rpc::{RpcCaller, is_empty_code};
use crate::providers::{ProviderError, ProxyDetectOutput};

/// keccak256("eip1967.proxy.implementation") - 1
const IMPLEMENTATION_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");
/// keccak256("eip1967.proxy.beacon") - 1
const BEACON_SLOT: B256 =
    b256!("a3f0ad74e5423aebfd80d3ef4346578335a9a72aeaee59ff6cb3582b35133d50");
/// keccak256("eip1967.proxy.admin") - 1
const ADMIN_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// EIP-1167 minimal proxy runtime prefix; the target address follows.
const MINIMAL_PROXY_PREFIX: &str = "0x363d3d373d3d3d363d73";

pub async fn fetch(
    caller: &RpcCaller,
    address: Address,
) -> Result<ProxyDetectOutput, ProviderError> {
    let implementation = word_to_address(caller.get_storage(address, IMPLEMENTATION_SLOT).await?);
    if let Some(implementation) = implementation {
        let admin = word_to_address(caller.get_storage(address, ADMIN_SLOT).await?);
        let proxy_type = if admin.is_some() {
            ProxyType::Eip1967
        } else {
            ProxyType::Uups
        };
        return Ok(ProxyDetectOutput {
            is_proxy: true,
            proxy_type: Some(proxy_type),
            implementation: Some(implementation),
            beacon: None,
        });
    }

    let beacon = word_to_address(caller.get_storage(address, BEACON_SLOT).await?);
    if let Some(beacon) = beacon {
        return Ok(ProxyDetectOutput {
            is_proxy: true,
            proxy_type: Some(ProxyType::Beacon),
            implementation: None,
            beacon: Some(beacon),
        });
    }

    let code = caller.get_code(address).await?;
    if !is_empty_code(&code) {
        if let Some(target) = minimal_proxy_target(&code) {
            return Ok(ProxyDetectOutput {
                is_proxy: true,
                proxy_type: Some(ProxyType::Minimal),
                implementation: Some(target),
                beacon: None,
            });
        }
    }

    Ok(ProxyDetectOutput::default())
}

fn word_to_address(word: B256) -> Option<Address> {
    if word == B256::ZERO {
        return None;
    }
    Some(Address::from_slice(&word.as_slice()[12..]))
}

pub(crate) fn minimal_proxy_target(code: &str) -> Option<Address> {
    let rest = code.strip_prefix(MINIMAL_PROXY_PREFIX)?;
    if rest.len() < 40 {
        return None;
    }
    rest[..40].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_word_to_address() {
        assert!(word_to_address(B256::ZERO).is_none());
        let mut word = [0u8; 32];
        word[31] = 0x42;
        assert_eq!(
            word_to_address(B256::from(word)),
            Some(address!("0000000000000000000000000000000000000042"))
        );
    }

    #[test]
    fn test_minimal_proxy_target() {
        let code = "0x363d3d373d3d3d363d73bebebebebebebebebebebebebebebebebebebebe5af43d82803e903d91602b57fd5bf3";
        assert_eq!(
            minimal_proxy_target(code),
            Some(address!("bebebebebebebebebebebebebebebebebebebebe"))
        );
        assert!(minimal_proxy_target("0x6080604052").is_none());
    }
}
