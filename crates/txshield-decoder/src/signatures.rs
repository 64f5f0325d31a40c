//! Stage D: the external signature database and its process-wide cache.
//!
//! Lookups go through a [`SelectorResolver`] handle passed into the
//! decoder, never an ambient global. The cache maps a 4-byte selector to
//! the candidate signatures the database returned, with a 24-hour TTL;
//! entries are shared by all concurrent scans and writes follow a
//! last-writer-wins discipline.

use alloy_json_abi::Function;
use alloy_primitives::Selector;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use txshield_types::{DecodeSource, DecodedCall};

use crate::known::decode_with_function;

/// How long a cached signature list stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cap on decode attempts per selector; the database can return dozens of
/// colliding signatures and only the first few are ever plausible.
const MAX_CANDIDATES: usize = 5;

/// Errors a signature source can produce. All of them are
/// recoverable-local: the pipeline records nothing and moves on.
#[derive(Debug, thiserror::Error)]
pub enum SignatureSourceError {
    #[error("signature database transport error: {0}")]
    Transport(String),
    #[error("signature database returned an unexpected body: {0}")]
    BadBody(String),
}

/// An external `selector -> [candidate signatures]` lookup.
#[async_trait]
pub trait SignatureSource: Send + Sync {
    async fn lookup(&self, selector: Selector) -> Result<Vec<String>, SignatureSourceError>;
}

#[derive(Clone)]
struct CacheEntry {
    signatures: Arc<Vec<String>>,
    fetched_at: Instant,
}

/// The decoder's handle to the signature database: cache in front,
/// source behind.
pub struct SelectorResolver {
    source: Arc<dyn SignatureSource>,
    cache: DashMap<Selector, CacheEntry>,
    ttl: Duration,
}

impl SelectorResolver {
    pub fn new(source: Arc<dyn SignatureSource>) -> Self {
        SelectorResolver {
            source,
            cache: DashMap::new(),
            ttl: CACHE_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(source: Arc<dyn SignatureSource>, ttl: Duration) -> Self {
        SelectorResolver {
            source,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Candidate signatures for a selector, from cache when fresh.
    ///
    /// A failed fetch is not cached; the next scan retries.
    pub async fn signatures(&self, selector: Selector) -> Vec<String> {
        if let Some(entry) = self.cache.get(&selector) {
            if entry.fetched_at.elapsed() < self.ttl {
                return entry.signatures.as_ref().clone();
            }
        }
        match self.source.lookup(selector).await {
            Ok(signatures) => {
                self.cache.insert(
                    selector,
                    CacheEntry {
                        signatures: Arc::new(signatures.clone()),
                        fetched_at: Instant::now(),
                    },
                );
                signatures
            }
            Err(error) => {
                tracing::debug!(selector = %selector, %error, "signature lookup failed");
                Vec::new()
            }
        }
    }
}

/// Runs the Stage D decode: fetch candidates, try each in order, keep the
/// first that decodes, record the other decodable candidates as alternates.
pub async fn decode_via_database(resolver: &SelectorResolver, data: &[u8]) -> Option<DecodedCall> {
    if data.len() < 4 {
        return None;
    }
    let selector = Selector::from_slice(&data[..4]);
    let candidates = resolver.signatures(selector).await;

    let mut primary: Option<DecodedCall> = None;
    let mut alternates = Vec::new();
    for signature in candidates.iter().take(MAX_CANDIDATES) {
        let Ok(function) = Function::parse(signature) else {
            continue;
        };
        if function.selector() != selector {
            continue;
        }
        let Some(decoded) =
            decode_with_function(&function, &[], data, DecodeSource::SignatureDb, None)
        else {
            continue;
        };
        if primary.is_none() {
            primary = Some(decoded);
        } else {
            alternates.push(function.signature());
        }
    }

    primary.map(|mut call| {
        call.alternates = alternates;
        call
    })
}
