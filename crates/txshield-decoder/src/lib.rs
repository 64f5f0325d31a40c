//! Layered calldata decoder and intent builder for txshield.
//!
//! The decoder turns an opaque hex payload into a
//! [`DecodedCall`](txshield_types::DecodedCall) through a strict pipeline:
//!
//! 1. **Known ABI** - built-in ERC-20 / EIP-2612 / wrapped-token functions
//! 2. **Local selector fallback** - ~30 well-known router selectors, three
//!    of which fan into specialized sub-decoders (Universal Router command
//!    plans, multicall recursion, Safe `execTransaction` recursion)
//! 3. **Contract ABI** - decoding against an ABI fetched by a verification
//!    provider
//! 4. **Signature database** - a keyed external lookup with a 24-hour cache
//!
//! Stages short-circuit on success and never mutate global state. Decode
//! failures are values: the pipeline returns the best placeholder it can
//! rather than an error.
//!
//! The [`multisend`] module is a separate entry point used by the Safe
//! ingest path, and [`intent`] renders a decoded call as one English
//! sentence.

pub mod context;
pub mod contract_abi;
pub mod decoder;
pub mod intent;
pub mod known;
pub mod multisend;
pub mod routers;
pub mod signatures;
pub mod universal_router;
pub mod value;

pub use context::DecodeContext;
pub use decoder::Decoder;
pub use intent::build_intent;
pub use multisend::{MultiSendBatch, MultiSendRecord, decode_multisend};
pub use signatures::{SelectorResolver, SignatureSource, SignatureSourceError};
