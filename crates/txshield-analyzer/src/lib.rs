//! Provider fan-out, finding aggregation, and verdict derivation.
//!
//! The analyzer takes a [`CalldataInput`](txshield_types::CalldataInput),
//! queries a bounded set of external intelligence providers concurrently,
//! folds the results (plus decode and simulation evidence) into an ordered
//! finding list, and derives the recommendation through a pure function of
//! that list.
//!
//! Outbound HTTP goes through [`http::HttpClient`], which carries the
//! offline guard: when installed, any URL off the allowlist fails before a
//! byte leaves the process.

pub mod aggregate;
pub mod analyzer;
pub mod bounded;
pub mod fanout;
pub mod http;
pub mod policy;
pub mod providers;
pub mod signature_source;
pub mod simulate;

pub use aggregate::recommend;
pub use analyzer::{AnalyzeOptions, Analyzer};
pub use bounded::run_bounded;
pub use http::{HttpClient, HttpError, OfflineGuard};
pub use policy::AnalyzePolicy;
pub use simulate::{HeuristicSimulator, Simulator};
