//! Shared data model for the txshield pre-signature transaction scanner.
//!
//! Every value in this crate is created per scan request and discarded when
//! the request completes. The types here are deliberately inert: decoding,
//! provider fan-out, and policy decisions live in the sibling crates and
//! operate over this vocabulary.
//!
//! # Modules
//!
//! - [`chain`] - The closed set of supported EVM networks
//! - [`calldata`] - The candidate-transaction input shape
//! - [`decoded`] - Decoded calls, arguments, and router command plans
//! - [`finding`] - Findings, severities, and the finding-code priority table
//! - [`recommendation`] - The canonical `ok < caution < warning < danger` verdict order
//! - [`contract`] - Incrementally populated contract intelligence
//! - [`simulation`] - Balance/approval delta shapes consumed from a simulator
//! - [`analysis`] - The aggregate result returned to every surface
//! - [`config`] - The JSON config file model with environment overrides

pub mod analysis;
pub mod calldata;
pub mod chain;
pub mod config;
pub mod contract;
pub mod decoded;
pub mod finding;
pub mod recommendation;
pub mod simulation;

pub use analysis::{AnalysisResult, Confidence, ConfidenceLevel};
pub use calldata::{Authorization, CalldataInput, QuantityParseError, parse_quantity};
pub use chain::{Chain, ChainParseError};
pub use config::{Allowlist, AppConfig, ConfigError, SimulationBackend, SimulationConfig};
pub use contract::{ContractInfo, ProtocolMatch, ProxyType};
pub use decoded::{Args, CallStandard, DecodeSource, DecodedCall, RouterCommand, Value};
pub use finding::{Finding, FindingCode, Severity};
pub use recommendation::Recommendation;
pub use simulation::{
    ApprovalChange, ApprovalChanges, ApprovalStandard, AssetChange, AssetType, BalanceChanges,
    ChangeDirection, SimConfidence, SimulationResult,
};
